//! Pipeline configuration (`plinth.toml`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use plinth_transform::{BrowserVersions, CriticalOptions, Preprocessor, Viewport};
use regex::Regex;
use serde::Deserialize;

/// Top-level configuration file structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub css: CssConfig,
    pub js: JsConfig,
    pub images: ImagesConfig,
    pub fonts: FontsConfig,
    pub critical: CriticalConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Source root
    pub src: PathBuf,
    /// Distribution root; every output lives below it
    pub dist: PathBuf,
    /// Grid generator config file
    pub grid_config: PathBuf,
    /// Output subdirectories, relative to `dist`
    pub outputs: OutputDirs,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputDirs {
    pub html: PathBuf,
    pub js: PathBuf,
    pub css: PathBuf,
    /// Second copy of the full style sheets
    pub css_chunk: PathBuf,
    pub images: PathBuf,
    pub fonts: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CssConfig {
    pub preprocessor: Preprocessor,
    pub browsers: BrowserVersions,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JsConfig {
    /// External bundler argv with `{input}` / `{output}` placeholders
    pub bundler: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    pub jpeg_quality: u8,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FontsConfig {
    /// External TrueType -> WOFF2 converter argv
    pub converter: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CriticalConfig {
    /// Page names (file stems of built HTML pages)
    pub pages: Vec<String>,
    /// Full style sheet the pages are extracted from, relative to the css output
    pub stylesheet: String,
    pub width: u32,
    pub height: u32,
    pub include: Vec<String>,
    /// Regexes matched against rule selectors
    pub ignore: Vec<String>,
    /// Selector -> properties kept for every page
    pub keep: BTreeMap<String, Vec<String>>,
    /// Page -> selector -> properties, overriding `keep` per selector
    pub page_keep: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Open a browser once the server is up
    pub open: bool,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            src: PathBuf::from("src"),
            dist: PathBuf::from("dist"),
            grid_config: PathBuf::from("grid.toml"),
            outputs: OutputDirs::default(),
        }
    }
}

impl Default for OutputDirs {
    fn default() -> Self {
        Self {
            html: PathBuf::new(),
            js: PathBuf::from("assets/js"),
            css: PathBuf::from("assets/css"),
            css_chunk: PathBuf::from("assets/css/chunk"),
            images: PathBuf::from("assets/images"),
            fonts: PathBuf::from("assets/fonts"),
        }
    }
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self { jpeg_quality: 80 }
    }
}

impl Default for CriticalConfig {
    fn default() -> Self {
        let btn = ["display", "font-size", "height", "line-height", "padding", "text-align", "border"];
        let mut keep = BTreeMap::new();
        keep.insert(
            ".btn".to_string(),
            btn.iter().map(|p| p.to_string()).collect(),
        );

        Self {
            pages: vec!["index".to_string(), "contact".to_string()],
            stylesheet: "style.css".to_string(),
            width: 1280,
            height: 480,
            include: vec![".footer".to_string()],
            ignore: vec!["hljs-".to_string()],
            keep,
            page_keep: BTreeMap::new(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            open: true,
        }
    }
}

/// Errors in configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Output directory for {kind} must stay inside {dist}: {path}")]
    OutsideDist {
        kind: String,
        dist: String,
        path: String,
    },
}

impl Config {
    /// Parse a configuration file's contents.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Resolve relative `paths` against a project root.
    pub fn with_root(mut self, root: &Path) -> Self {
        let resolve = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                root.join(p)
            }
        };
        self.paths.src = resolve(&self.paths.src);
        self.paths.dist = resolve(&self.paths.dist);
        self.paths.grid_config = resolve(&self.paths.grid_config);
        self
    }
}

impl CriticalConfig {
    /// Extraction options for one page.
    pub fn options_for(&self, page: &str) -> Result<CriticalOptions, ConfigError> {
        let ignore = self
            .ignore
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut keep = self.keep.clone();
        if let Some(overrides) = self.page_keep.get(page) {
            keep.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        Ok(CriticalOptions {
            viewport: Viewport {
                width: self.width,
                height: self.height,
            },
            include: self.include.clone(),
            ignore,
            keep,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();

        assert_eq!(config.paths.src, PathBuf::from("src"));
        assert_eq!(config.paths.outputs.css, PathBuf::from("assets/css"));
        assert_eq!(config.css.preprocessor, Preprocessor::Scss);
        assert_eq!(config.critical.pages, vec!["index", "contact"]);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn parses_overrides() {
        let config = Config::from_toml(
            r#"
[paths]
dist = "public"

[css]
preprocessor = "css"
browsers = { safari = 15 }

[js]
bundler = ["esbuild", "{input}", "--bundle", "--outfile={output}"]

[critical]
pages = ["home"]
"#,
        )
        .unwrap();

        assert_eq!(config.paths.dist, PathBuf::from("public"));
        assert_eq!(config.paths.src, PathBuf::from("src"));
        assert_eq!(config.css.preprocessor, Preprocessor::Css);
        assert_eq!(config.css.browsers.safari, Some(15));
        assert_eq!(config.js.bundler.len(), 4);
        assert_eq!(config.critical.pages, vec!["home"]);
    }

    #[test]
    fn rejects_malformed_files() {
        assert!(matches!(
            Config::from_toml("[paths\nsrc = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn resolves_paths_against_root() {
        let config = Config::default().with_root(Path::new("/project"));

        assert_eq!(config.paths.src, PathBuf::from("/project/src"));
        assert_eq!(config.paths.dist, PathBuf::from("/project/dist"));
        assert_eq!(config.paths.grid_config, PathBuf::from("/project/grid.toml"));
    }

    #[test]
    fn page_keep_overrides_shared_keep() {
        let mut critical = CriticalConfig::default();
        let mut overrides = BTreeMap::new();
        overrides.insert(".btn".to_string(), vec!["color".to_string()]);
        critical.page_keep.insert("contact".to_string(), overrides);

        let index = critical.options_for("index").unwrap();
        let contact = critical.options_for("contact").unwrap();

        assert!(index.keep[".btn"].contains(&"display".to_string()));
        assert_eq!(contact.keep[".btn"], vec!["color".to_string()]);
        assert_eq!(contact.viewport.width, 1280);
    }

    #[test]
    fn rejects_invalid_ignore_patterns() {
        let critical = CriticalConfig {
            ignore: vec!["(".to_string()],
            ..CriticalConfig::default()
        };

        assert!(matches!(
            critical.options_for("index"),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }
}

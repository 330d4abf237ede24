//! Source patterns, watch patterns and output directories per asset kind.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use plinth_templates::TemplateDirs;
use walkdir::WalkDir;

use crate::config::{Config, ConfigError};

/// The asset kinds a pipeline moves from `src` to `dist`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetKind {
    Html,
    Css,
    Js,
    Images,
    Fonts,
}

impl AssetKind {
    pub const ALL: [AssetKind; 5] = [
        AssetKind::Html,
        AssetKind::Css,
        AssetKind::Js,
        AssetKind::Images,
        AssetKind::Fonts,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AssetKind::Html => "html",
            AssetKind::Css => "css",
            AssetKind::Js => "js",
            AssetKind::Images => "images",
            AssetKind::Fonts => "fonts",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg",
    "jpeg",
    "png",
    "svg",
    "gif",
    "ico",
    "webp",
    "webmanifest",
    "xml",
    "json",
];

const FONT_EXTENSIONS: &[&str] = &["eot", "woff", "woff2", "ttf", "svg"];

/// Files under `base` with one of `extensions`, optionally in subdirectories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPattern {
    pub base: PathBuf,
    pub recursive: bool,
    pub extensions: Vec<String>,
    /// Skip files whose name starts with `_` (Sass partials)
    pub skip_partials: bool,
}

impl AssetPattern {
    pub fn new(base: impl Into<PathBuf>, recursive: bool, extensions: &[&str]) -> Self {
        Self {
            base: base.into(),
            recursive,
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            skip_partials: false,
        }
    }

    fn without_partials(mut self) -> Self {
        self.skip_partials = true;
        self
    }

    /// Whether `path` is selected by this pattern.
    pub fn matches(&self, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(&self.base) else {
            return false;
        };
        if !self.recursive && relative.components().count() != 1 {
            return false;
        }
        if self.skip_partials
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('_'))
        {
            return false;
        }

        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|candidate| candidate.eq_ignore_ascii_case(ext))
            })
    }

    /// All matching files, sorted. A missing base directory matches nothing.
    pub fn discover(&self) -> Vec<PathBuf> {
        if !self.base.is_dir() {
            return Vec::new();
        }

        let walker = WalkDir::new(&self.base).max_depth(if self.recursive { usize::MAX } else { 1 });
        let mut files: Vec<PathBuf> = walker
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| self.matches(p))
            .collect();
        files.sort();
        files
    }
}

impl fmt::Display for AssetPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = self.base.display().to_string().replace('\\', "/");
        let dirs = if self.recursive { "/**" } else { "" };
        match self.extensions.as_slice() {
            [single] => write!(f, "{}{}/*.{}", base, dirs, single),
            many => write!(f, "{}{}/*.{{{}}}", base, dirs, many.join(",")),
        }
    }
}

/// Source, watch and output locations for one asset kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    pub source: AssetPattern,
    pub watch: AssetPattern,
    pub output: PathBuf,
}

/// Where every asset kind is read from, watched and written to.
///
/// Every output directory lies inside `dist`.
#[derive(Debug, Clone)]
pub struct PathTable {
    src: PathBuf,
    dist: PathBuf,
    grid_config: PathBuf,
    vendor_dir: PathBuf,
    css_chunk: PathBuf,
    entries: BTreeMap<AssetKind, PathEntry>,
}

impl PathTable {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let src = config.paths.src.clone();
        let dist = config.paths.dist.clone();
        let outputs = &config.paths.outputs;
        let ext = config.css.preprocessor.extension();

        let output = |kind: &str, relative: &Path| -> Result<PathBuf, ConfigError> {
            let escapes = relative.is_absolute()
                || relative
                    .components()
                    .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
            if escapes {
                return Err(ConfigError::OutsideDist {
                    kind: kind.to_string(),
                    dist: dist.display().to_string(),
                    path: relative.display().to_string(),
                });
            }
            Ok(dist.join(relative))
        };

        let styles = src.join("assets").join(ext);
        let scripts = src.join("assets").join("js");
        let images = src.join("assets").join("images");
        let fonts = src.join("assets").join("fonts");

        let mut entries = BTreeMap::new();
        entries.insert(
            AssetKind::Html,
            PathEntry {
                source: AssetPattern::new(&src, false, &["html"]),
                watch: AssetPattern::new(&src, true, &["html"]),
                output: output("html", &outputs.html)?,
            },
        );
        entries.insert(
            AssetKind::Css,
            PathEntry {
                source: AssetPattern::new(&styles, false, &[ext]).without_partials(),
                watch: AssetPattern::new(&styles, true, &[ext]),
                output: output("css", &outputs.css)?,
            },
        );
        entries.insert(
            AssetKind::Js,
            PathEntry {
                source: AssetPattern::new(&scripts, false, &["js"]),
                watch: AssetPattern::new(&scripts, true, &["js"]),
                output: output("js", &outputs.js)?,
            },
        );
        entries.insert(
            AssetKind::Images,
            PathEntry {
                source: AssetPattern::new(&images, true, IMAGE_EXTENSIONS),
                watch: AssetPattern::new(&images, true, IMAGE_EXTENSIONS),
                output: output("images", &outputs.images)?,
            },
        );
        entries.insert(
            AssetKind::Fonts,
            PathEntry {
                source: AssetPattern::new(&fonts, true, FONT_EXTENSIONS),
                watch: AssetPattern::new(&fonts, true, FONT_EXTENSIONS),
                output: output("fonts", &outputs.fonts)?,
            },
        );

        Ok(Self {
            css_chunk: output("css chunk", &outputs.css_chunk)?,
            vendor_dir: styles.join("vendor"),
            grid_config: config.paths.grid_config.clone(),
            src,
            dist,
            entries,
        })
    }

    pub fn src(&self) -> &Path {
        &self.src
    }

    pub fn dist(&self) -> &Path {
        &self.dist
    }

    pub fn entry(&self, kind: AssetKind) -> &PathEntry {
        // Every kind is inserted by `new`.
        &self.entries[&kind]
    }

    pub fn source(&self, kind: AssetKind) -> &AssetPattern {
        &self.entry(kind).source
    }

    pub fn watch(&self, kind: AssetKind) -> &AssetPattern {
        &self.entry(kind).watch
    }

    pub fn output(&self, kind: AssetKind) -> &Path {
        &self.entry(kind).output
    }

    /// Second destination for full, unminified style sheets.
    pub fn css_chunk_dir(&self) -> &Path {
        &self.css_chunk
    }

    /// Directory the grid stylesheet is generated into.
    pub fn vendor_dir(&self) -> &Path {
        &self.vendor_dir
    }

    pub fn grid_config(&self) -> &Path {
        &self.grid_config
    }

    /// Layout, partial, helper and data directories for page templates.
    pub fn template_dirs(&self) -> TemplateDirs {
        TemplateDirs::new(&self.src)
    }

    /// Markup scanned when purging unused styles.
    pub fn content_files(&self) -> Vec<PathBuf> {
        self.watch(AssetKind::Html).discover()
    }

    /// The asset kinds whose watch pattern selects `path`.
    pub fn kinds_for(&self, path: &Path) -> Vec<AssetKind> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.watch.matches(path))
            .map(|(kind, _)| *kind)
            .collect()
    }
}

//! Page rendering with layouts, partials, helpers and data.
//!
//! A page is a template with optional front matter. Its rendered body is
//! wrapped in a layout from `layouts/` (defaulting to `layouts/default.html`
//! when that file exists). Partials and helper macros are resolved relative
//! to the source root, so a page includes them as
//! `{% include "partials/header.html" %}` or
//! `{% import "helpers/buttons.html" as buttons %}`. Every JSON or YAML file
//! in `data/` is exposed under its file stem.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{Environment, Value};

use crate::frontmatter::{extract_frontmatter, FrontmatterError};

const DEFAULT_LAYOUT: &str = "default";
const NO_LAYOUT: &str = "none";

/// Directories consumed by the templating step.
#[derive(Debug, Clone)]
pub struct TemplateDirs {
    /// Source root; template names resolve against it
    pub root: PathBuf,
    /// Page layouts
    pub layouts: PathBuf,
    /// Partials available to `include`
    pub partials: PathBuf,
    /// Macro files available to `import`
    pub helpers: PathBuf,
    /// JSON / YAML data files
    pub data: PathBuf,
}

impl TemplateDirs {
    /// Standard layout below a source root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            layouts: root.join("layouts"),
            partials: root.join("partials"),
            helpers: root.join("helpers"),
            data: root.join("data"),
            root,
        }
    }
}

/// Errors that can occur while rendering a page.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Front matter error in {page}: {source}")]
    Frontmatter {
        page: String,
        #[source]
        source: FrontmatterError,
    },

    #[error("Failed to render {page}: {message}")]
    Render { page: String, message: String },

    #[error("Layout not found: {0}")]
    MissingLayout(String),

    #[error("Invalid data file {path}: {message}")]
    Data { path: String, message: String },

    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },
}

/// Renders pages against a freshly loaded template environment.
///
/// Construct one per task run: layouts, partials and data are read from
/// disk on construction and on first use, never carried between runs.
pub struct PageRenderer {
    env: Environment<'static>,
    dirs: TemplateDirs,
    data: BTreeMap<String, Value>,
}

impl PageRenderer {
    /// Create a renderer and load the data directory.
    pub fn load(dirs: TemplateDirs) -> Result<Self, TemplateError> {
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(&dirs.root));
        env.add_filter("markdown", markdown_filter);

        let data = load_data(&dirs.data)?;
        tracing::debug!("Loaded {} data files from {}", data.len(), dirs.data.display());

        Ok(Self { env, dirs, data })
    }

    /// Render a page source named `name` (e.g. `index.html`).
    pub fn render(&self, name: &str, source: &str) -> Result<String, TemplateError> {
        let (frontmatter, body) =
            extract_frontmatter(source).map_err(|source| TemplateError::Frontmatter {
                page: name.to_string(),
                source,
            })?;
        let frontmatter = frontmatter.unwrap_or_default();

        let mut context: BTreeMap<String, Value> = self.data.clone();
        for (key, value) in &frontmatter.vars {
            context.insert(key.clone(), Value::from_serialize(value));
        }
        let stem = Path::new(name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name);
        context.insert("page".to_string(), Value::from(stem));

        let render_err = |e: minijinja::Error| TemplateError::Render {
            page: name.to_string(),
            message: format!("{:#}", e),
        };

        let page = self
            .env
            .template_from_named_str(name, body)
            .map_err(render_err)?;
        let rendered = page.render(&context).map_err(render_err)?;

        let Some(layout) = self.resolve_layout(frontmatter.layout.as_deref())? else {
            return Ok(rendered);
        };

        context.insert("body".to_string(), Value::from_safe_string(rendered));
        let template = self.env.get_template(&layout).map_err(render_err)?;
        template.render(&context).map_err(render_err)
    }

    /// Resolve the template name of the layout to wrap a page in.
    fn resolve_layout(&self, requested: Option<&str>) -> Result<Option<String>, TemplateError> {
        match requested {
            Some(NO_LAYOUT) => Ok(None),
            Some(name) => {
                let path = self.dirs.layouts.join(format!("{}.html", name));
                if !path.is_file() {
                    return Err(TemplateError::MissingLayout(path.display().to_string()));
                }
                Ok(Some(format!("layouts/{}.html", name)))
            }
            None => {
                let path = self.dirs.layouts.join(format!("{}.html", DEFAULT_LAYOUT));
                Ok(path
                    .is_file()
                    .then(|| format!("layouts/{}.html", DEFAULT_LAYOUT)))
            }
        }
    }
}

/// Load every JSON / YAML file in the data directory, keyed by file stem.
fn load_data(dir: &Path) -> Result<BTreeMap<String, Value>, TemplateError> {
    let mut data = BTreeMap::new();

    let Ok(entries) = fs::read_dir(dir) else {
        return Ok(data);
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let content = fs::read_to_string(&path).map_err(|e| TemplateError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let data_err = |message: String| TemplateError::Data {
            path: path.display().to_string(),
            message,
        };

        let value = match ext {
            "json" => {
                let v: serde_json::Value =
                    serde_json::from_str(&content).map_err(|e| data_err(e.to_string()))?;
                Value::from_serialize(&v)
            }
            "yml" | "yaml" => {
                let v: serde_yaml::Value =
                    serde_yaml::from_str(&content).map_err(|e| data_err(e.to_string()))?;
                Value::from_serialize(&v)
            }
            _ => continue,
        };

        data.insert(stem.to_string(), value);
    }

    Ok(data)
}

/// Render a markdown string to HTML.
fn markdown_filter(value: String) -> Value {
    use pulldown_cmark::{html, Options, Parser};

    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let parser = Parser::new_ext(&value, options);

    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    Value::from_safe_string(html_output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn site() -> tempfile::TempDir {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("layouts")).unwrap();
        fs::create_dir_all(root.join("partials")).unwrap();
        fs::create_dir_all(root.join("helpers")).unwrap();
        fs::create_dir_all(root.join("data")).unwrap();

        fs::write(
            root.join("layouts/default.html"),
            "<main>{% include \"partials/nav.html\" %}{{ body }}</main>",
        )
        .unwrap();
        fs::write(root.join("layouts/bare.html"), "[{{ body }}]").unwrap();
        fs::write(root.join("partials/nav.html"), "<nav>{{ site.name }}</nav>").unwrap();
        fs::write(
            root.join("helpers/ui.html"),
            "{% macro button(label) %}<a class=\"btn\">{{ label }}</a>{% endmacro %}",
        )
        .unwrap();
        fs::write(root.join("data/site.json"), r#"{"name": "Acme"}"#).unwrap();
        fs::write(root.join("data/team.yml"), "- Ada\n- Grace\n").unwrap();
        temp
    }

    #[test]
    fn wraps_page_in_default_layout_with_partials_and_data() {
        let temp = site();
        let renderer = PageRenderer::load(TemplateDirs::new(temp.path())).unwrap();

        let html = renderer
            .render("index.html", "<p>{{ team | length }} people</p>")
            .unwrap();

        assert_eq!(html, "<main><nav>Acme</nav><p>2 people</p></main>");
    }

    #[test]
    fn uses_requested_layout_and_front_matter_vars() {
        let temp = site();
        let renderer = PageRenderer::load(TemplateDirs::new(temp.path())).unwrap();

        let html = renderer
            .render("about.html", "---\nlayout: bare\nheading: About\n---\n<h1>{{ heading }}</h1>")
            .unwrap();

        assert_eq!(html, "[<h1>About</h1>]");
    }

    #[test]
    fn layout_none_renders_body_only() {
        let temp = site();
        let renderer = PageRenderer::load(TemplateDirs::new(temp.path())).unwrap();

        let html = renderer
            .render("raw.html", "---\nlayout: none\n---\n{{ page }}")
            .unwrap();

        assert_eq!(html, "raw");
    }

    #[test]
    fn imports_helper_macros() {
        let temp = site();
        let renderer = PageRenderer::load(TemplateDirs::new(temp.path())).unwrap();

        let html = renderer
            .render(
                "cta.html",
                "---\nlayout: none\n---\n{% import \"helpers/ui.html\" as ui %}{{ ui.button(\"Go\") }}",
            )
            .unwrap();

        assert_eq!(html, "<a class=\"btn\">Go</a>");
    }

    #[test]
    fn renders_markdown_filter() {
        let temp = site();
        let renderer = PageRenderer::load(TemplateDirs::new(temp.path())).unwrap();

        let html = renderer
            .render(
                "md.html",
                "---\nlayout: none\n---\n{% filter markdown %}# Title{% endfilter %}",
            )
            .unwrap();

        assert!(html.contains("<h1>Title</h1>"));
    }

    #[test]
    fn errors_on_missing_layout() {
        let temp = site();
        let renderer = PageRenderer::load(TemplateDirs::new(temp.path())).unwrap();

        let result = renderer.render("x.html", "---\nlayout: ghost\n---\nhi");

        assert!(matches!(result, Err(TemplateError::MissingLayout(_))));
    }

    #[test]
    fn errors_on_template_syntax() {
        let temp = site();
        let renderer = PageRenderer::load(TemplateDirs::new(temp.path())).unwrap();

        let result = renderer.render("bad.html", "{% if %}");

        assert!(matches!(result, Err(TemplateError::Render { .. })));
    }

    #[test]
    fn works_without_template_directories() {
        let temp = tempdir().unwrap();
        let renderer = PageRenderer::load(TemplateDirs::new(temp.path())).unwrap();

        assert_eq!(renderer.render("a.html", "<b>{{ page }}</b>").unwrap(), "<b>a</b>");
    }
}

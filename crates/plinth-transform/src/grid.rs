//! Layout grid stylesheet generation.
//!
//! Renders container, row and column utilities from a small TOML config
//! into a vendor stylesheet that the style task then compiles like any
//! other source.

use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{context, Environment};
use serde::{Deserialize, Serialize};

use crate::css::Preprocessor;
use crate::traits::TransformError;

/// Grid settings read from the grid config file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of columns
    pub columns: u32,

    /// Gutter between columns
    pub offset: String,

    /// Emit `min-width` breakpoints instead of `max-width`
    pub mobile_first: bool,

    pub container: Container,

    /// Breakpoints, in the order they are emitted
    pub breakpoints: Vec<Breakpoint>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Container {
    pub max_width: String,
    /// Horizontal padding
    pub fields: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Breakpoint {
    pub name: String,
    pub width: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 12,
            offset: "30px".to_string(),
            mobile_first: false,
            container: Container::default(),
            breakpoints: [("lg", "1100px"), ("md", "960px"), ("sm", "780px"), ("xs", "560px")]
                .iter()
                .map(|(name, width)| Breakpoint {
                    name: name.to_string(),
                    width: width.to_string(),
                })
                .collect(),
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self {
            max_width: "1200px".to_string(),
            fields: "30px".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Column {
    n: u32,
    percent: String,
}

const GRID_TEMPLATE: &str = r#"/* Generated by `plinth grid` from {{ source }}. Do not edit. */
{% if scss %}
$grid-columns: {{ columns }};
$grid-offset: {{ offset }};
$container-max-width: {{ container.max_width }};
{% for bp in breakpoints %}$break-{{ bp.name }}: {{ bp.width }};
{% endfor %}{% endif %}
.container {
  max-width: {{ container.max_width }};
  margin-left: auto;
  margin-right: auto;
  padding-left: {{ container.fields }};
  padding-right: {{ container.fields }};
}

.row {
  display: flex;
  flex-wrap: wrap;
  margin-left: calc({{ offset }} / -2);
  margin-right: calc({{ offset }} / -2);
}
{% for col in cols %}
.col-{{ col.n }} {
  width: calc({{ col.percent }} - {{ offset }});
  margin-left: calc({{ offset }} / 2);
  margin-right: calc({{ offset }} / 2);
}
{% endfor %}{% for bp in breakpoints %}
@media screen and ({{ "min" if mobile_first else "max" }}-width: {{ bp.width }}) {
{% for col in cols %}  .{{ bp.name }}-col-{{ col.n }} {
    width: calc({{ col.percent }} - {{ offset }});
  }
{% endfor %}}
{% endfor %}"#;

/// Writes the grid stylesheet into a vendor directory.
pub struct GridGenerator {
    preprocessor: Preprocessor,
}

impl GridGenerator {
    pub fn new(preprocessor: Preprocessor) -> Self {
        Self { preprocessor }
    }

    /// Read the config from disk (never cached) and write `_grid.<ext>`
    /// into `vendor_dir`. Returns the written path.
    pub fn generate(&self, config_path: &Path, vendor_dir: &Path) -> Result<PathBuf, TransformError> {
        let raw = fs::read_to_string(config_path)?;
        let config: GridConfig = toml::from_str(&raw)
            .map_err(|e| TransformError::syntax(config_path, e))?;

        let stylesheet = self.render(&config, config_path)?;

        fs::create_dir_all(vendor_dir)?;
        let target = vendor_dir.join(format!("_grid.{}", self.preprocessor.extension()));
        fs::write(&target, stylesheet)?;

        Ok(target)
    }

    /// Render the grid stylesheet for a config.
    pub fn render(&self, config: &GridConfig, source: &Path) -> Result<String, TransformError> {
        let columns = config.columns.max(1);
        let cols: Vec<Column> = (1..=columns)
            .map(|n| Column {
                n,
                percent: format_percent(n as f64 * 100.0 / columns as f64),
            })
            .collect();

        let env = Environment::new();
        env.render_str(
            GRID_TEMPLATE,
            context! {
                source => source.display().to_string(),
                scss => self.preprocessor == Preprocessor::Scss,
                columns => columns,
                offset => &config.offset,
                mobile_first => config.mobile_first,
                container => &config.container,
                breakpoints => &config.breakpoints,
                cols => cols,
            },
        )
        .map_err(|e| TransformError::Transform(format!("grid template: {:#}", e)))
    }
}

/// Format a percentage with at most four decimals, trimming trailing zeros.
fn format_percent(value: f64) -> String {
    let formatted = format!("{:.4}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{}%", trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_percentages() {
        assert_eq!(format_percent(50.0), "50%");
        assert_eq!(format_percent(100.0 / 3.0), "33.3333%");
    }

    #[test]
    fn renders_columns_and_breakpoints() {
        let config = GridConfig {
            columns: 4,
            ..GridConfig::default()
        };

        let css = GridGenerator::new(Preprocessor::Css)
            .render(&config, Path::new("grid.toml"))
            .unwrap();

        assert!(css.contains(".col-4 {"));
        assert!(!css.contains(".col-5 {"));
        assert!(css.contains("max-width: 1100px"));
        assert!(css.contains(".xs-col-1"));
        assert!(!css.contains("$grid-columns"));
    }

    #[test]
    fn emits_scss_variables_and_mobile_first_queries() {
        let config = GridConfig {
            mobile_first: true,
            ..GridConfig::default()
        };

        let scss = GridGenerator::new(Preprocessor::Scss)
            .render(&config, Path::new("grid.toml"))
            .unwrap();

        assert!(scss.contains("$grid-columns: 12;"));
        assert!(scss.contains("(min-width: 960px)"));
    }

    #[test]
    fn rereads_config_on_every_run() {
        let temp = tempfile::tempdir().unwrap();
        let config_path = temp.path().join("grid.toml");
        let vendor = temp.path().join("vendor");
        let generator = GridGenerator::new(Preprocessor::Scss);

        fs::write(&config_path, "columns = 6\n").unwrap();
        let target = generator.generate(&config_path, &vendor).unwrap();
        assert!(fs::read_to_string(&target).unwrap().contains(".col-6 {"));

        fs::write(&config_path, "columns = 3\n").unwrap();
        generator.generate(&config_path, &vendor).unwrap();
        let css = fs::read_to_string(&target).unwrap();

        assert_eq!(target, vendor.join("_grid.scss"));
        assert!(css.contains(".col-3 {"));
        assert!(!css.contains(".col-6 {"));
    }

    #[test]
    fn rejects_malformed_config() {
        let temp = tempfile::tempdir().unwrap();
        let config_path = temp.path().join("grid.toml");
        fs::write(&config_path, "columns = \"many\"\n").unwrap();

        let result = GridGenerator::new(Preprocessor::Scss).generate(&config_path, temp.path());

        assert!(matches!(result, Err(TransformError::Syntax { .. })));
    }
}

//! Page templating for plinth.
//!
//! Renders source pages with front matter, layouts, partials, helper macros
//! and JSON/YAML data into plain HTML.

pub mod frontmatter;
pub mod renderer;

pub use frontmatter::{extract_frontmatter, Frontmatter, FrontmatterError};
pub use renderer::{PageRenderer, TemplateDirs, TemplateError};

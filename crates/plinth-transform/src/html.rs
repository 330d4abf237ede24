//! Markup transformers.

use std::sync::LazyLock;

use plinth_templates::{PageRenderer, TemplateDirs};
use regex::{Captures, Regex};

use crate::traits::{Asset, Transformer, TransformError};

/// Renders a page through layouts, partials, helpers and data.
pub struct Template {
    renderer: PageRenderer,
}

impl Template {
    /// Load the template directories fresh from disk.
    pub fn load(dirs: TemplateDirs) -> Result<Self, TransformError> {
        let renderer =
            PageRenderer::load(dirs).map_err(|e| TransformError::Transform(e.to_string()))?;
        Ok(Self { renderer })
    }
}

impl Transformer for Template {
    fn name(&self) -> &'static str {
        "template"
    }

    fn apply(&self, asset: Asset) -> Result<Asset, TransformError> {
        let name = asset.path.to_string_lossy().replace('\\', "/");
        let html = self
            .renderer
            .render(&name, asset.text()?)
            .map_err(|e| TransformError::syntax(&asset.path, e))?;
        Ok(asset.with_contents(html))
    }
}

static HTML_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--[\s\S]*?-->").expect("Invalid comment regex"));

/// Removes HTML comments, keeping conditional comments.
pub struct StripHtmlComments;

impl Transformer for StripHtmlComments {
    fn name(&self) -> &'static str {
        "strip-comments"
    }

    fn apply(&self, asset: Asset) -> Result<Asset, TransformError> {
        let html = HTML_COMMENT_RE
            .replace_all(asset.text()?, |caps: &Captures| {
                let comment = &caps[0];
                if comment.starts_with("<!--[if") || comment.contains("<![endif]") {
                    comment.to_string()
                } else {
                    String::new()
                }
            })
            .into_owned();
        Ok(asset.with_contents(html))
    }
}

/// Minifies markup, collapsing whitespace.
pub struct MinifyHtml;

impl Transformer for MinifyHtml {
    fn name(&self) -> &'static str {
        "minify"
    }

    fn apply(&self, asset: Asset) -> Result<Asset, TransformError> {
        let mut cfg = minify_html::Cfg::new();
        cfg.keep_closing_tags = true;
        cfg.keep_html_and_head_opening_tags = true;
        cfg.keep_comments = false;
        cfg.minify_css = true;
        cfg.minify_js = true;
        let html = minify_html::minify(&asset.contents, &cfg);
        Ok(asset.with_contents(html))
    }
}

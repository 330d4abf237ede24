//! Critical (above-the-fold) style extraction.
//!
//! The extractor keeps the rules a page's markup can match, plus forced
//! `include` selectors. Two filters apply per selector: selectors matching
//! an `ignore` pattern are dropped, and selectors listed in the `keep`
//! table retain only the listed properties.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use lightningcss::properties::Property;
use lightningcss::rules::style::StyleRule;
use lightningcss::rules::CssRule;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::traits::ToCss;
use regex::Regex;

use crate::css::{content_tokens, css_symbols};
use crate::traits::TransformError;

/// Viewport the critical region is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 480,
        }
    }
}

/// Options for extracting one page's critical styles.
#[derive(Debug, Clone, Default)]
pub struct CriticalOptions {
    /// Recorded for the page but not used for selection: without a layout
    /// engine the fold is approximated by the selectors the page's markup
    /// can match.
    pub viewport: Viewport,

    /// Selectors always treated as critical
    pub include: Vec<String>,

    /// Rules whose selector matches any of these are dropped
    pub ignore: Vec<Regex>,

    /// Selector -> properties to retain for that selector
    pub keep: BTreeMap<String, Vec<String>>,
}

/// Extracts critical styles for a page.
pub struct CriticalExtractor {
    options: CriticalOptions,
}

impl CriticalExtractor {
    pub fn new(options: CriticalOptions) -> Self {
        Self { options }
    }

    /// Extract the critical subset of `css` for the page `html`.
    pub fn extract(&self, html: &str, css: &str, css_path: &Path) -> Result<String, TransformError> {
        let mut used = content_tokens(html);
        for selector in &self.options.include {
            used.extend(content_tokens(selector));
        }
        let unused_symbols: HashSet<String> = css_symbols(css)
            .into_iter()
            .filter(|symbol| !used.contains(symbol))
            .collect();

        let mut sheet = StyleSheet::parse(
            css,
            ParserOptions {
                filename: css_path.display().to_string(),
                ..ParserOptions::default()
            },
        )
        .map_err(|e| TransformError::syntax(css_path, e))?;

        self.filter_rules(&mut sheet.rules.0);

        sheet
            .minify(MinifyOptions {
                unused_symbols,
                ..MinifyOptions::default()
            })
            .map_err(|e| TransformError::Transform(e.to_string()))?;

        let code = sheet
            .to_css(PrinterOptions {
                minify: true,
                ..PrinterOptions::default()
            })
            .map_err(|e| TransformError::Transform(e.to_string()))?
            .code;
        Ok(code)
    }

    /// Filter rules before minification, which merges rules with identical
    /// declarations into one selector list.
    fn filter_rules<'i>(&self, rules: &mut Vec<CssRule<'i>>) {
        let mut filtered = Vec::with_capacity(rules.len());
        for rule in rules.drain(..) {
            match rule {
                CssRule::Style(style) => {
                    filtered.extend(self.filter_style(style).into_iter().map(CssRule::Style))
                }
                CssRule::Media(mut media) => {
                    self.filter_rules(&mut media.rules.0);
                    if !media.rules.0.is_empty() {
                        filtered.push(CssRule::Media(media));
                    }
                }
                other => filtered.push(other),
            }
        }
        *rules = filtered;
    }

    /// Apply the ignore and keep filters per selector.
    ///
    /// Ignored selectors leave the list. A selector with a keep entry is
    /// split into its own rule holding only the listed properties; the
    /// remaining selectors keep every declaration.
    fn filter_style<'i>(&self, mut style: StyleRule<'i>) -> Vec<StyleRule<'i>> {
        let mut rest = Vec::new();
        let mut split = Vec::new();
        for selector in std::mem::take(&mut style.selectors.0) {
            let name = selector
                .to_css_string(PrinterOptions::default())
                .unwrap_or_default();
            if self.options.ignore.iter().any(|re| re.is_match(&name)) {
                continue;
            }
            match self.options.keep.get(name.trim()) {
                Some(keep) => split.push((selector, keep)),
                None => rest.push(selector),
            }
        }

        let mut out = Vec::with_capacity(split.len() + 1);
        if !rest.is_empty() {
            let mut rule = style.clone();
            rule.selectors.0 = rest.into_iter().collect();
            out.push(rule);
        }
        for (selector, keep) in split {
            let mut rule = style.clone();
            rule.selectors.0 = std::iter::once(selector).collect();
            let declarations = &mut rule.declarations;
            declarations
                .declarations
                .retain(|property| keeps(keep, property));
            declarations
                .important_declarations
                .retain(|property| keeps(keep, property));
            out.push(rule);
        }

        for rule in &mut out {
            self.filter_rules(&mut rule.rules.0);
        }
        out.retain(|rule| {
            !(rule.declarations.declarations.is_empty()
                && rule.declarations.important_declarations.is_empty()
                && rule.rules.0.is_empty())
        });
        out
    }
}

fn keeps(keep: &[String], property: &Property<'_>) -> bool {
    let id = property.property_id();
    keep.iter().any(|name| name == id.name())
}

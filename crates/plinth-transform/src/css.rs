//! Style sheet transformers.
//!
//! Sass compilation is delegated to `grass`; everything after it (vendor
//! prefixing, pretty printing, media query grouping, unused rule removal,
//! source maps and minification) is done with `lightningcss`.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use base64::Engine as _;
use lightningcss::rules::media::MediaRule;
use lightningcss::rules::CssRule;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use lightningcss::traits::ToCss;
use parcel_sourcemap::SourceMap;
use regex::Regex;
use serde::Deserialize;

use crate::traits::{Asset, Transformer, TransformError};

/// Style source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Preprocessor {
    /// Sass (SCSS syntax), compiled with grass
    #[default]
    Scss,
    /// Plain CSS, validated and printed by lightningcss
    Css,
}

impl Preprocessor {
    /// Source file extension and directory name (e.g. `scss`).
    pub fn extension(&self) -> &'static str {
        match self {
            Preprocessor::Scss => "scss",
            Preprocessor::Css => "css",
        }
    }
}

/// Minimum browser versions used for vendor prefixing (major versions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BrowserVersions {
    pub chrome: Option<u32>,
    pub edge: Option<u32>,
    pub firefox: Option<u32>,
    pub safari: Option<u32>,
    pub ios_saf: Option<u32>,
    pub opera: Option<u32>,
    pub samsung: Option<u32>,
}

impl Default for BrowserVersions {
    fn default() -> Self {
        Self {
            chrome: Some(80),
            edge: Some(88),
            firefox: Some(78),
            safari: Some(13),
            ios_saf: Some(13),
            opera: None,
            samsung: None,
        }
    }
}

impl BrowserVersions {
    /// Convert to lightningcss targets.
    pub fn targets(&self) -> Targets {
        // lightningcss encodes versions as major << 16 | minor << 8 | patch.
        let v = |major: Option<u32>| major.map(|m| m << 16);
        Targets::from(Browsers {
            chrome: v(self.chrome),
            edge: v(self.edge),
            firefox: v(self.firefox),
            safari: v(self.safari),
            ios_saf: v(self.ios_saf),
            opera: v(self.opera),
            samsung: v(self.samsung),
            ..Browsers::default()
        })
    }
}

fn parse<'i>(path: &Path, source: &'i str) -> Result<StyleSheet<'i>, TransformError> {
    StyleSheet::parse(
        source,
        ParserOptions {
            filename: path.display().to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| TransformError::syntax(path, e))
}

fn print(sheet: &StyleSheet, minify: bool, targets: Targets) -> Result<String, TransformError> {
    sheet
        .to_css(PrinterOptions {
            minify,
            targets,
            ..PrinterOptions::default()
        })
        .map(|result| result.code)
        .map_err(|e| TransformError::Transform(e.to_string()))
}

fn minify_sheet(sheet: &mut StyleSheet, options: MinifyOptions) -> Result<(), TransformError> {
    sheet
        .minify(options)
        .map_err(|e| TransformError::Transform(e.to_string()))
}

/// Compiles the preprocessor language to CSS.
pub struct Preprocess {
    preprocessor: Preprocessor,
    /// Directory the asset paths are relative to; used for `@import` lookups
    base: PathBuf,
}

impl Preprocess {
    pub fn new(preprocessor: Preprocessor, base: impl Into<PathBuf>) -> Self {
        Self {
            preprocessor,
            base: base.into(),
        }
    }
}

impl Transformer for Preprocess {
    fn name(&self) -> &'static str {
        "preprocess"
    }

    fn apply(&self, asset: Asset) -> Result<Asset, TransformError> {
        let source = asset.text()?;

        let css = match self.preprocessor {
            Preprocessor::Scss => {
                let full_path = self.base.join(&asset.path);
                let load_dir = full_path.parent().unwrap_or(&self.base);
                let options = grass::Options::default()
                    .load_path(load_dir)
                    .style(grass::OutputStyle::Expanded);
                grass::from_string(source.to_string(), &options)
                    .map_err(|e| TransformError::syntax(&asset.path, e))?
            }
            Preprocessor::Css => {
                let sheet = parse(&asset.path, source)?;
                print(&sheet, false, Targets::default())?
            }
        };

        Ok(asset.with_contents(css).with_extension("css"))
    }
}

/// Adds vendor prefixes required by the configured browsers.
pub struct Autoprefix {
    targets: Targets,
}

impl Autoprefix {
    pub fn new(browsers: &BrowserVersions) -> Self {
        Self {
            targets: browsers.targets(),
        }
    }
}

impl Transformer for Autoprefix {
    fn name(&self) -> &'static str {
        "autoprefix"
    }

    fn apply(&self, asset: Asset) -> Result<Asset, TransformError> {
        let css = {
            let mut sheet = parse(&asset.path, asset.text()?)?;
            minify_sheet(
                &mut sheet,
                MinifyOptions {
                    targets: self.targets,
                    ..MinifyOptions::default()
                },
            )?;
            print(&sheet, false, self.targets)?
        };
        Ok(asset.with_contents(css))
    }
}

/// Pretty prints a style sheet.
pub struct Beautify;

impl Transformer for Beautify {
    fn name(&self) -> &'static str {
        "beautify"
    }

    fn apply(&self, asset: Asset) -> Result<Asset, TransformError> {
        let css = {
            let sheet = parse(&asset.path, asset.text()?)?;
            print(&sheet, false, Targets::default())?
        };
        Ok(asset.with_contents(css))
    }
}

/// Merges `@media` blocks with identical queries and moves them to the end
/// of the sheet, in the order each query first appeared.
pub struct GroupMediaQueries;

impl Transformer for GroupMediaQueries {
    fn name(&self) -> &'static str {
        "group-media-queries"
    }

    fn apply(&self, asset: Asset) -> Result<Asset, TransformError> {
        let css = {
            let mut sheet = parse(&asset.path, asset.text()?)?;
            group_media_rules(&mut sheet)?;
            print(&sheet, false, Targets::default())?
        };
        Ok(asset.with_contents(css))
    }
}

fn group_media_rules(sheet: &mut StyleSheet<'_>) -> Result<(), TransformError> {
    let rules = std::mem::take(&mut sheet.rules.0);
    let mut plain = Vec::with_capacity(rules.len());
    let mut groups: Vec<(String, MediaRule<'_>)> = Vec::new();

    for rule in rules {
        match rule {
            CssRule::Media(media) => {
                let key = media
                    .query
                    .to_css_string(PrinterOptions::default())
                    .map_err(|e| TransformError::Transform(e.to_string()))?;
                match groups.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, existing)) => existing.rules.0.extend(media.rules.0),
                    None => groups.push((key, media)),
                }
            }
            other => plain.push(other),
        }
    }

    plain.extend(groups.into_iter().map(|(_, media)| CssRule::Media(media)));
    sheet.rules.0 = plain;
    Ok(())
}

static SYMBOL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[.#](-?[_a-zA-Z][_a-zA-Z0-9-]*)").expect("Invalid symbol regex")
});

static CONTENT_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9_-]+").expect("Invalid content token regex"));

/// Class and id names mentioned in a style sheet.
pub fn css_symbols(css: &str) -> HashSet<String> {
    SYMBOL_RE
        .captures_iter(css)
        .map(|c| c[1].to_string())
        .collect()
}

/// Every word-like token in a markup document.
pub fn content_tokens(markup: &str) -> HashSet<String> {
    CONTENT_TOKEN_RE
        .find_iter(markup)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Removes rules whose class or id selectors never appear in the content.
pub struct Purge {
    used: HashSet<String>,
}

impl Purge {
    /// Build from an already tokenized content corpus.
    pub fn new(used: HashSet<String>) -> Self {
        Self { used }
    }

    /// Tokenize every content file.
    pub fn from_files(files: &[PathBuf]) -> Result<Self, TransformError> {
        let mut used = HashSet::new();
        for file in files {
            let markup = fs::read_to_string(file)?;
            used.extend(content_tokens(&markup));
        }
        Ok(Self::new(used))
    }
}

impl Transformer for Purge {
    fn name(&self) -> &'static str {
        "purge"
    }

    fn apply(&self, asset: Asset) -> Result<Asset, TransformError> {
        let source = asset.text()?;
        let unused_symbols: HashSet<String> = css_symbols(source)
            .into_iter()
            .filter(|symbol| !self.used.contains(symbol))
            .collect();

        if unused_symbols.is_empty() {
            return Ok(asset);
        }
        tracing::debug!(
            "Purging {} unused symbols from {}",
            unused_symbols.len(),
            asset.path.display()
        );

        let css = {
            let mut sheet = parse(&asset.path, source)?;
            minify_sheet(
                &mut sheet,
                MinifyOptions {
                    unused_symbols,
                    ..MinifyOptions::default()
                },
            )?;
            print(&sheet, false, Targets::default())?
        };
        Ok(asset.with_contents(css))
    }
}

/// Reprints the sheet with an inline base64 source map comment.
///
/// The map covers the compiled stylesheet only: it points the printed rules
/// back at the sheet this step received, not at the Sass sources, since
/// grass does not emit source maps.
pub struct InlineSourceMap;

impl Transformer for InlineSourceMap {
    fn name(&self) -> &'static str {
        "sourcemap"
    }

    fn apply(&self, asset: Asset) -> Result<Asset, TransformError> {
        let map_err = |e: parcel_sourcemap::SourceMapError| {
            TransformError::Transform(format!("source map: {:?}", e))
        };

        let source = asset.text()?;
        let filename = asset.path.display().to_string();
        let mut source_map = SourceMap::new("/");
        source_map.add_source(&filename);
        source_map.set_source_content(0, source).map_err(map_err)?;

        let code = {
            let sheet = parse(&asset.path, source)?;
            sheet
                .to_css(PrinterOptions {
                    source_map: Some(&mut source_map),
                    ..PrinterOptions::default()
                })
                .map_err(|e| TransformError::Transform(e.to_string()))?
                .code
        };

        let json = source_map.to_json(None).map_err(map_err)?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(json);
        let css = format!(
            "{}\n/*# sourceMappingURL=data:application/json;charset=utf-8;base64,{} */\n",
            code.trim_end(),
            encoded
        );

        Ok(asset.with_contents(css))
    }
}

/// Minifies a style sheet.
pub struct Minify {
    targets: Targets,
}

impl Minify {
    pub fn new(browsers: &BrowserVersions) -> Self {
        Self {
            targets: browsers.targets(),
        }
    }
}

impl Transformer for Minify {
    fn name(&self) -> &'static str {
        "minify"
    }

    fn apply(&self, asset: Asset) -> Result<Asset, TransformError> {
        let css = {
            let mut sheet = parse(&asset.path, asset.text()?)?;
            minify_sheet(
                &mut sheet,
                MinifyOptions {
                    targets: self.targets,
                    ..MinifyOptions::default()
                },
            )?;
            print(&sheet, true, self.targets)?
        };
        Ok(asset.with_contents(css))
    }
}

/// Removes every `/* ... */` comment, including `/*! ... */` ones.
pub struct StripComments;

impl Transformer for StripComments {
    fn name(&self) -> &'static str {
        "strip-comments"
    }

    fn apply(&self, asset: Asset) -> Result<Asset, TransformError> {
        let css = strip_css_comments(asset.text()?);
        Ok(asset.with_contents(css))
    }
}

/// Strip CSS comments, leaving quoted strings untouched.
pub fn strip_css_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut chars = css.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => {
                quote = Some(c);
                out.push(c);
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for inner in chars.by_ref() {
                    if prev == '*' && inner == '/' {
                        break;
                    }
                    prev = inner;
                }
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn css(asset: &Asset) -> &str {
        asset.text().unwrap()
    }

    #[test]
    fn compiles_scss_variables_and_nesting() {
        let temp = tempfile::tempdir().unwrap();
        let asset = Asset::new(
            "style.scss",
            "$brand: #ff0000;\n.card { .title { color: $brand; } }",
        );

        let out = Preprocess::new(Preprocessor::Scss, temp.path())
            .apply(asset)
            .unwrap();

        assert_eq!(out.path, PathBuf::from("style.css"));
        assert!(css(&out).contains(".card .title"));
        assert!(css(&out).contains("color: #ff0000"));
    }

    #[test]
    fn resolves_scss_imports_from_the_file_directory() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("vendor")).unwrap();
        fs::write(temp.path().join("vendor/_grid.scss"), ".row { display: flex; }").unwrap();
        let asset = Asset::new("style.scss", "@import \"vendor/grid\";");

        let out = Preprocess::new(Preprocessor::Scss, temp.path())
            .apply(asset)
            .unwrap();

        assert!(css(&out).contains(".row"));
    }

    #[test]
    fn reports_scss_syntax_errors() {
        let temp = tempfile::tempdir().unwrap();
        let asset = Asset::new("broken.scss", ".a { color: red; ");

        let result = Preprocess::new(Preprocessor::Scss, temp.path()).apply(asset);

        assert!(matches!(result, Err(TransformError::Syntax { .. })));
    }

    #[test]
    fn prefixes_for_old_safari() {
        let asset = Asset::new(
            "style.css",
            ".glass { backdrop-filter: blur(4px); user-select: none; }",
        );

        let out = Autoprefix::new(&BrowserVersions::default())
            .apply(asset)
            .unwrap();

        assert!(css(&out).contains("-webkit-"), "{}", css(&out));
    }

    #[test]
    fn groups_identical_media_queries_at_the_end() {
        let asset = Asset::new(
            "style.css",
            "@media (min-width: 768px) { .a { color: red; } }\n\
             .b { color: blue; }\n\
             @media (min-width: 768px) { .c { color: green; } }",
        );

        let out = GroupMediaQueries.apply(asset).unwrap();
        let text = css(&out);

        assert_eq!(text.matches("@media").count(), 1);
        let media_pos = text.find("@media").unwrap();
        assert!(text.find(".b").unwrap() < media_pos);
        assert!(text.find(".a").unwrap() > media_pos);
        assert!(text.find(".c").unwrap() > media_pos);
    }

    #[test]
    fn purges_selectors_missing_from_content() {
        let purge = Purge::new(content_tokens(r#"<div class="used"></div>"#));
        let asset = Asset::new("style.css", ".used { color: red; }\n.ghost { color: blue; }");

        let out = purge.apply(asset).unwrap();

        assert!(css(&out).contains(".used"));
        assert!(!css(&out).contains(".ghost"));
    }

    #[test]
    fn keeps_element_selectors_when_purging() {
        let purge = Purge::new(HashSet::new());
        let asset = Asset::new("style.css", "body { margin: 0; }\n.ghost { color: blue; }");

        let out = purge.apply(asset).unwrap();

        assert!(css(&out).contains("body"));
        assert!(!css(&out).contains(".ghost"));
    }

    #[test]
    fn appends_inline_source_map() {
        let asset = Asset::new("style.css", ".a { color: red; }");

        let out = InlineSourceMap.apply(asset).unwrap();

        assert!(css(&out).contains(".a"));
        assert!(css(&out).contains("sourceMappingURL=data:application/json"));
    }

    #[test]
    fn source_map_points_at_the_received_sheet() {
        let asset = Asset::new("assets/scss/style.css", ".a { color: red; }");

        let out = InlineSourceMap.apply(asset).unwrap();
        let encoded = css(&out)
            .split("base64,")
            .nth(1)
            .and_then(|rest| rest.split(' ').next())
            .unwrap();
        let json = base64::engine::general_purpose::STANDARD.decode(encoded).unwrap();
        let json = String::from_utf8(json).unwrap();

        assert!(json.contains("style.css"), "{}", json);
        assert!(json.contains(".a { color: red; }"), "{}", json);
    }

    #[test]
    fn minifies_and_strips_comments() {
        let asset = Asset::new(
            "style.css",
            "/*! license */\n.a {\n  color: #ff0000;\n}\n/* note */\n",
        );

        let out = Minify::new(&BrowserVersions::default())
            .apply(asset)
            .and_then(|a| StripComments.apply(a))
            .unwrap();

        assert!(!css(&out).contains("/*"));
        assert!(css(&out).contains(".a{color:red}"));
    }

    #[test]
    fn strip_comments_ignores_strings() {
        let stripped = strip_css_comments(".a::before { content: \"/* keep */\"; } /* drop */");

        assert_eq!(stripped, ".a::before { content: \"/* keep */\"; } ");
    }

    #[test]
    fn collects_symbols_and_tokens() {
        let symbols = css_symbols(".btn:hover, #main > .nav-item { margin: 1.5em; }");
        let tokens = content_tokens(r#"<a class="btn nav-item" id="main">"#);

        assert!(symbols.contains("btn"));
        assert!(symbols.contains("main"));
        assert!(symbols.contains("nav-item"));
        assert!(!symbols.contains("5em"));
        assert!(symbols.is_subset(&tokens));
    }
}

//! Script transformers.
//!
//! Bundling is delegated to an external bundler when one is configured.
//! Without one, each entry script is syntax-checked and printed with `oxc`.

use std::path::PathBuf;

use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;

use crate::command::ExternalCommand;
use crate::traits::{Asset, Transformer, TransformError};

/// Bundles an entry script with an external bundler.
pub struct Bundle {
    command: ExternalCommand,
    /// Directory the asset paths are relative to
    base: PathBuf,
}

impl Bundle {
    pub fn new(command: ExternalCommand, base: impl Into<PathBuf>) -> Self {
        Self {
            command,
            base: base.into(),
        }
    }
}

impl Transformer for Bundle {
    fn name(&self) -> &'static str {
        "bundle"
    }

    fn apply(&self, asset: Asset) -> Result<Asset, TransformError> {
        // The bundler reads the original file so relative imports resolve.
        let source = self.base.join(&asset.path);
        let bundled = self.command.transform(&asset, Some(&source), "js")?;
        Ok(asset.with_contents(bundled))
    }
}

fn print(asset: &Asset, minify: bool) -> Result<String, TransformError> {
    let source = asset.text()?;
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(&asset.path).unwrap_or_default();

    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() || ret.panicked {
        let message = ret
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(TransformError::syntax(&asset.path, message));
    }

    // Minified output drops comments, including annotation comments.
    let options = if minify {
        CodegenOptions::minify()
    } else {
        CodegenOptions::default()
    };
    let code = Codegen::new()
        .with_options(options)
        .build(&ret.program)
        .code;
    Ok(code)
}

/// Syntax-checks a script, leaving it unchanged.
pub struct ParseJs;

impl Transformer for ParseJs {
    fn name(&self) -> &'static str {
        "parse"
    }

    fn apply(&self, asset: Asset) -> Result<Asset, TransformError> {
        print(&asset, false)?;
        Ok(asset)
    }
}

/// Prints a script in minified form.
pub struct MinifyJs;

impl Transformer for MinifyJs {
    fn name(&self) -> &'static str {
        "minify"
    }

    fn apply(&self, asset: Asset) -> Result<Asset, TransformError> {
        let code = print(&asset, true)?;
        Ok(asset.with_contents(code))
    }
}

//! Font conversion.

use crate::command::ExternalCommand;
use crate::traits::{Asset, Transformer, TransformError};

/// Converts TrueType fonts to WOFF2 with an external converter.
///
/// Fonts in other formats pass through. Without a configured converter,
/// TrueType files are copied unchanged.
pub struct Woff2 {
    converter: Option<ExternalCommand>,
}

impl Woff2 {
    pub fn new(converter: Option<ExternalCommand>) -> Self {
        Self { converter }
    }
}

impl Transformer for Woff2 {
    fn name(&self) -> &'static str {
        "woff2"
    }

    fn apply(&self, asset: Asset) -> Result<Asset, TransformError> {
        if asset.extension() != "ttf" {
            return Ok(asset);
        }

        let Some(converter) = &self.converter else {
            tracing::warn!(
                "No font converter configured, copying {} as-is",
                asset.path.display()
            );
            return Ok(asset);
        };

        let converted = converter.transform(&asset, None, "woff2")?;
        Ok(asset.with_contents(converted).with_extension("woff2"))
    }
}

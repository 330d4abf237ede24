//! Image optimization.

use std::sync::LazyLock;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ColorType, ImageEncoder};
use regex::Regex;

use crate::traits::{Asset, Transformer, TransformError};

const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Re-encodes raster images and minifies SVG.
///
/// A re-encoded raster image only replaces the original when it is smaller.
/// Formats without an optimizer (gif, ico, webp, manifests) pass through.
pub struct OptimizeImage {
    jpeg_quality: u8,
}

impl Default for OptimizeImage {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl OptimizeImage {
    pub fn with_jpeg_quality(jpeg_quality: u8) -> Self {
        Self { jpeg_quality }
    }

    fn optimize_jpeg(&self, asset: &Asset) -> Result<Vec<u8>, TransformError> {
        let img = decode(asset)?.to_rgb8();
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, self.jpeg_quality)
            .encode(img.as_raw(), img.width(), img.height(), ColorType::Rgb8)
            .map_err(|e| TransformError::Transform(format!("{}: {}", asset.path.display(), e)))?;
        Ok(out)
    }

    fn optimize_png(&self, asset: &Asset) -> Result<Vec<u8>, TransformError> {
        let img = decode(asset)?;
        let mut out = Vec::new();
        PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive)
            .write_image(img.as_bytes(), img.width(), img.height(), img.color())
            .map_err(|e| TransformError::Transform(format!("{}: {}", asset.path.display(), e)))?;
        Ok(out)
    }
}

fn decode(asset: &Asset) -> Result<image::DynamicImage, TransformError> {
    image::load_from_memory(&asset.contents)
        .map_err(|e| TransformError::Transform(format!("{}: {}", asset.path.display(), e)))
}

impl Transformer for OptimizeImage {
    fn name(&self) -> &'static str {
        "optimize"
    }

    fn apply(&self, asset: Asset) -> Result<Asset, TransformError> {
        let optimized = match asset.extension().as_str() {
            "jpg" | "jpeg" => self.optimize_jpeg(&asset)?,
            "png" => self.optimize_png(&asset)?,
            "svg" => minify_svg(asset.text()?).into_bytes(),
            _ => return Ok(asset),
        };

        if optimized.len() < asset.contents.len() {
            tracing::debug!(
                "Optimized {} ({} -> {} bytes)",
                asset.path.display(),
                asset.contents.len(),
                optimized.len()
            );
            Ok(asset.with_contents(optimized))
        } else {
            Ok(asset)
        }
    }
}

static SVG_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--[\s\S]*?-->").expect("Invalid comment regex"));

static SVG_GAP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("Invalid whitespace regex"));

/// Drop comments and inter-tag whitespace from an SVG document.
pub fn minify_svg(svg: &str) -> String {
    let without_comments = SVG_COMMENT_RE.replace_all(svg, "");
    SVG_GAP_RE
        .replace_all(without_comments.trim(), "><")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn gradient() -> RgbImage {
        RgbImage::from_fn(64, 64, |x, y| Rgb([(x * 4) as u8, (y * 4) as u8, 128]))
    }

    #[test]
    fn recompresses_png_without_growing() {
        let img = gradient();
        let mut original = Vec::new();
        PngEncoder::new_with_quality(&mut original, CompressionType::Fast, FilterType::NoFilter)
            .write_image(img.as_raw(), 64, 64, ColorType::Rgb8)
            .unwrap();

        let out = OptimizeImage::default()
            .apply(Asset::new("logo.png", original.clone()))
            .unwrap();

        assert!(out.contents.len() <= original.len());
        assert!(image::load_from_memory(&out.contents).is_ok());
    }

    #[test]
    fn lowers_jpeg_quality() {
        let img = gradient();
        let mut original = Vec::new();
        JpegEncoder::new_with_quality(&mut original, 100)
            .encode(img.as_raw(), 64, 64, ColorType::Rgb8)
            .unwrap();

        let out = OptimizeImage::default()
            .apply(Asset::new("photo.jpg", original.clone()))
            .unwrap();

        assert!(out.contents.len() < original.len());
    }

    #[test]
    fn minifies_svg() {
        let svg = "<svg>\n  <!-- icon -->\n  <path d=\"M0 0\"/>\n</svg>\n";

        let out = OptimizeImage::default()
            .apply(Asset::new("icon.svg", svg))
            .unwrap();

        assert_eq!(out.text().unwrap(), "<svg><path d=\"M0 0\"/></svg>");
    }

    #[test]
    fn passes_other_formats_through() {
        let asset = Asset::new("site.webmanifest", "{\"name\": \"x\"}");

        let out = OptimizeImage::default().apply(asset.clone()).unwrap();

        assert_eq!(out, asset);
    }

    #[test]
    fn rejects_corrupt_images() {
        let result = OptimizeImage::default().apply(Asset::new("broken.png", b"nope".to_vec()));

        assert!(matches!(result, Err(TransformError::Transform(_))));
    }
}

//! Core types shared by every transformer.

use std::path::{Path, PathBuf};

/// A file flowing through a task's transform chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    /// Path relative to the task's source base (e.g. `main.scss`)
    pub path: PathBuf,

    /// Current file contents
    pub contents: Vec<u8>,
}

impl Asset {
    /// Create an asset from a relative path and its contents.
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    /// View the contents as UTF-8 text.
    pub fn text(&self) -> Result<&str, TransformError> {
        std::str::from_utf8(&self.contents)
            .map_err(|_| TransformError::Encoding(self.path.display().to_string()))
    }

    /// Replace the contents, keeping the path.
    pub fn with_contents(self, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: self.path,
            contents: contents.into(),
        }
    }

    /// Replace the file extension of the path.
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.path.set_extension(extension);
        self
    }

    /// Lowercase extension of the asset path, or an empty string.
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default()
    }
}

/// Errors that can occur while transforming an asset.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("{path}: {message}")]
    Syntax { path: String, message: String },

    #[error("{0} is not valid UTF-8")]
    Encoding(String),

    #[error("Transform error: {0}")]
    Transform(String),

    #[error("Command `{program}` failed: {message}")]
    Command { program: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransformError {
    /// Syntax error located in the given asset.
    pub fn syntax(path: &Path, message: impl ToString) -> Self {
        Self::Syntax {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }
}

/// One step of a transform chain.
pub trait Transformer: Send + Sync {
    /// Short identifier used in logs (e.g. "autoprefix")
    fn name(&self) -> &'static str;

    /// Transform a single asset.
    fn apply(&self, asset: Asset) -> Result<Asset, TransformError>;
}

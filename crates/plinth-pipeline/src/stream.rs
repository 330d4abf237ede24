//! Ordered transformer chains over file streams.
//!
//! A [`Chain`] is built once per task run and applied to every file the
//! task's source pattern selects: `src -> pipe -> pipe -> dest`.

use std::fs;
use std::path::{Path, PathBuf};

use plinth_transform::{Asset, Transformer, TransformError};
use rayon::prelude::*;

/// One step of a chain.
pub enum Step {
    /// Replace the asset with the transformer's output
    Transform(Box<dyn Transformer>),
    /// Write the asset, at its relative path, under a directory
    Write(PathBuf),
    /// Append a suffix to the file stem and replace the extension
    Rename { suffix: String, extension: String },
}

impl Step {
    fn label(&self) -> &'static str {
        match self {
            Step::Transform(t) => t.name(),
            Step::Write(_) => "dest",
            Step::Rename { .. } => "rename",
        }
    }
}

/// Errors from running a chain over one file.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{step} failed: {source}")]
    Transform {
        step: &'static str,
        source: TransformError,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl StreamError {
    /// Whether the failure came from a transformer rather than the file system.
    pub fn is_transform(&self) -> bool {
        matches!(self, StreamError::Transform { .. })
    }
}

/// An ordered list of steps.
#[derive(Default)]
pub struct Chain {
    steps: Vec<Step>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pipe(mut self, transformer: impl Transformer + 'static) -> Self {
        self.steps.push(Step::Transform(Box::new(transformer)));
        self
    }

    pub fn dest(mut self, dir: impl Into<PathBuf>) -> Self {
        self.steps.push(Step::Write(dir.into()));
        self
    }

    pub fn rename(mut self, suffix: &str, extension: &str) -> Self {
        self.steps.push(Step::Rename {
            suffix: suffix.to_string(),
            extension: extension.to_string(),
        });
        self
    }

    pub fn steps(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.steps.iter().map(Step::label)
    }

    /// Run the chain over one asset; returns every path written.
    pub fn run(&self, mut asset: Asset) -> Result<Vec<PathBuf>, StreamError> {
        let mut written = Vec::new();

        for step in &self.steps {
            match step {
                Step::Transform(transformer) => {
                    asset = transformer
                        .apply(asset)
                        .map_err(|source| StreamError::Transform {
                            step: transformer.name(),
                            source,
                        })?;
                }
                Step::Write(dir) => {
                    let target = dir.join(&asset.path);
                    write_file(&target, &asset.contents)?;
                    written.push(target);
                }
                Step::Rename { suffix, extension } => {
                    asset.path = renamed(&asset.path, suffix, extension);
                }
            }
        }

        Ok(written)
    }

    /// Read `file`, relative to `base`, and run the chain over it.
    pub fn run_file(&self, base: &Path, file: &Path) -> Result<Vec<PathBuf>, StreamError> {
        let contents = fs::read(file).map_err(|source| StreamError::Read {
            path: file.to_path_buf(),
            source,
        })?;
        let relative = file.strip_prefix(base).unwrap_or(file);
        self.run(Asset::new(relative, contents))
    }

    /// Run over every file in order, stopping at the first failure.
    pub fn run_all(&self, base: &Path, files: &[PathBuf]) -> Result<Vec<PathBuf>, StreamError> {
        let mut written = Vec::new();
        for file in files {
            written.extend(self.run_file(base, file)?);
        }
        Ok(written)
    }

    /// Run over every file on the rayon pool.
    pub fn run_parallel(&self, base: &Path, files: &[PathBuf]) -> Result<Vec<PathBuf>, StreamError> {
        let results: Vec<Result<Vec<PathBuf>, StreamError>> = files
            .par_iter()
            .map(|file| self.run_file(base, file))
            .collect();

        let mut written = Vec::new();
        for result in results {
            written.extend(result?);
        }
        Ok(written)
    }
}

fn renamed(path: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}{}.{}", stem, suffix, extension))
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), StreamError> {
    let write = || -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)
    };
    write().map_err(|source| StreamError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl Transformer for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }

        fn apply(&self, asset: Asset) -> Result<Asset, TransformError> {
            let upper = asset.text()?.to_uppercase();
            Ok(asset.with_contents(upper))
        }
    }

    struct Fail;

    impl Transformer for Fail {
        fn name(&self) -> &'static str {
            "fail"
        }

        fn apply(&self, asset: Asset) -> Result<Asset, TransformError> {
            Err(TransformError::syntax(&asset.path, "broken"))
        }
    }

    #[test]
    fn writes_at_each_destination() {
        let temp = tempfile::tempdir().unwrap();
        let full = temp.path().join("full");
        let min = temp.path().join("min");

        let chain = Chain::new()
            .dest(&full)
            .pipe(Upper)
            .rename(".min", "css")
            .dest(&min);
        let written = chain
            .run(Asset::new("sub/style.css", b"a{}".to_vec()))
            .unwrap();

        assert_eq!(written, vec![full.join("sub/style.css"), min.join("sub/style.min.css")]);
        assert_eq!(fs::read_to_string(full.join("sub/style.css")).unwrap(), "a{}");
        assert_eq!(fs::read_to_string(min.join("sub/style.min.css")).unwrap(), "A{}");
    }

    #[test]
    fn stops_before_writing_on_transform_failure() {
        let temp = tempfile::tempdir().unwrap();
        let out = temp.path().join("out");

        let err = Chain::new()
            .pipe(Fail)
            .dest(&out)
            .run(Asset::new("a.js", b"x".to_vec()))
            .unwrap_err();

        assert!(err.is_transform());
        assert!(!out.exists());
    }

    #[test]
    fn reads_files_relative_to_base() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("src");
        let out = temp.path().join("out");
        fs::create_dir_all(src.join("icons")).unwrap();
        fs::write(src.join("icons/a.svg"), "a").unwrap();
        fs::write(src.join("b.svg"), "b").unwrap();

        let files = vec![src.join("icons/a.svg"), src.join("b.svg")];
        let written = Chain::new().pipe(Upper).dest(&out).run_parallel(&src, &files).unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(fs::read_to_string(out.join("icons/a.svg")).unwrap(), "A");
        assert_eq!(fs::read_to_string(out.join("b.svg")).unwrap(), "B");
    }

    #[test]
    fn reports_missing_inputs() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("gone.js");

        let err = Chain::new()
            .run_all(temp.path(), &[missing])
            .unwrap_err();

        assert!(matches!(err, StreamError::Read { .. }));
    }

    #[test]
    fn lists_step_labels() {
        let chain = Chain::new().pipe(Upper).rename(".min", "js").dest("out");

        assert_eq!(chain.steps().collect::<Vec<_>>(), vec!["upper", "rename", "dest"]);
    }
}

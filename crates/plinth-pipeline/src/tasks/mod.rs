//! Leaf task implementations.
//!
//! Each task builds a fresh [`Chain`] from the current config and runs it
//! over the files its source pattern selects. Tasks are synchronous; the
//! runner moves them onto blocking threads.

pub mod clean;
pub mod critical;
pub mod css;
pub mod fonts;
pub mod grid;
pub mod html;
pub mod images;
pub mod js;

use std::path::PathBuf;
use std::sync::Arc;

use plinth_transform::TransformError;

use crate::config::{Config, ConfigError};
use crate::notify::{Notification, Notifier, ReloadSink};
use crate::paths::{AssetKind, PathTable};
use crate::stream::{Chain, StreamError};

/// Which chain variant a task runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    /// Full optimizing chains
    #[default]
    Release,
    /// Short chains used by watch reruns
    Dev,
}

/// How a task run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed { files: usize },
    /// A transformer failed, was reported, and the stream was ended early
    Recovered,
}

/// Errors that end a task run.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("{task}: {source}")]
    Transform {
        task: &'static str,
        source: TransformError,
    },

    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Task {0} panicked or was cancelled")]
    Join(String),

    #[error("{0} service failed: {1}")]
    Service(&'static str, String),
}

/// Everything a task run needs.
#[derive(Clone)]
pub struct TaskContext {
    pub config: Arc<Config>,
    pub paths: Arc<PathTable>,
    pub notifier: Arc<dyn Notifier>,
    pub reload: Arc<dyn ReloadSink>,
}

impl TaskContext {
    pub fn new(
        config: Config,
        notifier: Arc<dyn Notifier>,
        reload: Arc<dyn ReloadSink>,
    ) -> Result<Self, ConfigError> {
        let paths = PathTable::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            paths: Arc::new(paths),
            notifier,
            reload,
        })
    }

    /// Run `chain` over the kind's source files in order.
    ///
    /// With `recover_as`, a transformer failure is reported under that
    /// title and ends the stream without failing the task.
    fn stream(
        &self,
        kind: AssetKind,
        chain: &Chain,
        recover_as: Option<&str>,
    ) -> Result<TaskOutcome, TaskError> {
        let pattern = self.paths.source(kind);
        let files = pattern.discover();
        tracing::debug!("{}: {} file(s) match {}", kind, files.len(), pattern);

        match (chain.run_all(&pattern.base, &files), recover_as) {
            (Ok(_), _) => Ok(TaskOutcome::Completed { files: files.len() }),
            (Err(StreamError::Transform { source, .. }), Some(title)) => {
                self.notifier
                    .notify(&Notification::new(title, source.to_string()));
                Ok(TaskOutcome::Recovered)
            }
            (Err(e), _) => Err(e.into()),
        }
    }

    /// Run `chain` over the kind's source files on the rayon pool.
    fn stream_parallel(&self, kind: AssetKind, chain: &Chain) -> Result<TaskOutcome, TaskError> {
        let pattern = self.paths.source(kind);
        let files = pattern.discover();
        tracing::debug!("{}: {} file(s) match {}", kind, files.len(), pattern);

        chain.run_parallel(&pattern.base, &files)?;
        Ok(TaskOutcome::Completed { files: files.len() })
    }
}

#[cfg(test)]
pub(crate) mod fixture {
    use std::fs;
    use std::path::Path;

    use super::*;
    use crate::notify::testing::Recorder;

    /// A temporary project rooted in its own directory.
    pub struct Project {
        pub dir: tempfile::TempDir,
        pub recorder: Arc<Recorder>,
    }

    impl Project {
        pub fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
                recorder: Arc::new(Recorder::default()),
            }
        }

        pub fn root(&self) -> &Path {
            self.dir.path()
        }

        pub fn write(&self, relative: &str, contents: &str) {
            let path = self.root().join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }

        pub fn read(&self, relative: &str) -> String {
            fs::read_to_string(self.root().join(relative)).unwrap()
        }

        pub fn exists(&self, relative: &str) -> bool {
            self.root().join(relative).exists()
        }

        pub fn context(&self) -> TaskContext {
            self.context_with(Config::default())
        }

        pub fn context_with(&self, config: Config) -> TaskContext {
            TaskContext::new(
                config.with_root(self.root()),
                self.recorder.clone(),
                self.recorder.clone(),
            )
            .unwrap()
        }
    }
}

//! Build pipeline for plinth.
//!
//! Turns a [`Config`] into a [`PathTable`], builds per-task transformer
//! chains and runs named tasks or composed pipelines through a [`Runner`].
//!
//! # Example
//!
//! ```ignore
//! use plinth_pipeline::{Config, LogNotifier, NoReload, Runner, TaskContext, TaskId};
//! use std::sync::Arc;
//!
//! let ctx = TaskContext::new(Config::default(), Arc::new(LogNotifier), Arc::new(NoReload))?;
//! Runner::new(ctx).run(TaskId::Build).await?;
//! ```

pub mod config;
pub mod notify;
pub mod paths;
pub mod registry;
pub mod runner;
pub mod stream;
pub mod tasks;

pub use config::{Config, ConfigError};
pub use notify::{LogNotifier, NoReload, Notification, Notifier, NotifierSet, ReloadSink};
pub use paths::{AssetKind, AssetPattern, PathTable};
pub use registry::{Pipeline, TaskId, UnknownTask};
pub use runner::{LogObserver, Phase, Runner, Services, TaskEvent, TaskObserver};
pub use stream::{Chain, Step, StreamError};
pub use tasks::{Profile, TaskContext, TaskError, TaskOutcome};

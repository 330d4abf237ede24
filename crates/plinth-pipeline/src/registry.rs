//! Named tasks and the pipelines they expand to.

use std::fmt;
use std::str::FromStr;

use crate::paths::AssetKind;
use crate::tasks::{self, Profile, TaskContext, TaskError, TaskOutcome};

/// Every runnable task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskId {
    Html,
    Css,
    Js,
    Images,
    Fonts,
    Clean,
    Grid,
    Critical,
    Build,
    Watch,
}

impl TaskId {
    pub const ALL: [TaskId; 10] = [
        TaskId::Html,
        TaskId::Css,
        TaskId::Js,
        TaskId::Images,
        TaskId::Fonts,
        TaskId::Clean,
        TaskId::Grid,
        TaskId::Critical,
        TaskId::Build,
        TaskId::Watch,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TaskId::Html => "html",
            TaskId::Css => "css",
            TaskId::Js => "js",
            TaskId::Images => "images",
            TaskId::Fonts => "fonts",
            TaskId::Clean => "clean",
            TaskId::Grid => "grid",
            TaskId::Critical => "critical",
            TaskId::Build => "build",
            TaskId::Watch => "watch",
        }
    }

    /// The task that rebuilds one asset kind.
    pub fn for_kind(kind: AssetKind) -> Self {
        match kind {
            AssetKind::Html => TaskId::Html,
            AssetKind::Css => TaskId::Css,
            AssetKind::Js => TaskId::Js,
            AssetKind::Images => TaskId::Images,
            AssetKind::Fonts => TaskId::Fonts,
        }
    }

    /// Whether this task writes assets a browser should reload.
    pub fn reloads(&self) -> bool {
        matches!(
            self,
            TaskId::Html | TaskId::Css | TaskId::Js | TaskId::Images | TaskId::Fonts
        )
    }

    pub fn pipeline(&self) -> Pipeline {
        match self {
            TaskId::Build => Pipeline::Series(vec![
                Pipeline::Task(TaskId::Clean),
                Pipeline::Parallel(
                    AssetKind::ALL
                        .iter()
                        .map(|kind| Pipeline::Task(TaskId::for_kind(*kind)))
                        .collect(),
                ),
                Pipeline::Task(TaskId::Critical),
            ]),
            TaskId::Watch => Pipeline::Parallel(vec![
                Pipeline::Logged(Box::new(TaskId::Build.pipeline())),
                Pipeline::WatchFiles,
                Pipeline::Serve,
            ]),
            leaf => Pipeline::Task(*leaf),
        }
    }

    /// Run a leaf task synchronously.
    pub(crate) fn run_leaf(&self, ctx: &TaskContext, profile: Profile) -> Result<TaskOutcome, TaskError> {
        match self {
            TaskId::Html => tasks::html::run(ctx, profile),
            TaskId::Css => tasks::css::run(ctx, profile),
            TaskId::Js => tasks::js::run(ctx, profile),
            TaskId::Images => tasks::images::run(ctx, profile),
            TaskId::Fonts => tasks::fonts::run(ctx, profile),
            TaskId::Clean => tasks::clean::run(ctx, profile),
            TaskId::Grid => tasks::grid::run(ctx, profile),
            TaskId::Critical => tasks::critical::run(ctx, profile),
            TaskId::Build | TaskId::Watch => Err(TaskError::Service(
                "registry",
                format!("{} is a composite task", self),
            )),
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown task `{0}`")]
pub struct UnknownTask(pub String);

impl FromStr for TaskId {
    type Err = UnknownTask;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskId::ALL
            .into_iter()
            .find(|id| id.name() == s)
            .ok_or_else(|| UnknownTask(s.to_string()))
    }
}

/// A composition of tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pipeline {
    Task(TaskId),
    /// Children run one after another
    Series(Vec<Pipeline>),
    /// Children run concurrently; the first failure ends the group
    Parallel(Vec<Pipeline>),
    /// A failure is logged and does not reach the enclosing group
    Logged(Box<Pipeline>),
    /// Long-running source watcher
    WatchFiles,
    /// Long-running dev server
    Serve,
}

impl Pipeline {
    /// Leaf tasks in declaration order.
    pub fn tasks(&self) -> Vec<TaskId> {
        match self {
            Pipeline::Task(id) => vec![*id],
            Pipeline::Series(children) | Pipeline::Parallel(children) => {
                children.iter().flat_map(Pipeline::tasks).collect()
            }
            Pipeline::Logged(inner) => inner.tasks(),
            Pipeline::WatchFiles | Pipeline::Serve => Vec::new(),
        }
    }
}

//! Executes pipelines on the tokio runtime.

use std::sync::Arc;
use std::time::Instant;

use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;

use crate::registry::{Pipeline, TaskId};
use crate::tasks::{Profile, TaskContext, TaskError, TaskOutcome};

/// Long-running services a pipeline may start.
pub trait Services: Send + Sync {
    /// Watch sources and rerun tasks through `runner` until shutdown.
    fn watch_files(&self, runner: Runner) -> BoxFuture<'static, Result<(), TaskError>>;

    /// Serve the dist root until shutdown.
    fn serve(&self) -> BoxFuture<'static, Result<(), TaskError>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Started,
    Finished,
    Failed,
}

/// A task lifecycle event.
#[derive(Debug, Clone, Copy)]
pub struct TaskEvent {
    pub task: TaskId,
    pub phase: Phase,
    pub at: Instant,
}

/// Receives task lifecycle events.
pub trait TaskObserver: Send + Sync {
    fn on_event(&self, event: &TaskEvent);
}

/// Logs task starts and finishes.
#[derive(Debug, Default)]
pub struct LogObserver {
    started: std::sync::Mutex<Vec<(TaskId, Instant)>>,
}

impl TaskObserver for LogObserver {
    fn on_event(&self, event: &TaskEvent) {
        let Ok(mut started) = self.started.lock() else {
            return;
        };
        match event.phase {
            Phase::Started => {
                tracing::info!("Starting '{}'...", event.task);
                started.push((event.task, event.at));
            }
            Phase::Finished | Phase::Failed => {
                let elapsed = started
                    .iter()
                    .rposition(|(task, _)| *task == event.task)
                    .map(|i| started.remove(i).1)
                    .map(|at| event.at.duration_since(at));
                match (event.phase, elapsed) {
                    (Phase::Finished, Some(elapsed)) => {
                        tracing::info!("Finished '{}' after {:?}", event.task, elapsed)
                    }
                    (Phase::Finished, None) => tracing::info!("Finished '{}'", event.task),
                    _ => tracing::error!("'{}' errored", event.task),
                }
            }
        }
    }
}

/// Runs tasks and pipelines against one context.
#[derive(Clone)]
pub struct Runner {
    ctx: Arc<TaskContext>,
    services: Option<Arc<dyn Services>>,
    observer: Arc<dyn TaskObserver>,
}

impl Runner {
    pub fn new(ctx: TaskContext) -> Self {
        Self {
            ctx: Arc::new(ctx),
            services: None,
            observer: Arc::new(LogObserver::default()),
        }
    }

    pub fn with_services(mut self, services: Arc<dyn Services>) -> Self {
        self.services = Some(services);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn TaskObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn context(&self) -> &TaskContext {
        &self.ctx
    }

    /// Run a named task with release chains.
    pub async fn run(&self, id: TaskId) -> Result<(), TaskError> {
        self.execute(&id.pipeline(), Profile::Release).await
    }

    /// Run one leaf task on a blocking thread.
    ///
    /// Reload listeners are signalled when an asset task completes.
    pub async fn run_task(&self, id: TaskId, profile: Profile) -> Result<TaskOutcome, TaskError> {
        self.emit(id, Phase::Started);

        let ctx = self.ctx.clone();
        let result = tokio::task::spawn_blocking(move || id.run_leaf(&ctx, profile))
            .await
            .unwrap_or_else(|e| Err(TaskError::Join(format!("{}: {}", id, e))));

        match &result {
            Ok(outcome) => {
                self.emit(id, Phase::Finished);
                if id.reloads() && matches!(outcome, TaskOutcome::Completed { .. }) {
                    self.ctx.reload.reload(id.name());
                }
            }
            Err(e) => {
                tracing::error!("{}: {}", id, e);
                self.emit(id, Phase::Failed);
            }
        }
        result
    }

    /// Execute a pipeline: series in order, parallel groups joined.
    pub fn execute<'a>(&'a self, pipeline: &'a Pipeline, profile: Profile) -> BoxFuture<'a, Result<(), TaskError>> {
        async move {
            match pipeline {
                Pipeline::Task(id) => self.run_task(*id, profile).await.map(|_| ()),
                Pipeline::Series(children) => {
                    for child in children {
                        self.execute(child, profile).await?;
                    }
                    Ok(())
                }
                Pipeline::Parallel(children) => {
                    try_join_all(children.iter().map(|child| self.execute(child, profile)))
                        .await
                        .map(|_| ())
                }
                Pipeline::Logged(inner) => {
                    if let Err(e) = self.execute(inner, profile).await {
                        tracing::warn!("Continuing after failure: {}", e);
                    }
                    Ok(())
                }
                Pipeline::WatchFiles => match &self.services {
                    Some(services) => services.watch_files(self.clone()).await,
                    None => Err(TaskError::Service("watch", "no watcher attached".to_string())),
                },
                Pipeline::Serve => match &self.services {
                    Some(services) => services.serve().await,
                    None => Err(TaskError::Service("serve", "no server attached".to_string())),
                },
            }
        }
        .boxed()
    }

    fn emit(&self, task: TaskId, phase: Phase) {
        self.observer.on_event(&TaskEvent {
            task,
            phase,
            at: Instant::now(),
        });
    }
}

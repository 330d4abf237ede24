//! Reruns tasks when their sources change.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use notify::RecursiveMode;
use plinth_pipeline::{Profile, Runner, TaskId};
use tokio::task::JoinHandle;

use crate::server::ServerError;
use crate::watcher::FileWatcher;

/// Quiet period before a changed task reruns.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Runs one task to completion.
pub type TaskFn = Arc<dyn Fn(TaskId) -> BoxFuture<'static, ()> + Send + Sync>;

struct Slot {
    generation: AtomicU64,
    lock: tokio::sync::Mutex<()>,
}

/// Debounces triggers per task and serializes runs of the same task.
///
/// Different tasks run concurrently.
#[derive(Clone)]
pub struct TaskScheduler {
    debounce: Duration,
    slots: Arc<Mutex<HashMap<TaskId, Arc<Slot>>>>,
    run: TaskFn,
}

impl TaskScheduler {
    pub fn new(debounce: Duration, run: TaskFn) -> Self {
        Self {
            debounce,
            slots: Arc::new(Mutex::new(HashMap::new())),
            run,
        }
    }

    /// Trigger `id`; only the last trigger of a burst runs.
    pub fn schedule(&self, id: TaskId) -> JoinHandle<()> {
        let slot = self.slot(id);
        let generation = slot.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let run = self.run.clone();
        let debounce = self.debounce;

        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if slot.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            let _running = slot.lock.lock().await;
            run(id).await;
        })
    }

    fn slot(&self, id: TaskId) -> Arc<Slot> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots
            .entry(id)
            .or_insert_with(|| {
                Arc::new(Slot {
                    generation: AtomicU64::new(0),
                    lock: tokio::sync::Mutex::new(()),
                })
            })
            .clone()
    }
}

/// Maps source changes to dev-profile task reruns.
pub struct WatchOrchestrator {
    runner: Runner,
    debounce: Duration,
}

impl WatchOrchestrator {
    pub fn new(runner: Runner) -> Self {
        Self {
            runner,
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// The source root, recursively, and the directory holding the grid config.
    pub fn watch_paths(&self) -> Vec<(PathBuf, RecursiveMode)> {
        let paths = &self.runner.context().paths;
        let grid_dir = paths
            .grid_config()
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        vec![
            (paths.src().to_path_buf(), RecursiveMode::Recursive),
            (grid_dir.to_path_buf(), RecursiveMode::NonRecursive),
        ]
    }

    /// Tasks to rerun for a changed path.
    pub fn route(&self, path: &Path) -> Vec<TaskId> {
        let paths = &self.runner.context().paths;
        if path == paths.grid_config() {
            return vec![TaskId::Grid];
        }
        paths
            .kinds_for(path)
            .into_iter()
            .map(TaskId::for_kind)
            .collect()
    }

    /// Watch until the event channel closes.
    pub async fn run(self) -> Result<(), ServerError> {
        let (watcher, mut rx) = FileWatcher::new(&self.watch_paths())
            .map_err(|e| ServerError::WatchError(e.to_string()))?;

        let runner = self.runner.clone();
        let scheduler = TaskScheduler::new(
            self.debounce,
            Arc::new(move |id| {
                let runner = runner.clone();
                async move {
                    // The runner logs failures; watching carries on.
                    let _ = runner.run_task(id, Profile::Dev).await;
                }
                .boxed()
            }),
        );

        tracing::info!(
            "Watching {} for changes",
            self.runner.context().paths.src().display()
        );

        while let Some(event) = rx.recv().await {
            for id in self.route(event.path()) {
                tracing::debug!("{} changed, rerunning '{}'", event.path().display(), id);
                scheduler.schedule(id);
            }
        }

        drop(watcher);
        Ok(())
    }
}

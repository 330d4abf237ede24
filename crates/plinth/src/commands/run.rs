//! Task execution command.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use plinth_pipeline::{LogNotifier, NotifierSet, Runner, TaskContext, TaskId};
use plinth_server::{DevServerConfig, DevServices, LiveReloadHub};

use super::load_config;

/// Command-line overrides for the `[server]` section.
#[derive(Debug, Default, Clone, Copy)]
pub struct ServerOverrides {
    pub port: Option<u16>,
    pub open: Option<bool>,
}

/// Run a named task or pipeline.
pub async fn run(config_path: &Path, task: TaskId, overrides: ServerOverrides) -> Result<()> {
    let config = load_config(config_path)?;

    let hub = LiveReloadHub::new();
    let notifier = NotifierSet::new()
        .with(Arc::new(LogNotifier))
        .with(Arc::new(hub.clone()));
    let ctx = TaskContext::new(config, Arc::new(notifier), Arc::new(hub.clone()))
        .context("Invalid path configuration")?;

    let mut server = DevServerConfig::from_config(&ctx.config);
    server.port = overrides.port.unwrap_or(server.port);
    server.open = overrides.open.unwrap_or(server.open);

    let runner = Runner::new(ctx).with_services(Arc::new(DevServices::new(hub, server)));

    let started = Instant::now();
    runner
        .run(task)
        .await
        .with_context(|| format!("Task '{}' failed", task))?;

    tracing::info!("Done '{}' in {}ms", task, started.elapsed().as_millis());
    Ok(())
}

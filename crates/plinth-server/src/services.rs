//! The watch and serve services behind `plinth watch`.

use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use plinth_pipeline::{Runner, Services, TaskError};

use crate::livereload::LiveReloadHub;
use crate::orchestrator::{WatchOrchestrator, DEFAULT_DEBOUNCE};
use crate::server::{DevServer, DevServerConfig};

/// Dev server plus source watcher sharing one live reload hub.
pub struct DevServices {
    hub: LiveReloadHub,
    server: DevServerConfig,
    debounce: Duration,
}

impl DevServices {
    pub fn new(hub: LiveReloadHub, server: DevServerConfig) -> Self {
        Self {
            hub,
            server,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl Services for DevServices {
    fn watch_files(&self, runner: Runner) -> BoxFuture<'static, Result<(), TaskError>> {
        WatchOrchestrator::new(runner)
            .with_debounce(self.debounce)
            .run()
            .map(|result| result.map_err(|e| TaskError::Service("watch", e.to_string())))
            .boxed()
    }

    fn serve(&self) -> BoxFuture<'static, Result<(), TaskError>> {
        DevServer::new(self.server.clone(), self.hub.clone())
            .start()
            .map(|result| result.map_err(|e| TaskError::Service("serve", e.to_string())))
            .boxed()
    }
}

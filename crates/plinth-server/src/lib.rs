//! Development server, source watcher and live reload for plinth.
//!
//! Serves the dist root, injects a live reload client into every page and
//! reruns dev-profile tasks when sources change.

pub mod livereload;
pub mod orchestrator;
pub mod server;
pub mod services;
pub mod watcher;

pub use livereload::{LiveReloadHub, LiveReloadMessage};
pub use orchestrator::{TaskScheduler, WatchOrchestrator};
pub use server::{DevServer, DevServerConfig, ServerError};
pub use services::DevServices;
pub use watcher::{FileWatcher, WatchEvent};

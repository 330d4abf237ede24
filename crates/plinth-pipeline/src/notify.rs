//! Error notifications and post-task reload signals.

use std::sync::Arc;

use serde::Serialize;

/// A recoverable error surfaced to the developer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Receives notifications for recovered task failures.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) {
        tracing::error!("{}: {}", notification.title, notification.message);
    }
}

/// Forwards every notification to several notifiers.
#[derive(Default, Clone)]
pub struct NotifierSet {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl NotifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }
}

impl Notifier for NotifierSet {
    fn notify(&self, notification: &Notification) {
        for notifier in &self.notifiers {
            notifier.notify(notification);
        }
    }
}

/// Hook invoked after an asset task completes successfully.
pub trait ReloadSink: Send + Sync {
    fn reload(&self, task: &str);
}

/// Reload sink for one-shot builds with no browser attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoReload;

impl ReloadSink for NoReload {
    fn reload(&self, task: &str) {
        tracing::trace!("No live reload attached, skipping reload after {}", task);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct Recorder {
        pub notifications: Mutex<Vec<Notification>>,
        pub reloads: Mutex<Vec<String>>,
    }

    impl Recorder {
        pub fn notifications(&self) -> Vec<Notification> {
            self.notifications.lock().unwrap().clone()
        }

        pub fn reloads(&self) -> Vec<String> {
            self.reloads.lock().unwrap().clone()
        }
    }

    impl Notifier for Recorder {
        fn notify(&self, notification: &Notification) {
            self.notifications.lock().unwrap().push(notification.clone());
        }
    }

    impl ReloadSink for Recorder {
        fn reload(&self, task: &str) {
            self.reloads.lock().unwrap().push(task.to_string());
        }
    }
}

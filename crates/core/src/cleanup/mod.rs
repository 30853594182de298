//! Deferred, best-effort removal of delivered artifacts.
//!
//! After an archive is delivered, the chat message carrying it and the
//! local file are deleted once a delay elapses. Failures are logged at
//! debug level and otherwise ignored.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;

use crate::metrics;
use crate::source::{MessageRef, Messenger};

/// Configuration for deferred cleanup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Seconds between delivery and deletion.
    #[serde(default = "default_delete_delay")]
    pub delete_delay_secs: u64,
}

fn default_delete_delay() -> u64 {
    180
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            delete_delay_secs: default_delete_delay(),
        }
    }
}

impl CleanupConfig {
    pub fn delete_delay(&self) -> Duration {
        Duration::from_secs(self.delete_delay_secs)
    }
}

/// What to delete when the timer fires.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupTarget {
    pub message: Option<MessageRef>,
    pub file: Option<PathBuf>,
}

impl CleanupTarget {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            message: None,
            file: Some(path.into()),
        }
    }

    pub fn message_and_file(message: MessageRef, path: impl Into<PathBuf>) -> Self {
        Self {
            message: Some(message),
            file: Some(path.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.message.is_none() && self.file.is_none()
    }
}

/// Owns the timers of all pending cleanups.
#[derive(Clone)]
pub struct CleanupScheduler {
    messenger: Option<Arc<dyn Messenger>>,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl CleanupScheduler {
    /// Creates a scheduler. Without a messenger only files are deleted.
    pub fn new(messenger: Option<Arc<dyn Messenger>>) -> Self {
        Self {
            messenger,
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Schedules deletion of `target` after `delay`.
    ///
    /// Returns `false` if the scheduler is already shutting down.
    pub fn schedule(&self, target: CleanupTarget, delay: Duration) -> bool {
        if self.cancel.is_cancelled() || target.is_empty() {
            return false;
        }

        let cancel = self.cancel.clone();
        let messenger = self.messenger.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(?target, "Cleanup cancelled");
                    metrics::CLEANUPS_CANCELLED.inc();
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
            run_cleanup(messenger.as_deref(), &target).await;
            metrics::CLEANUPS_COMPLETED.inc();
        });
        true
    }

    /// Cleanups scheduled and not yet finished.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Cancels pending timers and waits for running deletions.
    ///
    /// Cleanups whose delay has not elapsed are skipped.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

async fn run_cleanup(messenger: Option<&dyn Messenger>, target: &CleanupTarget) {
    if let Some(message) = &target.message {
        match messenger {
            Some(m) => {
                if let Err(e) = m.delete_message(message).await {
                    debug!(?message, error = %e, "Failed to delete message");
                }
            }
            None => debug!(?message, "No messenger configured, message left in place"),
        }
    }

    if let Some(path) = &target.file {
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!(path = %path.display(), "Removed delivered file"),
            Err(e) => debug!(path = %path.display(), error = %e, "Failed to remove file"),
        }
    }
}

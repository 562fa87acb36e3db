//! Parent-process liveness monitoring.

use std::time::Duration;

use tracing::{error, info};

use crate::config::LivenessConfig;

/// Watches the parent process id and terminates when it changes.
///
/// The bridge is meant to run as a child of a supervising process. Once
/// that supervisor goes away the bridge is orphaned and gets re-parented,
/// which is treated as unrecoverable: the watcher calls
/// [`std::process::exit`] directly, so no shutdown or cleanup runs.
/// Detection is polling-based and can lag the orphaning by up to one
/// interval.
pub struct ParentWatch {
    parent: u32,
    interval: Duration,
    exit_code: i32,
}

impl ParentWatch {
    /// Capture the current parent process id.
    pub fn new(config: &LivenessConfig) -> Self {
        Self {
            parent: current_parent(),
            interval: Duration::from_millis(config.interval_ms),
            exit_code: config.exit_code,
        }
    }

    /// Check whether the parent process id changed since construction.
    fn parent_changed(&self) -> bool {
        current_parent() != self.parent
    }

    /// Poll until the parent changes, then exit the process.
    pub async fn watch(self) {
        info!(
            "Watching parent process {} every {}ms",
            self.parent,
            self.interval.as_millis()
        );

        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;
            if self.parent_changed() {
                error!(
                    "Parent process changed (was {}, now {}), exiting",
                    self.parent,
                    current_parent()
                );
                std::process::exit(self.exit_code);
            }
        }
    }
}

/// The operating-system parent process id.
#[cfg(unix)]
fn current_parent() -> u32 {
    std::os::unix::process::parent_id()
}

/// Parent tracking is unavailable off Unix; report a constant so the
/// watcher never fires.
#[cfg(not(unix))]
fn current_parent() -> u32 {
    0
}

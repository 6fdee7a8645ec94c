//! Waiting for the user to grant accessibility access

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOutcome {
    Granted,
    TimedOut,
    Cancelled,
}

/// A background task polling a trust check until it passes, the timeout
/// elapses, or the watch is cancelled.
#[derive(Debug)]
pub struct PermissionWatch {
    stop: Arc<Notify>,
    task: JoinHandle<PermissionOutcome>,
}

impl PermissionWatch {
    /// Spawns the poller on the current tokio runtime. `check` runs once
    /// immediately and then every `interval`.
    pub fn spawn<F, Fut>(mut check: F, interval: Duration, timeout: Duration) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let stop = Arc::new(Notify::new());
        let stopped = stop.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let deadline = tokio::time::sleep(timeout);
            tokio::pin!(deadline);

            loop {
                tokio::select! {
                    _ = stopped.notified() => {
                        debug!("permission watch cancelled");
                        return PermissionOutcome::Cancelled;
                    }
                    _ = &mut deadline => {
                        info!("gave up waiting for accessibility permission after {:?}", timeout);
                        return PermissionOutcome::TimedOut;
                    }
                    _ = ticker.tick() => {
                        if check().await {
                            info!("accessibility permission granted");
                            return PermissionOutcome::Granted;
                        }
                    }
                }
            }
        });
        Self { stop, task }
    }

    /// Stops polling. The outcome becomes [`PermissionOutcome::Cancelled`]
    /// unless the task already finished.
    pub fn cancel(&self) {
        self.stop.notify_one();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn outcome(self) -> PermissionOutcome {
        self.task.await.unwrap_or(PermissionOutcome::Cancelled)
    }
}

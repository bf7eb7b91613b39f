//! Background expiry sweeping for the session index.
//!
//! A single scheduled task evicts expired entries on a fixed interval. Ticks
//! cannot overlap (one task, one loop) and never report errors upward; a
//! tick that finds nothing does nothing.

use crate::session::SessionIndex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Spawns the recurring expiry sweep.
pub struct Sweeper;

impl Sweeper {
    /// Starts sweeping `index` every `every`, returning a handle that owns
    /// the task.
    pub fn spawn(index: Arc<RwLock<SessionIndex>>, every: Duration) -> SweeperHandle {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let now = chrono::Utc::now().timestamp();
                let removed = index.write().await.evict_expired(now);
                if removed > 0 {
                    debug!(removed, "swept expired sessions");
                }
            }
        });
        SweeperHandle { task }
    }
}

/// Owns the sweep task for the process lifetime.
pub struct SweeperHandle {
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Returns true while the sweep task is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops the sweeper and waits for the task to wind down.
    pub async fn shutdown(self) {
        self.task.abort();
        let _ = self.task.await;
    }
}

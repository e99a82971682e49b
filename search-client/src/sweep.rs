//! Background expiry sweep
//!
//! A single tokio task that periodically asks every registered cache to drop
//! its expired entries. The task lives until [`SweepHandle::stop`] is called
//! or the handle is dropped.

use crate::cache::Sweep;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Handle for controlling the background sweep task
pub struct SweepHandle {
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Spawns the sweep task on the current tokio runtime
    ///
    /// The first sweep runs immediately, then once every `interval`.
    pub fn spawn(caches: Vec<Arc<dyn Sweep>>, interval: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let interval = interval.max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            log::info!("Cache sweep started, running every {:?}", interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed: usize = caches.iter().map(|cache| cache.sweep()).sum();
                        if removed > 0 {
                            log::info!("Cache sweep removed {} expired entries", removed);
                        }
                    }
                    _ = &mut shutdown_rx => {
                        break;
                    }
                }
            }

            log::info!("Cache sweep stopped");
        });

        Self { shutdown_tx, task }
    }

    /// Stops the sweep and waits for the task to exit
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(err) = self.task.await {
            log::warn!("Cache sweep task ended abnormally: {}", err);
        }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

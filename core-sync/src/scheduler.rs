//! Periodic background synchronization.
//!
//! A started scheduler owns one spawned task driven by a [`tokio::time`]
//! interval. The first sync fires one full interval after start, never
//! immediately. Stopping cancels the timer through a [`CancellationToken`];
//! a sync cycle already in flight always runs to completion because the
//! token is only checked between ticks.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::SyncOptions;
use crate::manager::SyncManager;

/// Drives periodic calls to [`SyncManager::sync`] on a fixed interval.
#[derive(Default)]
pub struct AutoSyncScheduler {
    running: Option<ScheduleHandle>,
}

struct ScheduleHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl AutoSyncScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a timer task is currently active.
    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .map(|handle| !handle.task.is_finished())
            .unwrap_or(false)
    }

    /// Start the periodic timer, replacing any running one.
    ///
    /// Ticks that land while a sync is still in flight are absorbed by the
    /// manager's reentrancy guard.
    pub fn start(&mut self, interval: Duration, manager: Arc<SyncManager>) {
        self.stop();

        let token = CancellationToken::new();
        let tick_token = token.clone();
        debug!(?interval, "starting auto-sync timer");

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval completes immediately;
            // consume it so the first sync waits a full interval.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = tick_token.cancelled() => break,
                    _ = ticker.tick() => {
                        match manager.sync(SyncOptions::default()).await {
                            Ok(report) if report.in_progress => {
                                debug!("auto-sync tick skipped, sync already running");
                            }
                            Ok(report) => {
                                debug!(
                                    synchronized = report.synchronized,
                                    conflicts = report.conflicts,
                                    errors = report.errors,
                                    "auto-sync tick completed"
                                );
                            }
                            Err(e) => warn!("auto-sync tick failed: {}", e),
                        }
                    }
                }
            }
            debug!("auto-sync timer stopped");
        });

        self.running = Some(ScheduleHandle { token, task });
    }

    /// Cancel the timer task. No-op when not running.
    pub fn stop(&mut self) {
        if let Some(handle) = self.running.take() {
            handle.token.cancel();
        }
    }
}

impl Drop for AutoSyncScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for AutoSyncScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoSyncScheduler")
            .field("running", &self.is_running())
            .finish()
    }
}

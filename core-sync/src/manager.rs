//! # Sync Manager
//!
//! Orchestrates reconciliation between the local and cloud stores.
//!
//! ## Workflow
//!
//! 1. Check preconditions (online, authenticated) and the reentrancy guard
//! 2. Enumerate keys from both adapters and take the union
//! 3. Per key, sequentially: read both sides, copy one-sided values,
//!    skip identical values, hand divergent values to the resolver
//! 4. Update `last_sync_time`, persist state, emit `Completed`
//!
//! One cycle moves through `Idle -> InProgress -> {Completed, Failed} -> Idle`;
//! `in_progress` under the state lock is the sole mutual-exclusion mechanism.
//! It is process-local: it prevents overlapping cycles within one instance
//! but gives no cross-instance or cross-tab guarantee. That is a known
//! limitation of the design, not something this module tries to paper over.
//!
//! Per-key read/write failures are continue-on-error: the key is counted in
//! `errors`, logged, and the loop moves on. Only enumeration failures and
//! failed preconditions abort the cycle.
//!
//! ## Usage
//!
//! Construct one shared instance at application start and thread it through
//! an `Arc`; there is deliberately no global accessor.
//!
//! ```rust,ignore
//! use core_sync::{SyncConfig, SyncManager, SyncOptions};
//! use std::sync::Arc;
//!
//! let manager = Arc::new(SyncManager::with_defaults(local, cloud, connectivity));
//! manager.restore_sync_state().await;
//! manager.start_auto_sync();
//!
//! let report = manager.sync(SyncOptions::default()).await?;
//! println!("synchronized {} keys", report.synchronized);
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex};

use bridge_traits::network::ConnectivityMonitor;
use bridge_traits::storage::{CloudStorageAdapter, LocalStorageAdapter};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::config::{ConflictStrategy, SyncConfig, SyncConfigPatch, SyncDirection, SyncOptions};
use crate::conflict_resolver::{Conflict, ConflictResolver, ResolutionAction};
use crate::error::{Result, StoreSide, SyncError};
use crate::events::{EventBus, SyncEvent};
use crate::record::{strip_metadata, SyncRecord};
use crate::scheduler::AutoSyncScheduler;
use crate::state::{SyncErrorRecord, SyncState};
use crate::state_store::{SyncStateStore, SYNC_STATE_KEY};

/// Aggregated outcome of one sync cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Keys copied or conflict-resolved with a write.
    pub synchronized: u64,
    pub direction: SyncDirection,
    /// True only on the no-op report returned to a reentrant caller.
    pub in_progress: bool,
    /// Divergent keys deferred to manual resolution this cycle.
    pub conflicts: u64,
    /// Keys that failed to read or write this cycle.
    pub errors: u64,
}

impl SyncReport {
    fn new(direction: SyncDirection) -> Self {
        Self {
            synchronized: 0,
            direction,
            in_progress: false,
            conflicts: 0,
            errors: 0,
        }
    }

    fn reentrant(direction: SyncDirection) -> Self {
        Self {
            in_progress: true,
            ..Self::new(direction)
        }
    }
}

/// Point-in-time view of the sync engine. Pure read, no side effects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub in_progress: bool,
    pub last_sync_time: Option<i64>,
    pub pending_conflicts: usize,
    pub cloud_authenticated: bool,
    pub is_online: bool,
}

/// Host decision for resolving a deferred conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictChoice {
    KeepLocal,
    KeepCloud,
}

enum KeyOutcome {
    Synchronized,
    Conflict(Conflict),
    Skipped,
}

/// Orchestrates synchronization between the local and cloud stores.
pub struct SyncManager {
    local: Arc<dyn LocalStorageAdapter>,
    cloud: Arc<dyn CloudStorageAdapter>,
    connectivity: Arc<dyn ConnectivityMonitor>,
    config: StdMutex<SyncConfig>,
    state: Mutex<SyncState>,
    state_store: SyncStateStore,
    resolver: ConflictResolver,
    events: EventBus,
    scheduler: StdMutex<AutoSyncScheduler>,
}

impl SyncManager {
    pub fn new(
        local: Arc<dyn LocalStorageAdapter>,
        cloud: Arc<dyn CloudStorageAdapter>,
        connectivity: Arc<dyn ConnectivityMonitor>,
        config: SyncConfig,
    ) -> Self {
        let resolver = ConflictResolver::new(Arc::clone(&local), Arc::clone(&cloud));
        let state_store = SyncStateStore::new(Arc::clone(&local));
        Self {
            local,
            cloud,
            connectivity,
            config: StdMutex::new(config),
            state: Mutex::new(SyncState::new()),
            state_store,
            resolver,
            events: EventBus::new(),
            scheduler: StdMutex::new(AutoSyncScheduler::new()),
        }
    }

    /// Construct with [`SyncConfig::default`].
    pub fn with_defaults(
        local: Arc<dyn LocalStorageAdapter>,
        cloud: Arc<dyn CloudStorageAdapter>,
        connectivity: Arc<dyn ConnectivityMonitor>,
    ) -> Self {
        Self::new(local, cloud, connectivity, SyncConfig::default())
    }

    /// The lifecycle event bus; hosts register listeners here.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Deep-cloned configuration snapshot.
    ///
    /// The caller owns the copy; mutating it never affects the live config.
    /// Changes go through [`update_config`](Self::update_config).
    pub fn config(&self) -> SyncConfig {
        self.config.lock().expect("config lock poisoned").clone()
    }

    /// Run one sync cycle.
    ///
    /// Rejects immediately when offline or unauthenticated, recording the
    /// error first. A call arriving while another cycle is in flight
    /// performs no adapter I/O and returns a report with `in_progress: true`.
    #[instrument(skip(self), fields(direction = %options.direction))]
    pub async fn sync(&self, options: SyncOptions) -> Result<SyncReport> {
        let direction = options.direction;

        {
            let mut state = self.state.lock().await;
            if state.in_progress {
                debug!("sync already in progress, skipping");
                return Ok(SyncReport::reentrant(direction));
            }
            if !self.connectivity.is_online() {
                return Err(self.reject_precondition(state, SyncError::Offline));
            }
            if !self.cloud.is_authenticated() {
                return Err(self.reject_precondition(state, SyncError::Unauthenticated));
            }
            state.in_progress = true;
        }

        self.events.emit(&SyncEvent::Started);
        info!(%direction, "sync started");

        let outcome = self.run_cycle(direction).await;

        let mut state = self.state.lock().await;
        state.in_progress = false;
        match outcome {
            Ok(report) => {
                state.last_sync_time = Some(chrono::Utc::now().timestamp_millis());
                let snapshot = state.snapshot();
                drop(state);

                // A failed state write must not fail an otherwise complete
                // cycle; the next successful cycle persists again.
                if let Err(e) = self.state_store.save(&snapshot).await {
                    warn!("failed to persist sync state: {}", e);
                }

                info!(
                    synchronized = report.synchronized,
                    conflicts = report.conflicts,
                    errors = report.errors,
                    "sync completed"
                );
                self.events.emit(&SyncEvent::Completed(report.clone()));
                Ok(report)
            }
            Err(e) => {
                state.record_error(e.to_string());
                drop(state);
                warn!("sync failed: {}", e);
                self.events.emit(&SyncEvent::Error {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn reject_precondition(
        &self,
        mut state: tokio::sync::MutexGuard<'_, SyncState>,
        error: SyncError,
    ) -> SyncError {
        state.record_error(error.to_string());
        drop(state);
        warn!("sync rejected: {}", error);
        self.events.emit(&SyncEvent::Error {
            message: error.to_string(),
        });
        error
    }

    async fn run_cycle(&self, direction: SyncDirection) -> Result<SyncReport> {
        let strategy = self
            .config
            .lock()
            .expect("config lock poisoned")
            .conflict_resolution_strategy;

        let local_keys = self
            .local
            .keys()
            .await
            .map_err(|e| SyncError::storage(StoreSide::Local, "keys", e))?;
        let cloud_keys = self
            .cloud
            .keys()
            .await
            .map_err(|e| SyncError::storage(StoreSide::Cloud, "keys", e))?;

        let local_set: HashSet<&str> = local_keys.iter().map(String::as_str).collect();
        let cloud_set: HashSet<&str> = cloud_keys.iter().map(String::as_str).collect();

        // Union in local enumeration order, cloud-only keys appended after.
        // The reserved state key never syncs itself.
        let mut keys: Vec<&str> = local_keys
            .iter()
            .map(String::as_str)
            .filter(|key| *key != SYNC_STATE_KEY)
            .collect();
        keys.extend(
            cloud_keys
                .iter()
                .map(String::as_str)
                .filter(|key| *key != SYNC_STATE_KEY && !local_set.contains(*key)),
        );

        debug!(total = keys.len(), "reconciling key union");
        let mut report = SyncReport::new(direction);

        for key in keys {
            // Keys only present on the side not being pushed are out of scope
            // for a restricted direction.
            if direction == SyncDirection::Up && !local_set.contains(key) {
                continue;
            }
            if direction == SyncDirection::Down && !cloud_set.contains(key) {
                continue;
            }

            match self.sync_key(key, strategy, direction).await {
                Ok(KeyOutcome::Synchronized) => report.synchronized += 1,
                Ok(KeyOutcome::Skipped) => {}
                Ok(KeyOutcome::Conflict(conflict)) => {
                    report.conflicts += 1;
                    {
                        let mut state = self.state.lock().await;
                        // Re-detecting a key replaces its stale unresolved
                        // entry instead of stacking duplicates.
                        state
                            .conflicts
                            .retain(|c| !(c.key == conflict.key && !c.resolved));
                        state.conflicts.push(conflict.clone());
                    }
                    self.events.emit(&SyncEvent::ConflictDetected(conflict));
                }
                Err(e) => {
                    warn!(key, "failed to sync key: {}", e);
                    report.errors += 1;
                    self.state
                        .lock()
                        .await
                        .record_error(format!("{}: {}", key, e));
                }
            }
        }

        Ok(report)
    }

    async fn sync_key(
        &self,
        key: &str,
        strategy: ConflictStrategy,
        direction: SyncDirection,
    ) -> Result<KeyOutcome> {
        let local_value = self
            .local
            .get(key)
            .await
            .map_err(|e| SyncError::storage(StoreSide::Local, "get", e))?;
        let cloud_value = self
            .cloud
            .get(key)
            .await
            .map_err(|e| SyncError::storage(StoreSide::Cloud, "get", e))?;

        match (local_value, cloud_value) {
            (Some(local), None) => {
                if !direction.allows_up() {
                    return Ok(KeyOutcome::Skipped);
                }
                let record = SyncRecord::new(key, local);
                self.cloud
                    .set(key, &record.stripped_payload())
                    .await
                    .map_err(|e| SyncError::storage(StoreSide::Cloud, "set", e))?;
                debug!(key, "copied local-only key to cloud");
                Ok(KeyOutcome::Synchronized)
            }
            (None, Some(cloud)) => {
                if !direction.allows_down() {
                    return Ok(KeyOutcome::Skipped);
                }
                let record = SyncRecord::new(key, cloud);
                self.local
                    .save(key, &record.stripped_payload())
                    .await
                    .map_err(|e| SyncError::storage(StoreSide::Local, "save", e))?;
                debug!(key, "copied cloud-only key to local");
                Ok(KeyOutcome::Synchronized)
            }
            (Some(local), Some(cloud)) => {
                let local_record = SyncRecord::new(key, local);
                let cloud_record = SyncRecord::new(key, cloud);
                let resolution = self
                    .resolver
                    .resolve(&local_record, &cloud_record, strategy, direction)
                    .await?;
                match resolution.action {
                    ResolutionAction::Synchronized => {
                        debug!(key, "{}", resolution.message);
                        Ok(KeyOutcome::Synchronized)
                    }
                    ResolutionAction::Skipped => Ok(KeyOutcome::Skipped),
                    ResolutionAction::Conflicts => Ok(KeyOutcome::Conflict(Conflict::new(
                        key,
                        local_record.payload,
                        cloud_record.payload,
                    ))),
                }
            }
            // Enumeration was stale; the key vanished from both sides.
            (None, None) => Ok(KeyOutcome::Skipped),
        }
    }

    /// Snapshot of the engine state plus live adapter signals.
    pub async fn get_sync_status(&self) -> SyncStatus {
        let state = self.state.lock().await;
        SyncStatus {
            in_progress: state.in_progress,
            last_sync_time: state.last_sync_time,
            pending_conflicts: state.pending_conflicts(),
            cloud_authenticated: self.cloud.is_authenticated(),
            is_online: self.connectivity.is_online(),
        }
    }

    /// Unresolved conflicts awaiting an explicit resolution choice.
    ///
    /// Cloned snapshot; this is how a host discovers which keys need
    /// [`resolve_conflict`](Self::resolve_conflict) and what each side holds.
    pub async fn pending_conflicts(&self) -> Vec<Conflict> {
        self.state
            .lock()
            .await
            .conflicts
            .iter()
            .filter(|c| !c.resolved)
            .cloned()
            .collect()
    }

    /// The recorded error history, oldest first. Cloned snapshot.
    pub async fn sync_errors(&self) -> Vec<SyncErrorRecord> {
        self.state.lock().await.sync_errors.clone()
    }

    /// Persist the durable state fields now.
    pub async fn save_sync_state(&self) -> Result<()> {
        let snapshot = self.state.lock().await.snapshot();
        self.state_store.save(&snapshot).await
    }

    /// Restore persisted state fields into the live state.
    ///
    /// Absent or corrupt persisted data leaves the defaults in place.
    pub async fn restore_sync_state(&self) {
        let snapshot = self.state_store.restore().await;
        self.state.lock().await.apply_snapshot(snapshot);
    }

    /// Resolve one deferred conflict with an explicit winner.
    ///
    /// Writes the chosen value to the losing store, removes the conflict
    /// record and persists the state. Returns `false` when no unresolved
    /// conflict exists for `key`.
    pub async fn resolve_conflict(&self, key: &str, choice: ConflictChoice) -> Result<bool> {
        let conflict = {
            let state = self.state.lock().await;
            state
                .conflicts
                .iter()
                .find(|c| c.key == key && !c.resolved)
                .cloned()
        };
        let Some(conflict) = conflict else {
            return Ok(false);
        };

        match choice {
            ConflictChoice::KeepLocal => {
                self.cloud
                    .set(key, &strip_metadata(&conflict.local_value))
                    .await
                    .map_err(|e| SyncError::storage(StoreSide::Cloud, "set", e))?;
            }
            ConflictChoice::KeepCloud => {
                self.local
                    .save(key, &strip_metadata(&conflict.cloud_value))
                    .await
                    .map_err(|e| SyncError::storage(StoreSide::Local, "save", e))?;
            }
        }

        let snapshot = {
            let mut state = self.state.lock().await;
            state.conflicts.retain(|c| !(c.key == key && !c.resolved));
            state.snapshot()
        };
        if let Err(e) = self.state_store.save(&snapshot).await {
            warn!("failed to persist sync state after resolution: {}", e);
        }

        info!(key, ?choice, "conflict resolved");
        Ok(true)
    }

    /// Merge a partial configuration update.
    ///
    /// If the auto-sync interval changed while the scheduler is running, the
    /// scheduler is restarted with the new interval.
    pub fn update_config(self: &Arc<Self>, patch: SyncConfigPatch) {
        let (interval_changed, interval) = {
            let mut config = self.config.lock().expect("config lock poisoned");
            let changed = patch.apply(&mut config);
            (changed, config.auto_sync_interval)
        };

        if interval_changed {
            let mut scheduler = self.scheduler.lock().expect("scheduler lock poisoned");
            if scheduler.is_running() {
                info!(?interval, "auto-sync interval changed, restarting scheduler");
                scheduler.start(interval, Arc::clone(self));
            }
        }
    }

    /// Begin periodic background syncs at the configured interval.
    ///
    /// Restarts the timer if one is already running.
    pub fn start_auto_sync(self: &Arc<Self>) {
        let interval = self
            .config
            .lock()
            .expect("config lock poisoned")
            .auto_sync_interval;
        self.scheduler
            .lock()
            .expect("scheduler lock poisoned")
            .start(interval, Arc::clone(self));
    }

    /// Cancel the periodic timer. Safe to call when not running; an
    /// in-flight cycle still runs to completion.
    pub fn stop_auto_sync(&self) {
        self.scheduler
            .lock()
            .expect("scheduler lock poisoned")
            .stop();
    }

    /// Whether the auto-sync timer is currently active.
    pub fn is_auto_sync_running(&self) -> bool {
        self.scheduler
            .lock()
            .expect("scheduler lock poisoned")
            .is_running()
    }

    /// Stop the scheduler and drop all event listeners. Idempotent.
    pub fn destroy(&self) {
        self.stop_auto_sync();
        self.events.clear();
        debug!("sync manager destroyed");
    }
}

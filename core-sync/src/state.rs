//! Sync state owned by the manager.
//!
//! One [`SyncState`] exists per [`SyncManager`](crate::SyncManager) instance.
//! The transient fields (`in_progress`, `pending_operations`) never leave the
//! process; the durable fields are captured into a [`PersistedSyncState`]
//! snapshot and stored through the state store.

use serde::{Deserialize, Serialize};

use crate::config::SyncDirection;
use crate::conflict_resolver::Conflict;

/// Upper bound on the persisted error log; the oldest entries are dropped
/// once the cap is reached.
pub const MAX_ERROR_LOG: usize = 50;

/// Serializable form of an error for the persisted error log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncErrorRecord {
    pub message: String,
    /// Epoch milliseconds.
    pub occurred_at: i64,
}

impl SyncErrorRecord {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            occurred_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// An operation queued by the host for a later cycle.
///
/// Reserved for host-side offline queueing; the engine itself keeps this
/// list empty and excludes it from persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOperation {
    pub key: String,
    pub direction: SyncDirection,
    /// Epoch milliseconds.
    pub queued_at: i64,
}

/// The durable slice of [`SyncState`], stored under the reserved local key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedSyncState {
    pub last_sync_time: Option<i64>,
    pub conflicts: Vec<Conflict>,
    pub sync_errors: Vec<SyncErrorRecord>,
}

/// Process-wide synchronization state.
#[derive(Debug, Default)]
pub struct SyncState {
    /// True for the entire duration of exactly one in-flight sync cycle.
    pub in_progress: bool,
    /// Epoch milliseconds of the last successful cycle.
    pub last_sync_time: Option<i64>,
    pub pending_operations: Vec<PendingOperation>,
    pub conflicts: Vec<Conflict>,
    pub sync_errors: Vec<SyncErrorRecord>,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error to the log, evicting the oldest entry past the cap.
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.sync_errors.push(SyncErrorRecord::new(message));
        if self.sync_errors.len() > MAX_ERROR_LOG {
            let excess = self.sync_errors.len() - MAX_ERROR_LOG;
            self.sync_errors.drain(..excess);
        }
    }

    /// Number of conflicts still awaiting resolution.
    pub fn pending_conflicts(&self) -> usize {
        self.conflicts.iter().filter(|c| !c.resolved).count()
    }

    /// Capture the durable fields for persistence.
    pub fn snapshot(&self) -> PersistedSyncState {
        PersistedSyncState {
            last_sync_time: self.last_sync_time,
            conflicts: self.conflicts.clone(),
            sync_errors: self.sync_errors.clone(),
        }
    }

    /// Merge a restored snapshot back into the live state.
    ///
    /// Transient fields are left untouched.
    pub fn apply_snapshot(&mut self, snapshot: PersistedSyncState) {
        self.last_sync_time = snapshot.last_sync_time;
        self.conflicts = snapshot.conflicts;
        self.sync_errors = snapshot.sync_errors;
    }
}

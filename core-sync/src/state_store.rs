//! Persistence for sync metadata.
//!
//! The durable slice of the sync state lives under a single reserved key in
//! the local store, so it survives process restarts without needing its own
//! backend. The reserved key is excluded from synchronization.

use std::sync::Arc;

use bridge_traits::storage::LocalStorageAdapter;
use tracing::{debug, warn};

use crate::error::{Result, StoreSide, SyncError};
use crate::state::PersistedSyncState;

/// Reserved local key holding the persisted sync state.
pub const SYNC_STATE_KEY: &str = "_syncState";

/// Persists and restores sync metadata through the local adapter.
pub struct SyncStateStore {
    local: Arc<dyn LocalStorageAdapter>,
}

impl SyncStateStore {
    pub fn new(local: Arc<dyn LocalStorageAdapter>) -> Self {
        Self { local }
    }

    /// Serialize the snapshot under [`SYNC_STATE_KEY`].
    pub async fn save(&self, snapshot: &PersistedSyncState) -> Result<()> {
        let encoded = serde_json::to_value(snapshot)
            .map_err(|e| SyncError::Serialization(e.to_string()))?;
        self.local
            .save(SYNC_STATE_KEY, &encoded)
            .await
            .map_err(|e| SyncError::storage(StoreSide::Local, "save", e))?;
        debug!("persisted sync state");
        Ok(())
    }

    /// Load the persisted snapshot.
    ///
    /// Absent, unreadable or corrupt data yields the initial default state
    /// rather than an error; corruption is only logged.
    pub async fn restore(&self) -> PersistedSyncState {
        let raw = match self.local.load(SYNC_STATE_KEY).await {
            Ok(Some(value)) => value,
            Ok(None) => return PersistedSyncState::default(),
            Err(e) => {
                warn!("failed to read persisted sync state: {}", e);
                return PersistedSyncState::default();
            }
        };

        match serde_json::from_value(raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("persisted sync state is corrupt, starting fresh: {}", e);
                PersistedSyncState::default()
            }
        }
    }
}

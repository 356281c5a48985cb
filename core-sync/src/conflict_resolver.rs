//! Conflict Resolution for Sync Operations
//!
//! Decides which side of a divergent key wins and, except under the manual
//! strategy, applies the winner to the losing store.
//!
//! ## Strategies
//!
//! - **Timestamp**: the side with the strictly greater origin timestamp wins;
//!   ties are cloud-wins so resolution stays deterministic
//! - **Local** / **Cloud**: that side always wins
//! - **Manual**: nothing is written; the conflict is surfaced to the host as
//!   a [`Conflict`] record
//!
//! Regardless of strategy, two values that are structurally identical after
//! metadata stripping are skipped before strategy dispatch — a pure guard
//! against spurious writes.

use std::sync::Arc;

use bridge_traits::storage::{CloudStorageAdapter, LocalStorageAdapter};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::{ConflictStrategy, SyncDirection};
use crate::error::{Result, StoreSide, SyncError};
use crate::record::{values_equal, SyncRecord};

/// A key holding unequal, metadata-stripped values on both sides.
///
/// Lives in the sync state's conflict list until explicitly resolved; it is
/// never silently dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub key: String,
    pub local_value: Value,
    pub cloud_value: Value,
    /// Epoch milliseconds at detection time.
    pub detected_at: i64,
    pub resolved: bool,
}

impl Conflict {
    pub fn new(key: impl Into<String>, local_value: Value, cloud_value: Value) -> Self {
        Self {
            key: key.into(),
            local_value,
            cloud_value,
            detected_at: chrono::Utc::now().timestamp_millis(),
            resolved: false,
        }
    }
}

/// What a resolution attempt did for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionAction {
    /// A winner was written to the losing store.
    Synchronized,
    /// Resolution was deferred to the host (manual strategy).
    Conflicts,
    /// Values were identical after metadata stripping; nothing written.
    Skipped,
}

/// Outcome of resolving one divergent key.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub action: ResolutionAction,
    pub message: String,
}

/// Conflict resolver for divergent keys.
///
/// Pure decision logic plus the single winner-write; it never touches the
/// manager's state. The manager records [`Conflict`]s for deferred keys.
pub struct ConflictResolver {
    local: Arc<dyn LocalStorageAdapter>,
    cloud: Arc<dyn CloudStorageAdapter>,
}

impl ConflictResolver {
    pub fn new(local: Arc<dyn LocalStorageAdapter>, cloud: Arc<dyn CloudStorageAdapter>) -> Self {
        Self { local, cloud }
    }

    /// Resolve one divergent key.
    ///
    /// `direction` restricts the winner-write: under `Up` the local value is
    /// pushed, under `Down` the cloud value is pulled, and only
    /// `Bidirectional` consults `strategy`.
    pub async fn resolve(
        &self,
        local: &SyncRecord,
        cloud: &SyncRecord,
        strategy: ConflictStrategy,
        direction: SyncDirection,
    ) -> Result<Resolution> {
        let key = local.key.as_str();

        // Identical data never produces a write or a conflict.
        if values_equal(&local.payload, &cloud.payload) {
            debug!(key, "values identical after metadata strip, skipping");
            return Ok(Resolution {
                action: ResolutionAction::Skipped,
                message: format!("Values for '{}' are identical", key),
            });
        }

        match direction {
            SyncDirection::Up => {
                self.push_to_cloud(key, local).await?;
                Ok(Resolution {
                    action: ResolutionAction::Synchronized,
                    message: format!("Pushed local value for '{}' to cloud", key),
                })
            }
            SyncDirection::Down => {
                self.pull_to_local(key, cloud).await?;
                Ok(Resolution {
                    action: ResolutionAction::Synchronized,
                    message: format!("Pulled cloud value for '{}' to local", key),
                })
            }
            SyncDirection::Bidirectional => self.apply_strategy(key, local, cloud, strategy).await,
        }
    }

    async fn apply_strategy(
        &self,
        key: &str,
        local: &SyncRecord,
        cloud: &SyncRecord,
        strategy: ConflictStrategy,
    ) -> Result<Resolution> {
        match strategy {
            ConflictStrategy::Timestamp => {
                let local_ts = local.local_timestamp.unwrap_or(0);
                let cloud_ts = cloud.cloud_timestamp.unwrap_or(0);

                // Ties go to the cloud: arbitrary, but consistent.
                if local_ts > cloud_ts {
                    self.push_to_cloud(key, local).await?;
                    Ok(Resolution {
                        action: ResolutionAction::Synchronized,
                        message: format!(
                            "Local value for '{}' is newer ({} > {}), pushed to cloud",
                            key, local_ts, cloud_ts
                        ),
                    })
                } else {
                    self.pull_to_local(key, cloud).await?;
                    Ok(Resolution {
                        action: ResolutionAction::Synchronized,
                        message: format!(
                            "Cloud value for '{}' wins ({} >= {}), pulled to local",
                            key, cloud_ts, local_ts
                        ),
                    })
                }
            }
            ConflictStrategy::Local => {
                self.push_to_cloud(key, local).await?;
                Ok(Resolution {
                    action: ResolutionAction::Synchronized,
                    message: format!("Local value for '{}' wins by policy", key),
                })
            }
            ConflictStrategy::Cloud => {
                self.pull_to_local(key, cloud).await?;
                Ok(Resolution {
                    action: ResolutionAction::Synchronized,
                    message: format!("Cloud value for '{}' wins by policy", key),
                })
            }
            ConflictStrategy::Manual => {
                debug!(key, "deferring conflict to manual resolution");
                Ok(Resolution {
                    action: ResolutionAction::Conflicts,
                    message: format!("Manual resolution required for '{}'", key),
                })
            }
        }
    }

    async fn push_to_cloud(&self, key: &str, winner: &SyncRecord) -> Result<()> {
        self.cloud
            .set(key, &winner.stripped_payload())
            .await
            .map_err(|e| SyncError::storage(StoreSide::Cloud, "set", e))?;
        Ok(())
    }

    async fn pull_to_local(&self, key: &str, winner: &SyncRecord) -> Result<()> {
        self.local
            .save(key, &winner.stripped_payload())
            .await
            .map_err(|e| SyncError::storage(StoreSide::Local, "save", e))?;
        Ok(())
    }
}

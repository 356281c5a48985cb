//! Sync configuration types.
//!
//! [`SyncConfig`] is the live configuration owned by the manager; callers
//! receive deep-cloned snapshots and apply changes through
//! [`SyncConfigPatch`] so ownership of every copy is unambiguous.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Policy deciding which value wins a divergent key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStrategy {
    /// The side with the strictly greater origin timestamp wins; ties are
    /// cloud-wins.
    #[default]
    Timestamp,
    /// Local value always wins and is written to the cloud store.
    Local,
    /// Cloud value always wins and is written to the local store.
    Cloud,
    /// No automatic write; a conflict record is surfaced for the host to
    /// resolve explicitly.
    Manual,
}

impl ConflictStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictStrategy::Timestamp => "timestamp",
            ConflictStrategy::Local => "local",
            ConflictStrategy::Cloud => "cloud",
            ConflictStrategy::Manual => "manual",
        }
    }
}

impl FromStr for ConflictStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "timestamp" => Ok(ConflictStrategy::Timestamp),
            "local" => Ok(ConflictStrategy::Local),
            "cloud" => Ok(ConflictStrategy::Cloud),
            "manual" => Ok(ConflictStrategy::Manual),
            other => Err(format!("Unknown conflict strategy: {}", other)),
        }
    }
}

impl std::fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which way data is allowed to flow during one sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    /// Local to cloud only.
    Up,
    /// Cloud to local only.
    Down,
    /// Both directions.
    #[default]
    Bidirectional,
}

impl SyncDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncDirection::Up => "up",
            SyncDirection::Down => "down",
            SyncDirection::Bidirectional => "bidirectional",
        }
    }

    /// Whether this direction permits writes from local to cloud.
    pub fn allows_up(&self) -> bool {
        matches!(self, SyncDirection::Up | SyncDirection::Bidirectional)
    }

    /// Whether this direction permits writes from cloud to local.
    pub fn allows_down(&self) -> bool {
        matches!(self, SyncDirection::Down | SyncDirection::Bidirectional)
    }
}

impl FromStr for SyncDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" => Ok(SyncDirection::Up),
            "down" => Ok(SyncDirection::Down),
            "bidirectional" => Ok(SyncDirection::Bidirectional),
            other => Err(format!("Unknown sync direction: {}", other)),
        }
    }
}

impl std::fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-call options for [`SyncManager::sync`](crate::SyncManager::sync).
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    pub direction: SyncDirection,
}

impl SyncOptions {
    pub fn with_direction(direction: SyncDirection) -> Self {
        Self { direction }
    }
}

/// Sync engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Interval between auto-sync ticks.
    pub auto_sync_interval: Duration,

    /// Policy applied to divergent keys during bidirectional sync.
    pub conflict_resolution_strategy: ConflictStrategy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_sync_interval: Duration::from_secs(300),
            conflict_resolution_strategy: ConflictStrategy::Timestamp,
        }
    }
}

/// Partial configuration update.
///
/// Only fields set to `Some` are merged into the live config.
#[derive(Debug, Clone, Default)]
pub struct SyncConfigPatch {
    pub auto_sync_interval: Option<Duration>,
    pub conflict_resolution_strategy: Option<ConflictStrategy>,
}

impl SyncConfigPatch {
    /// Merge this patch into `config`.
    ///
    /// Returns `true` when the auto-sync interval actually changed, which is
    /// the signal the manager uses to restart a running scheduler.
    pub fn apply(&self, config: &mut SyncConfig) -> bool {
        let mut interval_changed = false;

        if let Some(interval) = self.auto_sync_interval {
            if interval != config.auto_sync_interval {
                config.auto_sync_interval = interval;
                interval_changed = true;
            }
        }

        if let Some(strategy) = self.conflict_resolution_strategy {
            config.conflict_resolution_strategy = strategy;
        }

        interval_changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_round_trip() {
        for strategy in [
            ConflictStrategy::Timestamp,
            ConflictStrategy::Local,
            ConflictStrategy::Cloud,
            ConflictStrategy::Manual,
        ] {
            assert_eq!(strategy.as_str().parse::<ConflictStrategy>(), Ok(strategy));
        }
        assert!("newest-wins".parse::<ConflictStrategy>().is_err());
    }

    #[test]
    fn test_direction_round_trip() {
        for direction in [
            SyncDirection::Up,
            SyncDirection::Down,
            SyncDirection::Bidirectional,
        ] {
            assert_eq!(direction.as_str().parse::<SyncDirection>(), Ok(direction));
        }
    }

    #[test]
    fn test_direction_permissions() {
        assert!(SyncDirection::Up.allows_up());
        assert!(!SyncDirection::Up.allows_down());
        assert!(!SyncDirection::Down.allows_up());
        assert!(SyncDirection::Down.allows_down());
        assert!(SyncDirection::Bidirectional.allows_up());
        assert!(SyncDirection::Bidirectional.allows_down());
    }

    #[test]
    fn test_patch_reports_interval_change() {
        let mut config = SyncConfig::default();

        let patch = SyncConfigPatch {
            conflict_resolution_strategy: Some(ConflictStrategy::Manual),
            ..Default::default()
        };
        assert!(!patch.apply(&mut config));
        assert_eq!(
            config.conflict_resolution_strategy,
            ConflictStrategy::Manual
        );

        let patch = SyncConfigPatch {
            auto_sync_interval: Some(Duration::from_secs(60)),
            ..Default::default()
        };
        assert!(patch.apply(&mut config));
        assert_eq!(config.auto_sync_interval, Duration::from_secs(60));

        // Same interval again is not a change
        assert!(!patch.apply(&mut config));
    }

    #[test]
    fn test_cloned_config_is_independent() {
        let source = SyncConfig::default();
        let mut copy = source.clone();
        copy.auto_sync_interval = Duration::from_secs(1);
        copy.conflict_resolution_strategy = ConflictStrategy::Cloud;

        assert_eq!(source.auto_sync_interval, Duration::from_secs(300));
        assert_eq!(
            source.conflict_resolution_strategy,
            ConflictStrategy::Timestamp
        );
    }
}

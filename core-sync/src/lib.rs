//! # Cloud Save Sync Module
//!
//! Orchestrates synchronization of game save data between a local store and
//! a cloud store.
//!
//! ## Overview
//!
//! This module manages the full sync lifecycle, including:
//! - Enumerating keys on both stores and reconciling the union
//! - Resolving divergent values by timestamp, fixed winner, or deferral
//! - Persisting sync metadata under a reserved local key
//! - Emitting lifecycle events to registered listeners
//! - Scheduling periodic background syncs
//!
//! ## Components
//!
//! - **Sync Manager** (`manager`): Orchestrates sync cycles with reentrancy
//!   and precondition guards
//! - **Conflict Resolver** (`conflict_resolver`): Decides the winner for keys
//!   present on both sides with different values
//! - **State Store** (`state_store`): Persists the durable sync state
//! - **Event Bus** (`events`): Ordered, synchronous lifecycle notifications
//! - **Scheduler** (`scheduler`): Interval-driven background sync timer
//!
//! Storage and connectivity backends plug in through the adapter traits in
//! the `bridge-traits` crate.

pub mod config;
pub mod conflict_resolver;
pub mod error;
pub mod events;
pub mod manager;
pub mod record;
pub mod scheduler;
pub mod state;
pub mod state_store;

pub use config::{ConflictStrategy, SyncConfig, SyncConfigPatch, SyncDirection, SyncOptions};
pub use conflict_resolver::{Conflict, ConflictResolver, Resolution, ResolutionAction};
pub use error::{Result, StoreSide, SyncError};
pub use events::{EventBus, ListenerId, SyncEvent, SyncEventKind};
pub use manager::{ConflictChoice, SyncManager, SyncReport, SyncStatus};
pub use record::{strip_metadata, SyncRecord, CLOUD_TIMESTAMP_FIELD, LOCAL_TIMESTAMP_FIELD};
pub use scheduler::AutoSyncScheduler;
pub use state::{
    PendingOperation, PersistedSyncState, SyncErrorRecord, SyncState, MAX_ERROR_LOG,
};
pub use state_store::{SyncStateStore, SYNC_STATE_KEY};

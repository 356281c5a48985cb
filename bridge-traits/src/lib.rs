//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by the host
//! application's persistence layer.
//!
//! ## Overview
//!
//! This crate defines the contract between the sync core and the storage
//! backends it reconciles. The core never talks to a concrete store; it only
//! consumes these traits:
//!
//! - [`LocalStorageAdapter`](storage::LocalStorageAdapter) - the on-device
//!   key-value store (browser localStorage, a settings database, ...)
//! - [`CloudStorageAdapter`](storage::CloudStorageAdapter) - the remote
//!   key-value store behind an authenticated session
//! - [`ConnectivityMonitor`](network::ConnectivityMonitor) - the platform
//!   online/offline signal
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Adapter implementations should convert backend-specific failures into
//! `BridgeError` with actionable messages; the sync core wraps them into its
//! own error taxonomy at the call site.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks.

pub mod error;
pub mod network;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use network::ConnectivityMonitor;
pub use storage::{CloudStorageAdapter, LocalStorageAdapter};

use std::fmt;

use bridge_traits::BridgeError;
use thiserror::Error;

/// Which of the two stores an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreSide {
    Local,
    Cloud,
}

impl fmt::Display for StoreSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreSide::Local => write!(f, "local"),
            StoreSide::Cloud => write!(f, "cloud"),
        }
    }
}

#[derive(Error, Debug)]
pub enum SyncError {
    /// Connectivity check failed before any adapter call was made.
    #[error("Client is offline, sync deferred")]
    Offline,

    /// Cloud adapter reports no usable session.
    #[error("Cloud storage is not authenticated")]
    Unauthenticated,

    /// Enumeration, read or write failure against either adapter.
    #[error("{store} storage {operation} failed: {message}")]
    StorageAccess {
        store: StoreSide,
        operation: String,
        message: String,
    },

    /// Sync state snapshot could not be encoded or decoded.
    #[error("Sync state serialization failed: {0}")]
    Serialization(String),
}

impl SyncError {
    /// Wrap a bridge-level failure with the store and operation it hit.
    pub fn storage(store: StoreSide, operation: &str, source: BridgeError) -> Self {
        SyncError::StorageAccess {
            store,
            operation: operation.to_string(),
            message: source.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

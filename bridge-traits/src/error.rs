use thiserror::Error;

/// Failure surface shared by every bridge trait.
///
/// Adapters map backend-specific failures (quota errors, missing tables,
/// HTTP status codes) into these variants with a human-readable message.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The host platform does not provide this capability at all.
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    /// The backend accepted the call but could not complete it.
    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// The underlying store rejected a read or write.
    #[error("Storage backend error: {0}")]
    StorageError(String),

    /// The stored bytes could not be encoded or decoded as JSON.
    #[error("Payload encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

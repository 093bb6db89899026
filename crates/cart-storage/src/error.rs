use common::ScopeKey;
use thiserror::Error;

/// Errors that can occur when interacting with cart storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The write exceeded the storage quota.
    #[error("Storage quota exceeded writing key {key} ({attempted} of {limit} bytes)")]
    QuotaExceeded {
        key: ScopeKey,
        attempted: usize,
        limit: usize,
    },

    /// The backing medium rejected the operation.
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

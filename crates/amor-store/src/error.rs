use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Generic I/O error (e.g. creating the data directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored bytes are not a preferences document.
    #[error("Stored preferences are corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    /// The document could not be encoded.
    #[error("Failed to serialize preferences: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The backing storage refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

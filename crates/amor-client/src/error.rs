use amor_shared::ValidationError;
use thiserror::Error;

/// Failures talking to the preferences server.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Could not reach the preferences server: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server answered {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid server response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Server response is missing the saved preferences")]
    MissingPreferences,
}

/// Failures of the local key/value cache.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache file is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Preferences are not loaded yet")]
    NotReady,

    #[error("Preferences were already initialized")]
    AlreadyInitialized,

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Couple names cannot be empty")]
    EmptyName,

    #[error("Save failed: {0}")]
    Save(#[source] ClientError),
}

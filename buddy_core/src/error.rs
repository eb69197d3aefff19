//! Error types for the buddy_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for buddy_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A numeric field was non-finite, non-positive or otherwise out of range
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Edit/delete addressed an event index (or catalog id) that does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Undo requested with no pending (or an expired) recall snapshot
    #[error("Nothing to restore: {0}")]
    NothingToRestore(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand used by the validation layer
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}

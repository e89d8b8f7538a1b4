//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for FlexLog
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum FlexLogError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Local storage full: {0}")]
    StorageFull(String),

    #[error("Local storage corrupt: {0}")]
    StorageCorrupt(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FlexLogError {
    /// Whether a remote-store failure with this error is worth retrying on a
    /// later sync pass. Permanent remote rejections stay queued too (dropping
    /// user data silently is worse than a visibly stuck item), so this is
    /// informational only.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Database(_) | Self::Internal(_))
    }
}

/// Result type alias for FlexLog operations
pub type Result<T> = std::result::Result<T, FlexLogError>;

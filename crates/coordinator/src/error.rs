//! Error types for the coordinator and its sources.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for handle operations.
pub type Result<T> = std::result::Result<T, CoordinatorError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The coordinator task has stopped.
    #[error("coordinator mailbox closed")]
    MailboxClosed,
}

/// Failures subscribing to a platform event source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The user has not granted the permission the source needs.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("source unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

//! Common error types for ReachCheck

use thiserror::Error;

/// Common result type for ReachCheck operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared across the ReachCheck crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Identity hint rejected at the pipeline boundary
    #[error("Invalid identity hint: {0}")]
    InvalidIdentity(String),

    /// Every provider adapter failed; there is nothing to diagnose
    #[error("No provider returned data: {0}")]
    NoProviderData(String),

    /// Snapshot store refused an operation
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Internal invariant violation (a bug, not bad external data)
    #[error("Internal error: {0}")]
    Internal(String),
}

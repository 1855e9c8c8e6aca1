//! Error types for raffle-service.

use thiserror::Error;

/// Errors produced by the service layers below the HTTP edge.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O failure (configuration files, sockets).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unreadable configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The payment provider failed or answered with something unusable.
    #[error("payment provider error: {0}")]
    Provider(String),

    /// The persistence backend failed.
    #[error("store error: {0}")]
    Store(String),

    /// A purchase request was rejected before reaching the provider.
    #[error("invalid purchase: {0}")]
    Validation(String),

    /// A webhook notification could not be read.
    #[error("malformed notification: {0}")]
    Notification(String),

    /// A webhook signature did not match and enforcement is enabled.
    #[error("signature rejected: {0}")]
    Signature(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

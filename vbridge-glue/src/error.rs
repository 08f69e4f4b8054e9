//! Error types for the platform glue layer.

use thiserror::Error;

/// Errors that can occur while talking to the platform through the glue.
#[derive(Error, Debug)]
pub enum GlueError {
    /// Backend initialization or logon failed.
    #[error("failed to connect to platform backend: {0}")]
    Connection(String),

    /// The operation is not supported by this backend.
    #[error("operation not supported on this backend: {0}")]
    Unsupported(String),

    /// An event-wait was attempted from a thread other than the one that
    /// constructed the adapter.
    #[error("wrong thread: {0}")]
    ThreadAffinity(String),

    /// A malformed argument (e.g. an empty member name).
    #[error("invalid argument: {0}")]
    Argument(String),

    /// An attribute, method or interface was not found, even after the
    /// name-translation fallbacks.
    #[error("lookup failed: {0}")]
    Lookup(String),

    /// The underlying call to the external platform failed.
    #[error("platform call failed: {0}")]
    Transport(String),

    /// The adapter has been deinitialized; only `deinit` is valid now.
    #[error("adapter already deinitialized: {0}")]
    Deinitialized(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for glue operations.
pub type Result<T> = std::result::Result<T, GlueError>;

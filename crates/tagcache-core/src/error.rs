//! Error types for cache operations

use thiserror::Error;

/// Main error type for all cache operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The store rejected the supplied credential
    #[error("authentication failed for store")]
    AuthenticationFailed,

    /// Connection or protocol failure talking to the store
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Malformed key, tag or expiry input
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Item not found in cache
    #[error("item not found: {0}")]
    NotFound(String),

    /// Serialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed
    #[error("deserialization error: {0}")]
    Deserialization(String),
}

impl CacheError {
    /// Shorthand for an `InvalidArgument` error
    pub fn invalid(msg: impl Into<String>) -> Self {
        CacheError::InvalidArgument(msg.into())
    }

    /// Shorthand for a `StoreUnavailable` error
    pub fn unavailable(msg: impl ToString) -> Self {
        CacheError::StoreUnavailable(msg.to_string())
    }
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

//! Error types for the caching layer
//!
//! Provides unified error handling using thiserror.
//!
//! A miss (absent or expired key) is never an error: `Cache::get` reports it
//! as `Ok(None)`. The variants here cover genuine failures only.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for all cache backends.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Filesystem failure while touching a cache directory or entry file
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Entry could not be serialized or deserialized
    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Advisory file lock could not be acquired or released
    #[error("cache lock error: {0}")]
    Lock(String),

    /// The remote cache service failed or is unreachable
    #[error("remote cache error: {0}")]
    Remote(String),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Cache Entry ==
/// Represents a single cache entry: an opaque payload plus its creation time.
///
/// Expiry is not a stored property. An entry is stale relative to whatever
/// timeout the reader applies, so the same entry can be fresh for one caller
/// and expired for another using a shorter override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// The stored payload, never inspected by the cache itself
    pub value: Value,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry stamped with the current time.
    pub fn new(value: Value) -> Self {
        Self {
            created_at: Utc::now(),
            value,
        }
    }

    // == Age ==
    /// Returns the elapsed time since the entry was created.
    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.created_at)
    }

    // == Is Expired ==
    /// Checks whether the entry is stale under the given timeout in seconds.
    ///
    /// An entry is expired once its age reaches the timeout. A timeout of
    /// zero or below means the entry never expires.
    pub fn is_expired(&self, timeout: i64) -> bool {
        timeout > 0 && self.age() >= Duration::seconds(timeout)
    }
}

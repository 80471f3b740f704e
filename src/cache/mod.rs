//! Cache Module
//!
//! Pluggable caching for memoized remote-call responses, with per-entry
//! TTL expiration.
//!
//! Three interchangeable backends implement the [`Cache`] trait: in-process
//! memory, the filesystem, and a memcached-style remote service. Callers
//! treat the cache as an opaque key-value store and pick a backend behind
//! `Arc<dyn Cache>`.

mod entry;
mod file;
mod lock;
mod memcached;
mod memory;
mod stats;


// Re-export public types
pub use entry::CacheEntry;
pub use file::FileCache;
pub use memcached::{MemcachedCache, RemoteClient};
pub use memory::MemoryCache;
pub use stats::CacheStats;

use serde_json::Value;

use crate::error::Result;

// == Public Constants ==
/// Default entry timeout in seconds when none is configured
pub const DEFAULT_TIMEOUT_SECS: i64 = 60;

// == Cache Trait ==
/// Operation set every cache backend implements.
///
/// Keys are arbitrary strings the cache never interprets; values are opaque
/// serializable payloads. A missing or expired entry is a miss (`Ok(None)`),
/// never an error — errors are reserved for genuine I/O, lock, or
/// connectivity failures, which are surfaced rather than swallowed. The
/// cache performs no retries and no fallback between backends.
pub trait Cache: Send + Sync {
    /// Persists `value` under `key` with the current time, overwriting any
    /// existing entry.
    fn store(&self, key: &str, value: Value) -> Result<()>;

    /// Returns the stored value if present and not expired under the
    /// effective timeout: `timeout` if given, else the backend default.
    /// Reading an expired entry removes it as a side effect.
    fn get(&self, key: &str, timeout: Option<i64>) -> Result<Option<Value>>;

    /// Removes every entry that is expired under the backend's default
    /// timeout.
    fn cleanup(&self) -> Result<()>;

    /// Removes all entries unconditionally, regardless of expiry state.
    fn flush(&self) -> Result<()>;
}

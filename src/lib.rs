//! apicache - A pluggable TTL cache for memoized remote API responses
//!
//! Stores opaque payloads under string keys with per-entry time-to-live
//! expiration, behind one [`Cache`] contract with in-memory, file-backed,
//! and memcached-backed implementations.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{Cache, CacheEntry, FileCache, MemcachedCache, MemoryCache, RemoteClient};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::{spawn_cleanup_task, CleanupTask};

//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default timeout in seconds before an entry is considered stale.
    /// A value <= 0 means entries never expire.
    pub default_timeout: i64,
    /// Directory used by the file-backed cache
    pub cache_dir: PathBuf,
    /// Background cleanup sweep interval in seconds
    pub cleanup_interval: u64,
    /// Memcached server addresses for the remote backend
    pub memcached_servers: Vec<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TIMEOUT` - Default entry timeout in seconds (default: 60)
    /// - `CACHE_DIR` - File cache directory (default: "cache")
    /// - `CLEANUP_INTERVAL` - Cleanup sweep frequency in seconds (default: 60)
    /// - `MEMCACHED_SERVERS` - Comma-separated memcached addresses
    ///   (default: "memcache://127.0.0.1:11211")
    pub fn from_env() -> Self {
        Self {
            default_timeout: env::var("CACHE_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            cache_dir: env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("cache")),
            cleanup_interval: env::var("CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            memcached_servers: env::var("MEMCACHED_SERVERS")
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["memcache://127.0.0.1:11211".to_string()]),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_timeout: 60,
            cache_dir: PathBuf::from("cache"),
            cleanup_interval: 60,
            memcached_servers: vec!["memcache://127.0.0.1:11211".to_string()],
        }
    }
}

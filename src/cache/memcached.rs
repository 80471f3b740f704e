//! Memcached Cache Module
//!
//! Remote cache backend delegating storage and TTL enforcement to a
//! memcached-style distributed key-value service.
//!
//! The service is reached through the [`RemoteClient`] trait so the expiry
//! logic can be exercised without a running daemon. The `memcached-backend`
//! cargo feature provides the implementation over `memcache::Client`.

use serde_json::Value;

use crate::cache::{Cache, CacheEntry, CacheStats};
use crate::error::Result;

#[cfg(feature = "memcached-backend")]
use crate::error::CacheError;

// == Remote Client Trait ==
/// Primitives the external distributed cache service must provide.
///
/// `ttl_secs` follows memcached semantics: 0 means the entry never expires
/// on the server side.
pub trait RemoteClient: Send + Sync {
    fn set(&self, key: &str, value: &[u8], ttl_secs: u32) -> Result<()>;
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn delete(&self, key: &str) -> Result<()>;
    fn flush_all(&self) -> Result<()>;
}

// == Memcached Cache ==
/// Remote cache backend.
///
/// Storage and eviction belong to the service; no local locking is needed.
/// `get` still re-checks the entry age client-side and deletes stale keys
/// from the service, guarding against clock skew and server-side TTL
/// granularity mismatches.
#[derive(Debug)]
pub struct MemcachedCache<C> {
    /// Connected service client
    client: C,
    /// Default timeout in seconds; <= 0 means entries never expire
    timeout: i64,
    /// Hit/miss counters
    stats: CacheStats,
}

impl<C: RemoteClient> MemcachedCache<C> {
    // == Constructor ==
    /// Wraps an already-connected client with the given default timeout.
    pub fn with_client(client: C, timeout: i64) -> Self {
        Self {
            client,
            timeout,
            stats: CacheStats::new(),
        }
    }

    /// Default timeout in seconds applied when `get` receives no override.
    pub fn timeout(&self) -> i64 {
        self.timeout
    }

    // == Stats ==
    /// Hit/miss counters for this instance.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Server-side TTL for stored entries. Non-positive timeouts map to
    /// memcached's 0, meaning the server never expires the entry.
    fn native_ttl(&self) -> u32 {
        u32::try_from(self.timeout).unwrap_or(0)
    }
}

impl<C: RemoteClient> Cache for MemcachedCache<C> {
    fn store(&self, key: &str, value: Value) -> Result<()> {
        let entry = CacheEntry::new(value);
        let bytes = serde_json::to_vec(&entry)?;
        self.client.set(key, &bytes, self.native_ttl())
    }

    fn get(&self, key: &str, timeout: Option<i64>) -> Result<Option<Value>> {
        let Some(bytes) = self.client.get(key)? else {
            self.stats.record_miss();
            return Ok(None);
        };
        let entry: CacheEntry = serde_json::from_slice(&bytes)?;

        let timeout = timeout.unwrap_or(self.timeout);
        if entry.is_expired(timeout) {
            // The server believed the entry was live; trust our own clock
            // and drop it remotely as well.
            self.client.delete(key)?;
            self.stats.record_miss();
            return Ok(None);
        }

        self.stats.record_hit();
        Ok(Some(entry.value))
    }

    fn cleanup(&self) -> Result<()> {
        // The service performs its own expiry; nothing to sweep locally.
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.client.flush_all()
    }
}

// == Memcache Client Implementation ==
#[cfg(feature = "memcached-backend")]
impl RemoteClient for memcache::Client {
    fn set(&self, key: &str, value: &[u8], ttl_secs: u32) -> Result<()> {
        memcache::Client::set(self, key, value, ttl_secs)
            .map_err(|e| CacheError::Remote(e.to_string()))
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        memcache::Client::get::<Vec<u8>>(self, key).map_err(|e| CacheError::Remote(e.to_string()))
    }

    fn delete(&self, key: &str) -> Result<()> {
        memcache::Client::delete(self, key)
            .map(|_| ())
            .map_err(|e| CacheError::Remote(e.to_string()))
    }

    fn flush_all(&self) -> Result<()> {
        memcache::Client::flush(self).map_err(|e| CacheError::Remote(e.to_string()))
    }
}

#[cfg(feature = "memcached-backend")]
impl MemcachedCache<memcache::Client> {
    /// Connects to one or more memcached servers.
    ///
    /// Addresses use the `memcache` crate's URL form, e.g.
    /// `memcache://127.0.0.1:11211`. Connection failure is returned
    /// immediately.
    pub fn connect(servers: Vec<String>, timeout: i64) -> Result<Self> {
        let client =
            memcache::Client::connect(servers).map_err(|e| CacheError::Remote(e.to_string()))?;
        Ok(Self::with_client(client, timeout))
    }

    /// Connects to the servers named in loaded settings.
    pub fn from_config(config: &crate::config::Config) -> Result<Self> {
        Self::connect(config.memcached_servers.clone(), config.default_timeout)
    }
}

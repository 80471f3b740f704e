//! In-Memory Cache Module
//!
//! Process-local cache backend: a key/entry map behind a single mutex.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::cache::{Cache, CacheEntry, CacheStats, DEFAULT_TIMEOUT_SECS};
use crate::error::Result;

// == Memory Cache ==
/// In-memory cache backend.
///
/// One mutex guards the entry map, making every operation atomic with
/// respect to every other. The expiry check in `get` and the deletion it may
/// trigger happen under the same lock acquisition as the lookup.
#[derive(Debug)]
pub struct MemoryCache {
    /// Default timeout in seconds; <= 0 means entries never expire
    timeout: i64,
    /// Key -> entry storage
    entries: Mutex<HashMap<String, CacheEntry>>,
    /// Hit/miss counters
    stats: CacheStats,
}

impl MemoryCache {
    // == Constructor ==
    /// Creates an empty cache with the given default timeout in seconds.
    pub fn new(timeout: i64) -> Self {
        Self {
            timeout,
            entries: Mutex::new(HashMap::new()),
            stats: CacheStats::new(),
        }
    }

    /// Creates a cache configured from loaded settings.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(config.default_timeout)
    }

    /// Default timeout in seconds applied when `get` receives no override.
    pub fn timeout(&self) -> i64 {
        self.timeout
    }

    /// Current number of entries, including any not yet observed as expired.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    // == Stats ==
    /// Hit/miss counters for this instance.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_SECS)
    }
}

impl Cache for MemoryCache {
    fn store(&self, key: &str, value: Value) -> Result<()> {
        self.entries
            .lock()
            .insert(key.to_string(), CacheEntry::new(value));
        Ok(())
    }

    fn get(&self, key: &str, timeout: Option<i64>) -> Result<Option<Value>> {
        let mut entries = self.entries.lock();

        let Some(entry) = entries.get(key) else {
            self.stats.record_miss();
            return Ok(None);
        };

        let timeout = timeout.unwrap_or(self.timeout);
        if entry.is_expired(timeout) {
            // Check and delete under the same lock hold as the lookup.
            entries.remove(key);
            self.stats.record_miss();
            return Ok(None);
        }

        self.stats.record_hit();
        Ok(Some(entry.value.clone()))
    }

    fn cleanup(&self) -> Result<()> {
        let mut entries = self.entries.lock();

        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(self.timeout))
            .map(|(key, _)| key.clone())
            .collect();

        let removed = expired.len();
        for key in expired {
            entries.remove(&key);
        }

        if removed > 0 {
            debug!(removed, "memory cache cleanup removed expired entries");
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.entries.lock().clear();
        Ok(())
    }
}

// == Persisted Representation ==
/// Snapshot of the persistable parts of a `MemoryCache`.
///
/// The mutex and the hit/miss counters are transient coordination state:
/// restoring a cache reconstructs a fresh lock and zeroed counters.
#[derive(Serialize, Deserialize)]
struct PersistedState {
    timeout: i64,
    entries: HashMap<String, CacheEntry>,
}

impl Serialize for MemoryCache {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let state = PersistedState {
            timeout: self.timeout,
            entries: self.entries.lock().clone(),
        };
        state.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MemoryCache {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let state = PersistedState::deserialize(deserializer)?;
        Ok(Self {
            timeout: state.timeout,
            entries: Mutex::new(state.entries),
            stats: CacheStats::new(),
        })
    }
}

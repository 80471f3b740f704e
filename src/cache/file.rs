//! File Cache Module
//!
//! Filesystem-backed cache: one data file and one advisory lock file per
//! key, coordinated by a two-level locking protocol.
//!
//! Within a process, every instance pointed at the same directory shares one
//! registry lock, so parallel callers serialize before touching the OS
//! primitive. Across processes, coordination relies solely on the advisory
//! file locks; all cooperating processes must follow the same protocol.
//! Lock order is fixed: directory lock first, per-key file lock second.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::cache::lock::FileLock;
use crate::cache::{Cache, CacheEntry, CacheStats};
use crate::error::Result;

// == Directory Lock Registry ==
/// Process-wide registry mapping canonical cache directory -> shared lock.
static DIR_LOCKS: Lazy<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Returns the coordination lock for a cache directory, creating it on
/// first use. Callers must pass a canonicalized path so every spelling of
/// the same directory maps to the same lock.
fn dir_lock_for(dir: &Path) -> Arc<Mutex<()>> {
    let mut registry = DIR_LOCKS.lock();
    Arc::clone(
        registry
            .entry(dir.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(()))),
    )
}

// == File Cache ==
/// File-backed cache backend.
///
/// Each key maps to `hex(sha256(key))`, giving a stable fixed-length
/// filesystem-safe name regardless of key length or content. The data file
/// holds the serialized entry; the companion `.lock` file carries the
/// advisory lock.
#[derive(Debug)]
pub struct FileCache {
    /// Canonicalized cache directory
    cache_dir: PathBuf,
    /// Default timeout in seconds; <= 0 means entries never expire
    timeout: i64,
    /// In-process lock shared by all instances using `cache_dir`
    dir_lock: Arc<Mutex<()>>,
    /// Hit/miss counters
    stats: CacheStats,
}

impl FileCache {
    // == Constructor ==
    /// Opens a file cache rooted at `cache_dir`, creating the directory if
    /// it does not exist. Failure to create or resolve the directory is
    /// returned immediately; no partially-constructed cache is produced.
    pub fn new(cache_dir: impl Into<PathBuf>, timeout: i64) -> Result<Self> {
        let cache_dir = cache_dir.into();
        if !cache_dir.exists() {
            fs::create_dir_all(&cache_dir)?;
        }
        let cache_dir = cache_dir.canonicalize()?;
        let dir_lock = dir_lock_for(&cache_dir);

        Ok(Self {
            cache_dir,
            timeout,
            dir_lock,
            stats: CacheStats::new(),
        })
    }

    /// Creates a cache configured from loaded settings.
    pub fn from_config(config: &crate::config::Config) -> Result<Self> {
        Self::new(config.cache_dir.clone(), config.default_timeout)
    }

    /// Default timeout in seconds applied when `get` receives no override.
    pub fn timeout(&self) -> i64 {
        self.timeout
    }

    /// Directory holding the cache files.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    // == Stats ==
    /// Hit/miss counters for this instance.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    // == Path Derivation ==
    /// Maps a key to its data file path inside the cache directory.
    fn entry_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.cache_dir.join(hex::encode(digest))
    }

    /// Companion lock file for a data file.
    fn lock_path(path: &Path) -> PathBuf {
        path.with_extension("lock")
    }

    /// Removes a data file and its lock file. The lock file may already be
    /// gone if another reader raced the deletion; that is not an error.
    fn delete_entry_files(path: &Path) -> Result<()> {
        fs::remove_file(path)?;
        match fs::remove_file(Self::lock_path(path)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    // == Entry Read ==
    /// Reads the entry stored at `path` under the effective timeout,
    /// deleting it as a side effect if it has expired.
    ///
    /// Shared by `get` and `cleanup`; only `get` records hit/miss counters.
    fn read_entry(&self, path: &Path, timeout: i64) -> Result<Option<Value>> {
        if !path.exists() {
            return Ok(None);
        }

        let _dir_guard = self.dir_lock.lock();
        let Some(_file_lock) = FileLock::shared(&Self::lock_path(path))? else {
            // No lock file: the entry is considered never to have existed.
            return Ok(None);
        };

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            // Deleted by another process between the existence check and the
            // lock acquisition.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let entry: CacheEntry = serde_json::from_slice(&bytes)?;

        if entry.is_expired(timeout) {
            Self::delete_entry_files(path)?;
            return Ok(None);
        }

        Ok(Some(entry.value))
    }
}

impl Cache for FileCache {
    fn store(&self, key: &str, value: Value) -> Result<()> {
        let path = self.entry_path(key);
        let entry = CacheEntry::new(value);
        let bytes = serde_json::to_vec(&entry)?;

        let _dir_guard = self.dir_lock.lock();
        let _file_lock = FileLock::exclusive(&Self::lock_path(&path))?;
        fs::write(&path, bytes)?;
        Ok(())
    }

    fn get(&self, key: &str, timeout: Option<i64>) -> Result<Option<Value>> {
        let timeout = timeout.unwrap_or(self.timeout);
        match self.read_entry(&self.entry_path(key), timeout)? {
            Some(value) => {
                self.stats.record_hit();
                Ok(Some(value))
            }
            None => {
                self.stats.record_miss();
                Ok(None)
            }
        }
    }

    fn cleanup(&self) -> Result<()> {
        let mut removed = 0usize;

        for dir_entry in fs::read_dir(&self.cache_dir)? {
            let path = dir_entry?.path();
            if !path.is_file() || path.extension().is_some_and(|ext| ext == "lock") {
                continue;
            }
            // A get-style read deletes the entry if it is expired.
            if self.read_entry(&path, self.timeout)?.is_none() {
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(removed, "file cache cleanup removed expired entries");
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let _dir_guard = self.dir_lock.lock();

        for dir_entry in fs::read_dir(&self.cache_dir)? {
            let path = dir_entry?.path();
            if !path.is_file() || path.extension().is_some_and(|ext| ext == "lock") {
                continue;
            }
            Self::delete_entry_files(&path)?;
        }
        Ok(())
    }
}

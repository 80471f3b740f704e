//! Advisory File Lock Module
//!
//! Scoped acquisition of OS-level advisory locks on cache lock files.
//!
//! Every data file has a companion `<name>.lock` file that carries the
//! advisory lock: exclusive for writers, shared for readers. The lock is
//! released when the guard drops, so every exit path (including early
//! returns on error) releases it. Advisory locks only coordinate processes
//! that follow the same protocol.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::Path;

use fs2::FileExt;

use crate::error::{CacheError, Result};

// == File Lock Guard ==
/// An acquired advisory lock on a cache lock file.
///
/// Holds the lock file open for the lifetime of the guard; dropping the
/// guard unlocks and closes it.
#[derive(Debug)]
pub(crate) struct FileLock {
    file: File,
}

impl FileLock {
    // == Exclusive Acquisition ==
    /// Acquires an exclusive (writer) lock, creating the lock file if needed.
    ///
    /// Blocks until the lock is granted; there is no acquisition timeout.
    pub(crate) fn exclusive(lock_path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(lock_path)?;
        file.lock_exclusive()
            .map_err(|e| CacheError::Lock(format!("exclusive lock on {:?}: {}", lock_path, e)))?;
        Ok(Self { file })
    }

    // == Shared Acquisition ==
    /// Acquires a shared (reader) lock on an existing lock file.
    ///
    /// Returns `Ok(None)` if the lock file does not exist: the entry is
    /// treated as never having been written, which the caller reports as a
    /// miss. Blocks until the lock is granted; there is no acquisition
    /// timeout.
    pub(crate) fn shared(lock_path: &Path) -> Result<Option<Self>> {
        let file = match OpenOptions::new().read(true).open(lock_path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        file.lock_shared()
            .map_err(|e| CacheError::Lock(format!("shared lock on {:?}: {}", lock_path, e)))?;
        Ok(Some(Self { file }))
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

//! TTL Cleanup Task
//!
//! Background sweeper that periodically removes expired cache entries.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::Cache;

// == Cleanup Task Handle ==
/// Handle to a running cleanup sweeper thread.
///
/// Dropping the handle without calling [`stop`](CleanupTask::stop) detaches
/// the thread; it keeps sweeping until the process exits.
pub struct CleanupTask {
    shutdown: Sender<()>,
    handle: JoinHandle<()>,
}

impl CleanupTask {
    /// Signals the sweeper to stop and waits for the thread to finish.
    pub fn stop(self) {
        // Waking the receiver either way: an explicit send or, if the thread
        // already exited, the disconnect from dropping the sender.
        let _ = self.shutdown.send(());
        let _ = self.handle.join();
    }

    /// Returns true if the sweeper thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Spawns a thread that runs `cleanup()` on the cache at a fixed interval.
///
/// Sweep failures are logged and do not terminate the thread; the cache may
/// be shared with foreground callers that are still making progress.
///
/// # Arguments
/// * `cache` - Shared cache backend to sweep
/// * `cleanup_interval_secs` - Interval in seconds between sweeps
pub fn spawn_cleanup_task(cache: Arc<dyn Cache>, cleanup_interval_secs: u64) -> CleanupTask {
    let interval = Duration::from_secs(cleanup_interval_secs);
    let (shutdown, ticker) = mpsc::channel::<()>();

    let handle = std::thread::spawn(move || {
        info!(
            "starting TTL cleanup task with interval of {} seconds",
            cleanup_interval_secs
        );

        loop {
            match ticker.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => match cache.cleanup() {
                    Ok(()) => debug!("TTL cleanup sweep completed"),
                    Err(e) => warn!("TTL cleanup sweep failed: {}", e),
                },
                // Stop signal or handle dropped with the process shutting down.
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        info!("TTL cleanup task stopped");
    });

    CleanupTask { shutdown, handle }
}

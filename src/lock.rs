//! File-based locking to prevent concurrent sync runs.
//!
//! Two pipelines converging the same security group could issue conflicting
//! add/remove calls, so sync takes an exclusive advisory lock for the
//! duration of the run.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::Path;

const LOCK_FILE: &str = "/var/run/cfsync.lock";

/// A guard holding an exclusive lock on the cfsync lock file.
/// The lock is released when the guard is dropped.
pub struct LockGuard {
    _file: File,
}

impl LockGuard {
    /// Attempt to acquire the lock without blocking.
    /// Fails if another sync run is in flight.
    pub fn acquire() -> Result<Self> {
        let lock_path = Path::new(LOCK_FILE);
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).ok();
        }

        // create without truncate so creation and locking cannot race
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)
            .with_context(|| format!("Failed to open lock file: {}", LOCK_FILE))?;

        file.try_lock_exclusive().map_err(|_| {
            anyhow::anyhow!(
                "Another cfsync run is already in progress.\n\
                 Wait for it to complete, or remove {} if it crashed.",
                LOCK_FILE
            )
        })?;

        Ok(Self { _file: file })
    }
}

//! Cross-process advisory lock over the store.

use std::fs::{File, OpenOptions};
use std::path::Path;

use fs2::FileExt;
use tracing::{debug, info};

use crate::errors::{Result, TfvmError};

/// Exclusive lock held on `<root>/.lock` while the store is modified.
///
/// Released on drop.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
}

impl StoreLock {
    /// Acquires the lock, waiting for another tfvm process to finish first.
    ///
    /// # Errors
    ///
    /// Returns an `IoError` if the lock file cannot be opened or locked.
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| {
                TfvmError::io_error(format!("Failed to open lock file: {}", path.display()), e)
            })?;

        if FileExt::try_lock_exclusive(&file).is_err() {
            info!(path = %path.display(), "waiting for another tfvm process");
            FileExt::lock_exclusive(&file).map_err(|e| {
                TfvmError::io_error(format!("Failed to lock {}", path.display()), e)
            })?;
        }
        debug!(path = %path.display(), "store locked");

        Ok(Self { file })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

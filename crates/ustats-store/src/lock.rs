//! Advisory writer lock on a storage root.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::StoreError;

/// Exclusive lock on `<root>/.lock`, released on drop.
///
/// Only cooperating writers honor it; readers never take it.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Blocks until the lock for `root` is held, creating `root` if needed.
    pub fn acquire(root: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(root).map_err(|e| StoreError::io(root, e))?;
        let path = root.join(".lock");
        let file = File::create(&path).map_err(|e| StoreError::io(&path, e))?;
        FileExt::lock_exclusive(&file).map_err(|source| StoreError::Lock {
            path: path.clone(),
            source,
        })?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::debug!(path = ?self.path, error = %e, "failed to release store lock");
        }
    }
}

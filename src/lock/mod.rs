//! Advisory run lock.
//!
//! Only one pipeline run may touch a staging root at a time. The lock is an
//! exclusive `fs2` lock on a file inside the root and is released when the
//! guard is dropped.

use crate::error::{FigsyncError, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Take the lock without blocking; fails with `Locked` when another run
    /// holds it.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| FigsyncError::CreateDir { path: parent.to_path_buf(), source })?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| FigsyncError::io(format!("failed to open lock file {}", path.display()), e))?;

        file.try_lock_exclusive()
            .map_err(|_| FigsyncError::Locked { path: path.to_path_buf() })?;

        tracing::debug!("acquired run lock {}", path.display());
        Ok(Self { file, path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

//! Advisory lock held for the duration of a sync run

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::{Error, Result};

/// An exclusive advisory lock on a lock file.
///
/// Acquisition never blocks: if another run holds the lock the caller gets
/// [`Error::LockHeld`] immediately. The lock is released on drop.
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Try to acquire the lock at `path`, creating the file if needed.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| Error::io(path, e))?;

        if let Err(e) = file.try_lock_exclusive() {
            if e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
                || e.kind() == std::io::ErrorKind::WouldBlock
            {
                return Err(Error::LockHeld {
                    path: path.to_path_buf(),
                });
            }
            return Err(Error::LockFailed {
                path: path.to_path_buf(),
            });
        }

        // Holder pid, for whoever inspects a stale lock.
        let _ = file.set_len(0);
        let _ = writeln!(file, "{}", std::process::id());

        tracing::debug!(path = %path.display(), "Acquired run lock");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        tracing::debug!(path = %self.path.display(), "Released run lock");
    }
}

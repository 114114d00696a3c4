//! Cross-process advisory lock around the registry, vault, and live auth.
//!
//! Orbit's protocols touch three stores in sequence. Each store write is
//! atomic on its own; the lock serializes whole protocols between two
//! concurrent `orbit` invocations on the same base directory.
//!
//! Advisory locks are cooperative: only processes that take the lock are
//! serialized.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, info};

use crate::error::Error;
use crate::fs::{ensure_private_dir, PRIVATE_FILE_MODE};

/// A held exclusive lock. Released when dropped.
#[derive(Debug)]
pub struct ProfileLock {
    file: File,
    path: PathBuf,
}

impl ProfileLock {
    /// Acquire the lock at `path`, blocking while another process holds it.
    pub fn acquire(path: &Path) -> Result<Self, Error> {
        let lock_err = |source| Error::Lock {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            ensure_private_dir(parent).map_err(lock_err)?;
        }

        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(PRIVATE_FILE_MODE);
        }
        let file = options.open(path).map_err(lock_err)?;

        if file.try_lock_exclusive().is_err() {
            info!(path = %path.display(), "another orbit process is running; waiting for it to finish");
            file.lock_exclusive().map_err(lock_err)?;
        }
        debug!(path = %path.display(), "lock acquired");

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ProfileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        debug!(path = %self.path.display(), "lock released");
    }
}

//! Cross-process advisory sync lock.
//!
//! One lock file per sync target under a scratch directory, created with
//! `create_new` so acquisition is a single atomic filesystem primitive
//! rather than a check-then-create race. The file carries the owning pid
//! (informational only); its existence is the mutual-exclusion signal.

use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use strata_core::error::LockError;

/// Held sync lock. Released explicitly on clean exits; [`Drop`] removes
/// the file as a backstop for error paths.
#[derive(Debug)]
pub struct SyncLock {
    path: PathBuf,
    released: bool,
}

impl SyncLock {
    /// Acquire the lock for a target, failing fast if it is already held.
    pub fn acquire(dir: &Path, target: &str) -> Result<Self, LockError> {
        fs::create_dir_all(dir).map_err(|e| LockError::Io(e.to_string()))?;
        let path = Self::lock_path(dir, target);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                let _ = write!(file, "{}", std::process::id());
                Ok(Self { path, released: false })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(LockError::Held(target.to_owned()))
            }
            Err(e) => Err(LockError::Io(e.to_string())),
        }
    }

    /// Whether a lock for the target exists without trying to take it.
    pub fn is_held(dir: &Path, target: &str) -> bool {
        Self::lock_path(dir, target).exists()
    }

    /// Remove the lock file, consuming the guard.
    pub fn release(mut self) -> io::Result<()> {
        self.released = true;
        fs::remove_file(&self.path)
    }

    fn lock_path(dir: &Path, target: &str) -> PathBuf {
        dir.join(format!("{target}.pid"))
    }
}

impl Drop for SyncLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = fs::remove_file(&self.path);
        }
    }
}

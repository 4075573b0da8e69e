//! Exclusive flock(2) on the store lock file.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;
use tracing::debug;

/// Held for the lifetime of a store transaction. Dropping the file releases
/// the lock.
pub struct FileLock {
    _file: File,
}

impl FileLock {
    /// Acquire the lock, blocking while another process holds it.
    pub fn exclusive(path: &Path) -> Result<Self> {
        let file = open_lock_file(path)?;
        match file.try_lock_exclusive() {
            Ok(()) => return Ok(Self { _file: file }),
            Err(ref e) if is_contended(e) => {
                debug!(lock = %path.display(), "lock held by another process, waiting");
            }
            Err(e) => return Err(e).with_context(|| format!("try lock {}", path.display())),
        }
        file.lock_exclusive()
            .with_context(|| format!("acquire lock {}", path.display()))?;
        Ok(Self { _file: file })
    }
}

fn open_lock_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path)
        .with_context(|| format!("open lock file {}", path.display()))
}

fn is_contended(e: &std::io::Error) -> bool {
    // fs2 on Linux may surface EAGAIN as Other instead of WouldBlock
    e.kind() == std::io::ErrorKind::WouldBlock || e.raw_os_error() == Some(11)
}

use super::LOG_TARGET;
use crate::Result;
use fs4::fs_std::FileExt;
use ohno::IntoAppError;
use std::fs::{File, OpenOptions};
use std::path::Path;

const LOCK_FILE: &str = "ratings.lock";

/// Advisory lock on a rating directory, shared between `trust-score` processes.
///
/// Released when dropped.
#[derive(Debug)]
pub struct StoreLockGuard(File);

impl Drop for StoreLockGuard {
    fn drop(&mut self) {
        if let Err(e) = self.0.unlock() {
            log::warn!(target: LOG_TARGET, "Could not unlock rating store: {e:#}");
        }
    }
}

fn open_lock_file(dir: &Path) -> Result<File> {
    let lock_path = dir.join(LOCK_FILE);
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .into_app_err_with(|| format!("opening rating store lock '{}'", lock_path.display()))
}

/// Block until no other process is reading or writing ratings in `dir`.
pub fn lock_exclusive(dir: &Path) -> Result<StoreLockGuard> {
    let file = open_lock_file(dir)?;
    file.lock_exclusive()
        .into_app_err_with(|| format!("locking rating store '{}' for writing", dir.display()))?;
    log::trace!(target: LOG_TARGET, "Locked '{}' for writing", dir.display());
    Ok(StoreLockGuard(file))
}

/// Block until no other process is writing ratings in `dir`.
pub fn lock_shared(dir: &Path) -> Result<StoreLockGuard> {
    let file = open_lock_file(dir)?;
    FileExt::lock_shared(&file).into_app_err_with(|| format!("locking rating store '{}' for reading", dir.display()))?;
    log::trace!(target: LOG_TARGET, "Locked '{}' for reading", dir.display());
    Ok(StoreLockGuard(file))
}

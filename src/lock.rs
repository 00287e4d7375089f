//! Single-instance lock.
//!
//! The daemon holds an exclusive `flock` on `$XDG_RUNTIME_DIR/shabbat-alert.lock`
//! for its whole lifetime and writes its PID into the file. The file is opened
//! without truncation so a second instance that fails to lock it cannot wipe
//! the running daemon's PID.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::constants::LOCK_FILE_NAME;

/// Whether a failed `try_lock_*` means another process holds the lock.
fn is_contended(error: &io::Error) -> bool {
    error.kind() == fs2::lock_contended_error().kind()
}

pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    pub fn default_path() -> PathBuf {
        crate::utils::runtime_dir().join(LOCK_FILE_NAME)
    }

    /// Try to become the running instance.
    ///
    /// Returns `Ok(None)` when another process holds the lock.
    pub fn acquire(path: &Path) -> Result<Option<Self>> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("Failed to open lock file {}", path.display()))?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if is_contended(&e) => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to lock {}", path.display()));
            }
        }

        // Only the lock holder rewrites the content
        file.set_len(0).context("Failed to truncate lock file")?;
        file.seek(SeekFrom::Start(0))
            .context("Failed to rewind lock file")?;
        writeln!(file, "{}", std::process::id()).context("Failed to write lock file")?;
        file.flush().context("Failed to flush lock file")?;

        Ok(Some(Self {
            file,
            path: path.to_path_buf(),
        }))
    }

    /// Whether some process currently holds the lock at `path`.
    pub fn is_held(path: &Path) -> bool {
        let Ok(file) = OpenOptions::new().read(true).open(path) else {
            return false;
        };
        match FileExt::try_lock_shared(&file) {
            Ok(()) => {
                let _ = FileExt::unlock(&file);
                false
            }
            Err(e) => is_contended(&e),
        }
    }

    /// PID recorded by the current or last holder.
    pub fn holder_pid(path: &Path) -> Option<u32> {
        fs::read_to_string(path).ok()?.trim().parse().ok()
    }

    /// Unlock and remove the lock file.
    pub fn release(self) -> Result<()> {
        FileExt::unlock(&self.file).context("Failed to release lock")?;
        drop(self.file);
        fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove lock file {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_acquire_writes_pid() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join(LOCK_FILE_NAME);

        let lock = InstanceLock::acquire(&path).unwrap().unwrap();
        assert_eq!(InstanceLock::holder_pid(&path), Some(std::process::id()));
        assert!(InstanceLock::is_held(&path));

        lock.release().unwrap();
        assert!(!path.exists());
        assert!(!InstanceLock::is_held(&path));
    }

    #[test]
    fn test_second_acquire_fails_without_truncating() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join(LOCK_FILE_NAME);

        let first = InstanceLock::acquire(&path).unwrap().unwrap();
        assert!(InstanceLock::acquire(&path).unwrap().is_none());
        assert_eq!(InstanceLock::holder_pid(&path), Some(std::process::id()));

        first.release().unwrap();
    }

    #[test]
    fn test_only_contention_counts_as_held() {
        assert!(is_contended(&fs2::lock_contended_error()));
        assert!(!is_contended(&io::Error::from(io::ErrorKind::PermissionDenied)));
        assert!(!is_contended(&io::Error::other("bad file descriptor")));
    }

    #[test]
    fn test_acquire_reports_io_errors() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("missing").join(LOCK_FILE_NAME);

        assert!(InstanceLock::acquire(&path).is_err());
    }

    #[test]
    fn test_stale_lock_file_is_reused() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join(LOCK_FILE_NAME);
        fs::write(&path, "999999\n").unwrap();

        assert!(!InstanceLock::is_held(&path));
        let lock = InstanceLock::acquire(&path).unwrap().unwrap();
        assert_eq!(InstanceLock::holder_pid(&path), Some(std::process::id()));
        lock.release().unwrap();
    }
}

//! Cross-process exclusion over a snapshot file.

use crate::StoreError;
use fd_lock::{RwLock, RwLockWriteGuard};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Advisory lock file next to a snapshot.
///
/// A process that opens, changes and saves the snapshot holds the lock for
/// the whole sequence, so two writers can never overwrite each other's
/// commits. The lock is taken without waiting.
pub struct DataLock {
    path: PathBuf,
    file: RwLock<File>,
}

/// Held lock; released on drop.
pub struct DataLockGuard<'a> {
    _guard: RwLockWriteGuard<'a, File>,
}

impl DataLock {
    /// Open the lock file for `data_path`, creating it if needed.
    pub fn open(data_path: &Path) -> Result<Self, StoreError> {
        let path = lock_path(data_path);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::snapshot(&path, e.to_string()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| StoreError::snapshot(&path, e.to_string()))?;

        Ok(Self {
            path,
            file: RwLock::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take the lock for an operation on `campaign_id`.
    ///
    /// Fails with [`StoreError::DrawInProgress`] when another process holds it.
    pub fn try_acquire(&mut self, campaign_id: &str) -> Result<DataLockGuard<'_>, StoreError> {
        match self.file.try_write() {
            Ok(guard) => {
                debug!(path = %self.path.display(), "acquired data lock");
                Ok(DataLockGuard { _guard: guard })
            }
            Err(e) if is_contended(&e) => {
                warn!(path = %self.path.display(), campaign = campaign_id, "data file is locked");
                Err(StoreError::draw_in_progress(campaign_id))
            }
            Err(e) => Err(StoreError::snapshot(&self.path, e.to_string())),
        }
    }
}

/// `rifa.json` locks through `rifa.json.lock`.
fn lock_path(data_path: &Path) -> PathBuf {
    let mut name = data_path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

fn is_contended(e: &io::Error) -> bool {
    // ERROR_LOCK_VIOLATION
    e.kind() == io::ErrorKind::WouldBlock || (cfg!(windows) && e.raw_os_error() == Some(33))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_path_sits_next_to_data_file() {
        assert_eq!(
            lock_path(Path::new("data/rifa.json")),
            PathBuf::from("data/rifa.json.lock")
        );
    }

    #[test]
    fn test_second_holder_fails_fast() {
        let temp_dir = TempDir::new().unwrap();
        let data_path = temp_dir.path().join("nested").join("rifa.json");

        let mut first = DataLock::open(&data_path).unwrap();
        let mut second = DataLock::open(&data_path).unwrap();
        assert!(first.path().exists());

        let guard = first.try_acquire("camp2024").unwrap();
        let err = second.try_acquire("camp2024").err().unwrap();
        assert!(matches!(err, StoreError::DrawInProgress { ref campaign } if campaign == "camp2024"));

        // Released on drop
        drop(guard);
        assert!(second.try_acquire("camp2024").is_ok());
    }
}

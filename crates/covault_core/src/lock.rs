//! Lock file coordination.
//!
//! Every persistent store has a sidecar lock file at `<data path>.lock`.
//! The lock file signals "some process may be using this resource"; it is
//! advisory and may legitimately outlive both its creator and the data
//! file (crash, garbage-collection lag).
//!
//! Liveness is probed with an OS advisory lock (`fs2`), never by file
//! existence: a lock file whose exclusive lock can be taken has no live
//! holder and is adopted silently, while one that cannot be taken belongs
//! to a live process and the open fails with [`StoreError::Busy`].
//!
//! The one existence check that matters is the anomaly guard: a data file
//! that has vanished while its lock file remains must not be silently
//! recreated as an empty store - see [`LockCoordinator::preflight`].

use crate::error::{StoreError, StoreResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix appended to the data file name to form the lock path.
const LOCK_SUFFIX: &str = ".lock";

/// Holds the sidecar lock for one open store handle.
///
/// The coordinator keeps an exclusive OS advisory lock on the lock file
/// for the lifetime of the handle. Dropping without [`release`] leaves the
/// file behind (crash-like abandonment); the next opener detects it as
/// stale and adopts it.
///
/// [`release`]: LockCoordinator::release
#[derive(Debug)]
pub struct LockCoordinator {
    lock_path: PathBuf,
    file: Option<File>,
}

impl LockCoordinator {
    /// Returns the lock path for a data path: the full file name with
    /// `.lock` appended (`store.cvlt` -> `store.cvlt.lock`).
    #[must_use]
    pub fn lock_path(data_path: &Path) -> PathBuf {
        let mut name = data_path.as_os_str().to_os_string();
        name.push(LOCK_SUFFIX);
        PathBuf::from(name)
    }

    /// Rejects opening a store whose data file has vanished while its
    /// lock file is still present.
    ///
    /// # Errors
    ///
    /// Returns an I/O error stating that the database file is missing but
    /// a lock file is present.
    pub fn preflight(data_path: &Path) -> StoreResult<()> {
        if !data_path.exists() && Self::lock_path(data_path).exists() {
            return Err(StoreError::missing_file(format!(
                "database file is missing, but a lock file is present: {}",
                data_path.display()
            )));
        }
        Ok(())
    }

    /// Acquires the lock for a data path, creating the lock file if
    /// missing.
    ///
    /// Existence of the lock file alone never fails the acquire; only a
    /// live holder does.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Busy`] if another live process holds the
    /// lock, or an I/O error if the lock file cannot be created.
    pub fn acquire(data_path: &Path) -> StoreResult<Self> {
        let lock_path = Self::lock_path(data_path);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        if file.try_lock_exclusive().is_err() {
            return Err(StoreError::Busy {
                path: data_path.to_path_buf(),
            });
        }

        debug!(path = %lock_path.display(), "acquired store lock");
        Ok(Self {
            lock_path,
            file: Some(file),
        })
    }

    /// Releases the lock and deletes the lock file.
    ///
    /// The file is removed while the exclusive lock is still held, so no
    /// other live reference can exist at that point.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the lock file cannot be removed.
    pub fn release(mut self) -> StoreResult<()> {
        if let Some(file) = self.file.take() {
            fs::remove_file(&self.lock_path)?;
            let _ = file.unlock();
            debug!(path = %self.lock_path.display(), "released store lock");
        }
        Ok(())
    }

    /// Releases quietly, for error-path cleanup where the original error
    /// must be surfaced instead.
    pub(crate) fn release_quietly(self) {
        let lock_path = self.lock_path.clone();
        if let Err(error) = self.release() {
            tracing::warn!(path = %lock_path.display(), %error, "failed to release store lock");
        }
    }
}

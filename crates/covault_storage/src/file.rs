//! File-based storage backend for persistent stores.

use crate::backend::StoreBackend;
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A file-based snapshot backend.
///
/// This backend persists the snapshot image using OS file APIs.
/// Data survives process restarts once [`StoreBackend::sync`] has run.
///
/// # Durability
///
/// - `write_snapshot()` writes through the OS page cache
/// - `sync()` calls `File::sync_all()` to ensure data is on disk
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads.
/// Internal locking ensures consistent access.
///
/// # Example
///
/// ```no_run
/// use covault_storage::{FileBackend, StoreBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("data.cvlt")).unwrap();
/// backend.write_snapshot(b"snapshot image").unwrap();
/// backend.sync().unwrap();  // Ensure data is durable
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    file: RwLock<File>,
}

impl FileBackend {
    /// Opens or creates a file backend at the given path.
    ///
    /// If the file exists, it is opened for reading and writing.
    /// If it doesn't exist, a new empty file is created.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: RwLock::new(file),
        })
    }

    /// Opens or creates a file backend, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or file cannot be opened.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StoreBackend for FileBackend {
    fn load(&self) -> StorageResult<Vec<u8>> {
        let mut file = self.file.write();
        file.seek(SeekFrom::Start(0))?;

        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;

        Ok(buffer)
    }

    fn write_snapshot(&mut self, bytes: &[u8]) -> StorageResult<()> {
        let mut file = self.file.write();
        file.seek(SeekFrom::Start(0))?;
        file.write_all(bytes)?;
        // The file is deliberately not truncated: stale tail bytes are
        // masked by the snapshot envelope, and reservations must survive.
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        let file = self.file.write();
        file.sync_all()?;
        Ok(())
    }

    fn reserve(&mut self, min_bytes: u64) -> StorageResult<()> {
        let file = self.file.write();
        let current = file.metadata()?.len();

        if min_bytes > current {
            file.set_len(min_bytes)?;
            file.sync_all()?;
        }

        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        let file = self.file.read();
        Ok(file.metadata()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_create_new() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.cvlt");

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.size().unwrap(), 0);
        assert!(path.exists());
    }

    #[test]
    fn file_write_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.cvlt");

        let mut backend = FileBackend::open(&path).unwrap();
        backend.write_snapshot(b"snapshot bytes").unwrap();

        assert_eq!(backend.load().unwrap(), b"snapshot bytes");
        assert_eq!(backend.size().unwrap(), 14);
    }

    #[test]
    fn file_rewrite_never_shrinks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.cvlt");

        let mut backend = FileBackend::open(&path).unwrap();
        backend.write_snapshot(b"a longer first image").unwrap();
        backend.write_snapshot(b"short").unwrap();

        // Allocation keeps the old length; the tail is stale bytes.
        assert_eq!(backend.size().unwrap(), 20);
        assert_eq!(&backend.load().unwrap()[..5], b"short");
    }

    #[test]
    fn file_reserve_grows_allocation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.cvlt");

        let mut backend = FileBackend::open(&path).unwrap();
        backend.write_snapshot(b"img").unwrap();
        backend.reserve(4096).unwrap();

        assert_eq!(backend.size().unwrap(), 4096);
        // Reserved space is zero padding after the image.
        let data = backend.load().unwrap();
        assert_eq!(&data[..3], b"img");
        assert!(data[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn file_reserve_below_size_is_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.cvlt");

        let mut backend = FileBackend::open(&path).unwrap();
        backend.write_snapshot(b"0123456789").unwrap();
        backend.reserve(4).unwrap();

        assert_eq!(backend.size().unwrap(), 10);
    }

    #[test]
    fn file_persistence_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.cvlt");

        {
            let mut backend = FileBackend::open(&path).unwrap();
            backend.write_snapshot(b"persistent image").unwrap();
            backend.sync().unwrap();
        }

        {
            let backend = FileBackend::open(&path).unwrap();
            assert_eq!(backend.load().unwrap(), b"persistent image");
        }
    }

    #[test]
    fn file_create_with_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("path").join("test.cvlt");

        let backend = FileBackend::open_with_create_dirs(&path).unwrap();
        assert_eq!(backend.size().unwrap(), 0);
        assert!(path.exists());
    }

    #[test]
    fn file_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.cvlt");

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.path(), path);
    }
}

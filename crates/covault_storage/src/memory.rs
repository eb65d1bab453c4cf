//! In-memory storage backend for testing and memory-only stores.

use crate::backend::StoreBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;

/// An in-memory snapshot backend.
///
/// This backend keeps the snapshot image in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Memory-only stores that don't need persistence
///
/// `sync()` is a no-op - there is nothing more durable to sync to.
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use covault_storage::{MemoryBackend, StoreBackend};
///
/// let mut backend = MemoryBackend::new();
/// backend.write_snapshot(b"test data").unwrap();
/// assert_eq!(backend.size().unwrap(), 9);
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: RwLock<Vec<u8>>,
}

impl MemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory backend with a pre-existing image.
    ///
    /// Useful for testing open-time decoding.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }
}

impl StoreBackend for MemoryBackend {
    fn load(&self) -> StorageResult<Vec<u8>> {
        Ok(self.data.read().clone())
    }

    fn write_snapshot(&mut self, bytes: &[u8]) -> StorageResult<()> {
        let mut data = self.data.write();
        if bytes.len() > data.len() {
            data.resize(bytes.len(), 0);
        }
        data[..bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn reserve(&mut self, min_bytes: u64) -> StorageResult<()> {
        let min = usize::try_from(min_bytes).map_err(|_| StorageError::AllocationTooLarge {
            requested: min_bytes,
        })?;

        let mut data = self.data.write();
        if min > data.len() {
            data.resize(min, 0);
        }

        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.read().len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_starts_empty() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.size().unwrap(), 0);
        assert!(backend.load().unwrap().is_empty());
    }

    #[test]
    fn memory_write_and_load() {
        let mut backend = MemoryBackend::new();
        backend.write_snapshot(b"hello").unwrap();
        assert_eq!(backend.load().unwrap(), b"hello");
    }

    #[test]
    fn memory_with_data() {
        let backend = MemoryBackend::with_data(vec![1, 2, 3]);
        assert_eq!(backend.load().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn memory_rewrite_never_shrinks() {
        let mut backend = MemoryBackend::new();
        backend.write_snapshot(b"a longer first image").unwrap();
        backend.write_snapshot(b"short").unwrap();

        assert_eq!(backend.size().unwrap(), 20);
        assert_eq!(&backend.load().unwrap()[..5], b"short");
    }

    #[test]
    fn memory_reserve_grows() {
        let mut backend = MemoryBackend::new();
        backend.write_snapshot(b"img").unwrap();
        backend.reserve(64).unwrap();

        assert_eq!(backend.size().unwrap(), 64);
        let data = backend.load().unwrap();
        assert_eq!(&data[..3], b"img");
        assert!(data[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn memory_reserve_below_size_is_noop() {
        let mut backend = MemoryBackend::new();
        backend.write_snapshot(b"0123456789").unwrap();
        backend.reserve(4).unwrap();
        assert_eq!(backend.size().unwrap(), 10);
    }

    #[test]
    fn memory_sync_is_noop() {
        let mut backend = MemoryBackend::new();
        backend.write_snapshot(b"data").unwrap();
        assert!(backend.sync().is_ok());
    }
}

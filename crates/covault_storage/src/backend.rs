//! Storage backend trait definition.

use crate::error::StorageResult;

/// A low-level snapshot store for Covault.
///
/// Storage backends are **opaque byte stores**. They hold a single snapshot
/// image that the engine rewrites wholesale on commit. Covault owns all
/// snapshot format interpretation - backends do not understand the envelope,
/// groups, or tables.
///
/// # Invariants
///
/// - `load` returns the full current allocation, including any bytes past
///   the last snapshot image (the engine's envelope masks them)
/// - `write_snapshot` overwrites from offset zero and never shrinks the
///   allocation
/// - `reserve` only grows the allocation
/// - `sync` makes the current image durable
/// - Backends must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::MemoryBackend`] - For testing and memory-only stores
/// - [`super::FileBackend`] - For persistent storage
pub trait StoreBackend: Send + Sync + std::fmt::Debug {
    /// Reads the entire current allocation.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn load(&self) -> StorageResult<Vec<u8>>;

    /// Overwrites the snapshot image starting at offset zero.
    ///
    /// If the new image is shorter than the current allocation, the tail is
    /// left in place - the allocation never shrinks. Callers that need
    /// durability must follow up with [`StoreBackend::sync`].
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn write_snapshot(&mut self, bytes: &[u8]) -> StorageResult<()>;

    /// Syncs the current image and metadata to durable storage.
    ///
    /// After this returns successfully, the last written snapshot is
    /// guaranteed to survive process termination.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Grows the allocation to at least `min_bytes`.
    ///
    /// Pre-extending the allocation reduces the cost of later growth.
    /// A reservation at or below the current size is a no-op; the
    /// allocation is never shrunk.
    ///
    /// # Errors
    ///
    /// Returns an error if the allocation cannot be grown.
    fn reserve(&mut self, min_bytes: u64) -> StorageResult<()>;

    /// Returns the current allocation size in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;
}

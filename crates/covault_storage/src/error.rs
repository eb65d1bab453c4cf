//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A reservation exceeds what the backend can address.
    #[error("allocation of {requested} bytes exceeds addressable memory")]
    AllocationTooLarge {
        /// The requested allocation size.
        requested: u64,
    },
}

//! Error types for Covault core.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in Covault store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error: missing required file, creation failure, or the
    /// missing-data-with-present-lock anomaly.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] covault_storage::StorageError),

    /// Operation not permitted in the current transaction state.
    #[error("illegal state: {message}")]
    IllegalState {
        /// Description of the violated state rule.
        message: String,
    },

    /// Another live process holds the lock for this store.
    #[error("store busy: another process holds the lock for {path}")]
    Busy {
        /// Path of the contended store.
        path: PathBuf,
    },

    /// The snapshot envelope is corrupt or has an unsupported version.
    #[error("invalid store format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// A read transaction asked for a table that does not exist.
    #[error("table not found: {name}")]
    TableNotFound {
        /// Name of the missing table.
        name: String,
    },

    /// The store handle has been closed.
    #[error("store is closed")]
    Closed,
}

impl StoreError {
    /// Creates an illegal state error.
    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState {
            message: message.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates an I/O error with `NotFound` kind and the given message.
    pub fn missing_file(message: impl Into<String>) -> Self {
        Self::Io(io::Error::new(io::ErrorKind::NotFound, message.into()))
    }
}

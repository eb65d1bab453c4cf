//! # Covault Storage
//!
//! Snapshot storage backends for Covault.
//!
//! This crate provides the lowest-level storage abstraction for Covault.
//! Backends are **opaque byte stores** - they hold a single snapshot image
//! and do not interpret the bytes they store.
//!
//! ## Design Principles
//!
//! - Backends hold one snapshot image (load, overwrite, sync)
//! - No knowledge of the Covault snapshot envelope or table layout
//! - A backend never shrinks: rewrites and reservations only grow the
//!   allocation, so reserved space survives commits
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Backends
//!
//! - [`MemoryBackend`] - For testing and memory-only stores
//! - [`FileBackend`] - For persistent storage using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use covault_storage::{MemoryBackend, StoreBackend};
//!
//! let mut backend = MemoryBackend::new();
//! backend.write_snapshot(b"hello world").unwrap();
//! assert_eq!(backend.load().unwrap(), b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StoreBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::MemoryBackend;

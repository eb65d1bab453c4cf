//! # Covault Core
//!
//! A shared, file-backed (or memory-only) transactional store.
//!
//! One [`SharedStore`] handle connects to one database resource. A sidecar
//! `.lock` file coordinates access across processes, a [`Durability`] mode
//! decides what a commit means, and a [`TransactionGuard`] enforces that a
//! handle has at most one active transaction - read or write - at a time.
//!
//! This crate provides:
//! - Lock file coordination with OS-advisory liveness probing
//! - The `{Full, MemOnly, Async}` durability policy
//! - The single-active-transaction state machine
//! - The store façade with read/write transactions over named tables
//!
//! ## Example
//!
//! ```no_run
//! use covault_core::{Durability, SharedStore};
//! use std::path::Path;
//!
//! # fn main() -> covault_core::StoreResult<()> {
//! let store = SharedStore::open(Path::new("app.cvlt"), Durability::Full)?;
//!
//! let mut wt = store.begin_write()?;
//! wt.table("events").put("first", b"payload".to_vec());
//! wt.commit()?;
//!
//! let rt = store.begin_read()?;
//! assert!(rt.has_table("events"));
//! rt.end_read()?;
//!
//! store.close()?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod durability;
mod error;
mod flusher;
mod group;
mod guard;
mod lock;
mod store;

pub use config::Config;
pub use durability::Durability;
pub use error::{StoreError, StoreResult};
pub use group::{Group, Table};
pub use guard::{TransactionGuard, TxnState};
pub use lock::LockCoordinator;
pub use store::{ReadTransaction, SharedStore, WriteTransaction};

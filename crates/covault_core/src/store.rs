//! Shared store façade and transaction tokens.
//!
//! [`SharedStore`] is the primary entry point: one open connection to a
//! named database resource, shared across processes through a sidecar
//! lock file. A handle admits at most one active transaction at a time;
//! transactions hand out [`Table`] access and end explicitly via
//! [`WriteTransaction::commit`], [`WriteTransaction::rollback`], or
//! [`ReadTransaction::end_read`]. Dropping an unfinished token rolls the
//! transaction back.
//!
//! # Opening a Store
//!
//! ```rust,ignore
//! use covault_core::{Durability, SharedStore};
//! use std::path::Path;
//!
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
//! ```

use crate::config::Config;
use crate::durability::Durability;
use crate::error::{StoreError, StoreResult};
use crate::flusher::{Flusher, SharedBackend};
use crate::group::{Group, Table};
use crate::guard::{TransactionGuard, TxnState};
use crate::lock::LockCoordinator;
use covault_storage::{FileBackend, StoreBackend};
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// One open connection to a shared database resource.
///
/// The handle owns the sidecar lock (for persistent modes), the committed
/// snapshot, and the transaction guard. It is `Send + Sync`, but the
/// single-active-transaction rule applies to the handle as a whole - a
/// second thread's `begin_*` while a transaction is active fails the same
/// way a second call from the owning thread does.
pub struct SharedStore {
    path: PathBuf,
    config: Config,
    guard: TransactionGuard,
    committed: RwLock<Arc<Group>>,
    backend: Option<SharedBackend>,
    lock: Mutex<Option<LockCoordinator>>,
    flusher: Mutex<Option<Flusher>>,
    is_open: RwLock<bool>,
}

impl SharedStore {
    /// Opens or creates a store at `path` with the given durability.
    ///
    /// Equivalent to [`SharedStore::open_with_config`] with
    /// `file_must_exist = false`.
    ///
    /// # Errors
    ///
    /// See [`SharedStore::open_with_config`].
    pub fn open(path: &Path, durability: Durability) -> StoreResult<Self> {
        Self::open_with_config(path, Config::new().durability(durability))
    }

    /// Opens or creates a store at `path` with full configuration.
    ///
    /// For persistent modes the open sequence is: anomaly preflight, the
    /// `file_must_exist` check, lock acquisition, backend open/create, and
    /// snapshot decode. A failure after the lock is acquired releases it
    /// again - a failed open leaves no partial store behind.
    ///
    /// Under [`Durability::MemOnly`] no file is touched at all: the path
    /// only names the resource.
    ///
    /// # Errors
    ///
    /// - I/O error if the data file is missing while its lock file is
    ///   present, or if `file_must_exist` is set and the file is absent
    /// - [`StoreError::Busy`] if another live process holds the lock
    /// - [`StoreError::InvalidFormat`] for a corrupt snapshot envelope
    pub fn open_with_config(path: &Path, config: Config) -> StoreResult<Self> {
        if !config.durability.is_persistent() {
            debug!(path = %path.display(), "opened memory-only store");
            return Ok(Self {
                path: path.to_path_buf(),
                config,
                guard: TransactionGuard::new(),
                committed: RwLock::new(Arc::new(Group::new())),
                backend: None,
                lock: Mutex::new(None),
                flusher: Mutex::new(None),
                is_open: RwLock::new(true),
            });
        }

        LockCoordinator::preflight(path)?;

        let data_existed = path.exists();
        if config.file_must_exist && !data_existed {
            return Err(StoreError::missing_file(format!(
                "database file does not exist: {}",
                path.display()
            )));
        }

        let coordinator = LockCoordinator::acquire(path)?;

        // Create-or-fail: every failure past this point must release the
        // lock, and undo a file creation, so no partial store remains.
        let fail_open = |coordinator: LockCoordinator, err: StoreError| {
            coordinator.release_quietly();
            if !data_existed {
                let _ = std::fs::remove_file(path);
            }
            Err(err)
        };

        let (backend, committed) = match Self::open_backend(path, config.durability) {
            Ok(opened) => opened,
            Err(err) => return fail_open(coordinator, err),
        };

        let flusher = if config.durability == Durability::Async {
            match Flusher::spawn(Arc::clone(&backend)) {
                Ok(flusher) => Some(flusher),
                Err(err) => return fail_open(coordinator, err),
            }
        } else {
            None
        };

        debug!(path = %path.display(), durability = %config.durability, "opened shared store");
        Ok(Self {
            path: path.to_path_buf(),
            config,
            guard: TransactionGuard::new(),
            committed: RwLock::new(Arc::new(committed)),
            backend: Some(backend),
            lock: Mutex::new(Some(coordinator)),
            flusher: Mutex::new(flusher),
            is_open: RwLock::new(true),
        })
    }

    /// Opens the file backend and decodes the committed snapshot.
    fn open_backend(path: &Path, durability: Durability) -> StoreResult<(SharedBackend, Group)> {
        let backend = FileBackend::open(path)?;
        let bytes = backend.load()?;
        let committed = Group::decode(&bytes)?;

        let mut backend: Box<dyn StoreBackend> = Box::new(backend);
        if bytes.is_empty() {
            // Stamp a valid envelope into the fresh file, so a reservation
            // made before the first commit stays behind a decodable header.
            let image = committed.encode()?;
            backend.write_snapshot(&image)?;
            if durability.syncs_on_commit() {
                backend.sync()?;
            }
        }

        Ok((Arc::new(Mutex::new(backend)), committed))
    }

    /// Begins a read transaction.
    ///
    /// The transaction sees the committed snapshot as of this call.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if any transaction is already active (the
    /// existing transaction stays valid), or [`StoreError::Closed`].
    pub fn begin_read(&self) -> StoreResult<ReadTransaction<'_>> {
        self.ensure_open()?;
        self.guard.begin_read()?;
        let snapshot = Arc::clone(&*self.committed.read());
        Ok(ReadTransaction {
            store: self,
            snapshot,
            done: false,
        })
    }

    /// Begins a write transaction.
    ///
    /// Changes are staged against a working copy of the committed group
    /// and published by [`WriteTransaction::commit`].
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if any transaction is already active (the
    /// existing transaction stays valid), or [`StoreError::Closed`].
    pub fn begin_write(&self) -> StoreResult<WriteTransaction<'_>> {
        self.ensure_open()?;
        self.guard.begin_write()?;
        let working = Group::clone(&self.committed.read());
        Ok(WriteTransaction {
            store: self,
            working,
            done: false,
        })
    }

    /// Pre-extends the backing allocation to at least `min_bytes`, to
    /// reduce the cost of later growth.
    ///
    /// A safe no-op under [`Durability::MemOnly`]. The allocation never
    /// shrinks below a granted reservation on later opens.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Closed`] on a closed handle, or a storage
    /// error if the allocation cannot be grown.
    pub fn reserve(&self, min_bytes: u64) -> StoreResult<()> {
        self.ensure_open()?;
        let Some(backend) = self.backend.as_ref() else {
            return Ok(());
        };
        backend.lock().reserve(min_bytes)?;
        Ok(())
    }

    /// Returns the size of the backing allocation in bytes.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` under [`Durability::MemOnly`], which has no
    /// on-disk size, or [`StoreError::Closed`].
    pub fn size_on_disk(&self) -> StoreResult<u64> {
        self.ensure_open()?;
        let Some(backend) = self.backend.as_ref() else {
            return Err(StoreError::illegal_state(
                "memory-only store has no on-disk size",
            ));
        };
        Ok(backend.lock().size()?)
    }

    /// Closes the store.
    ///
    /// Joins the background flusher (draining queued syncs), releases the
    /// lock, and deletes the lock file. Calling `close` on an already
    /// closed handle is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` while a transaction is active; the store
    /// stays open and the transaction stays valid.
    pub fn close(&self) -> StoreResult<()> {
        let mut is_open = self.is_open.write();
        if !*is_open {
            return Ok(());
        }

        self.guard.ensure_idle_for_close()?;

        if let Some(flusher) = self.flusher.lock().take() {
            flusher.shutdown();
        }

        if let Some(coordinator) = self.lock.lock().take() {
            coordinator.release()?;
        }

        *is_open = false;
        debug!(path = %self.path.display(), "closed shared store");
        Ok(())
    }

    /// Whether the handle is still open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.is_open.read()
    }

    /// Returns the current transaction state of the handle.
    #[must_use]
    pub fn transaction_state(&self) -> TxnState {
        self.guard.state()
    }

    /// Returns the path naming the store resource.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the store's durability mode.
    #[must_use]
    pub fn durability(&self) -> Durability {
        self.config.durability
    }

    /// Ensures the handle is open.
    fn ensure_open(&self) -> StoreResult<()> {
        if *self.is_open.read() {
            Ok(())
        } else {
            Err(StoreError::Closed)
        }
    }

    /// Persists and publishes a committed group per the durability mode.
    fn commit_group(&self, working: Group) -> StoreResult<()> {
        if let Some(backend) = self.backend.as_ref() {
            let bytes = working.encode()?;
            {
                let mut backend = backend.lock();
                backend.write_snapshot(&bytes)?;
                if self.config.durability.syncs_on_commit() {
                    backend.sync()?;
                }
            }
            if let Some(flusher) = self.flusher.lock().as_ref() {
                flusher.request_sync();
            }
            debug!(bytes = bytes.len(), "committed snapshot");
        }

        *self.committed.write() = Arc::new(working);
        Ok(())
    }
}

impl Drop for SharedStore {
    fn drop(&mut self) {
        if self.is_open() && self.guard.state() == TxnState::Idle {
            if let Err(error) = self.close() {
                warn!(path = %self.path.display(), %error, "failed to close store on drop");
            }
        }
        // A handle dropped mid-transaction abandons its lock file; the
        // next opener detects it as stale.
    }
}

impl std::fmt::Debug for SharedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStore")
            .field("path", &self.path)
            .field("durability", &self.config.durability)
            .field("state", &self.guard.state())
            .field("is_open", &self.is_open())
            .finish_non_exhaustive()
    }
}

/// An active read transaction: a stable view of the committed snapshot.
///
/// Ends via [`ReadTransaction::end_read`]; dropping an unfinished token
/// releases the transaction slot implicitly.
#[derive(Debug)]
pub struct ReadTransaction<'store> {
    store: &'store SharedStore,
    snapshot: Arc<Group>,
    done: bool,
}

impl ReadTransaction<'_> {
    /// Looks up a table by name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TableNotFound`] if no such table exists in
    /// the snapshot.
    pub fn table(&self, name: &str) -> StoreResult<&Table> {
        self.snapshot
            .table(name)
            .ok_or_else(|| StoreError::TableNotFound {
                name: name.to_string(),
            })
    }

    /// Whether a table with the given name exists.
    #[must_use]
    pub fn has_table(&self, name: &str) -> bool {
        self.snapshot.has_table(name)
    }

    /// Iterates over table names in sorted order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.snapshot.table_names()
    }

    /// Returns the number of tables in the snapshot.
    #[must_use]
    pub fn table_count(&self) -> usize {
        self.snapshot.table_count()
    }

    /// Ends the read transaction, returning the handle to idle.
    ///
    /// # Errors
    ///
    /// Cannot fail from a live token; the `Result` mirrors the store's
    /// synchronous error surface.
    pub fn end_read(mut self) -> StoreResult<()> {
        self.done = true;
        self.store.guard.end_read()
    }
}

impl Drop for ReadTransaction<'_> {
    fn drop(&mut self) {
        if !self.done {
            let _ = self.store.guard.end_read();
        }
    }
}

/// An active write transaction: a working copy of the group, published on
/// commit and discarded on rollback.
///
/// Dropping an unfinished token rolls back.
#[derive(Debug)]
pub struct WriteTransaction<'store> {
    store: &'store SharedStore,
    working: Group,
    done: bool,
}

impl WriteTransaction<'_> {
    /// Returns the table with the given name, creating it if missing.
    pub fn table(&mut self, name: &str) -> &mut Table {
        self.working.table_mut_or_create(name)
    }

    /// Whether a table with the given name exists in the working copy.
    #[must_use]
    pub fn has_table(&self, name: &str) -> bool {
        self.working.has_table(name)
    }

    /// Iterates over table names in sorted order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.working.table_names()
    }

    /// Returns the number of tables in the working copy.
    #[must_use]
    pub fn table_count(&self) -> usize {
        self.working.table_count()
    }

    /// Commits the transaction: persists the working copy per the
    /// durability mode and publishes it as the committed snapshot.
    ///
    /// # Errors
    ///
    /// Returns an encoding or storage error if the snapshot cannot be
    /// persisted. The transaction slot is released either way - a failed
    /// commit behaves like a rollback of this token.
    pub fn commit(mut self) -> StoreResult<()> {
        self.done = true;
        let working = std::mem::take(&mut self.working);
        let result = self.store.commit_group(working);
        let released = self.store.guard.end_write();
        result.and(released)
    }

    /// Rolls back the transaction, discarding all staged changes.
    ///
    /// # Errors
    ///
    /// Cannot fail from a live token; the `Result` mirrors the store's
    /// synchronous error surface.
    pub fn rollback(mut self) -> StoreResult<()> {
        self.done = true;
        self.store.guard.end_write()
    }
}

impl Drop for WriteTransaction<'_> {
    fn drop(&mut self) {
        if !self.done {
            let _ = self.store.guard.end_write();
        }
    }
}

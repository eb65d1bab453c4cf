//! Transaction exclusivity guard.
//!
//! A store handle admits at most one active transaction - read or write -
//! at any time. The guard is a three-state machine behind a single mutex:
//!
//! ```text
//!            begin_read               begin_write
//!   ReadActive <------- Idle -------> WriteActive
//!            --------->      <-------
//!             end_read        end_write (commit / rollback)
//! ```
//!
//! Every transition is atomic under the mutex, and a rejected transition
//! leaves the state untouched - the caller's existing transaction remains
//! valid and must still be ended explicitly.

use crate::error::{StoreError, StoreResult};
use parking_lot::Mutex;

/// Transaction state of one store handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnState {
    /// No transaction is active.
    Idle,
    /// A read transaction is active.
    ReadActive,
    /// A write transaction is active.
    WriteActive,
}

/// Enforces the single-active-transaction invariant for one handle.
#[derive(Debug)]
pub struct TransactionGuard {
    state: Mutex<TxnState>,
}

impl TransactionGuard {
    /// Creates a guard in the `Idle` state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TxnState::Idle),
        }
    }

    /// Returns the current transaction state.
    #[must_use]
    pub fn state(&self) -> TxnState {
        *self.state.lock()
    }

    /// Admits a read transaction (`Idle` -> `ReadActive`).
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if any transaction is already active; the
    /// existing transaction is unaffected.
    pub fn begin_read(&self) -> StoreResult<()> {
        let mut state = self.state.lock();
        match *state {
            TxnState::Idle => {
                *state = TxnState::ReadActive;
                Ok(())
            }
            TxnState::ReadActive => Err(StoreError::illegal_state(
                "only one read transaction allowed",
            )),
            TxnState::WriteActive => Err(StoreError::illegal_state(
                "only one write transaction allowed",
            )),
        }
    }

    /// Admits a write transaction (`Idle` -> `WriteActive`).
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if any transaction is already active; the
    /// existing transaction is unaffected.
    pub fn begin_write(&self) -> StoreResult<()> {
        let mut state = self.state.lock();
        match *state {
            TxnState::Idle => {
                *state = TxnState::WriteActive;
                Ok(())
            }
            TxnState::ReadActive => Err(StoreError::illegal_state(
                "only one read transaction allowed",
            )),
            TxnState::WriteActive => Err(StoreError::illegal_state(
                "only one write transaction allowed",
            )),
        }
    }

    /// Ends a read transaction (`ReadActive` -> `Idle`).
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if no read transaction is active.
    pub fn end_read(&self) -> StoreResult<()> {
        let mut state = self.state.lock();
        match *state {
            TxnState::ReadActive => {
                *state = TxnState::Idle;
                Ok(())
            }
            _ => Err(StoreError::illegal_state("no active read transaction")),
        }
    }

    /// Ends a write transaction (`WriteActive` -> `Idle`), for both the
    /// commit and rollback paths.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if no write transaction is active.
    pub fn end_write(&self) -> StoreResult<()> {
        let mut state = self.state.lock();
        match *state {
            TxnState::WriteActive => {
                *state = TxnState::Idle;
                Ok(())
            }
            _ => Err(StoreError::illegal_state("no active write transaction")),
        }
    }

    /// Checks that the handle may be closed.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` while any transaction is active; the
    /// transaction remains valid.
    pub fn ensure_idle_for_close(&self) -> StoreResult<()> {
        match *self.state.lock() {
            TxnState::Idle => Ok(()),
            _ => Err(StoreError::illegal_state(
                "cannot close during an active transaction",
            )),
        }
    }
}

impl Default for TransactionGuard {
    fn default() -> Self {
        Self::new()
    }
}

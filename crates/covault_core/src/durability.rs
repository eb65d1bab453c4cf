//! Durability modes.
//!
//! The durability mode decides what a commit means:
//!
//! - [`Durability::Full`] - the snapshot is fsynced before `commit` returns
//! - [`Durability::MemOnly`] - nothing touches disk; no data file and no
//!   lock file exist for the store
//! - [`Durability::Async`] - the snapshot is written before `commit`
//!   returns and synced by a background flusher afterwards

use std::fmt;

/// Policy governing whether and when a commit becomes crash-durable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Durability {
    /// Every commit is durable before `commit()` returns.
    #[default]
    Full,
    /// No backing file persists; the store lives and dies in memory.
    MemOnly,
    /// Commit returns before the durability write completes; a background
    /// flusher finishes it.
    Async,
}

impl Durability {
    /// Whether this mode keeps a data file (and lock file) on disk.
    #[must_use]
    pub const fn is_persistent(self) -> bool {
        !matches!(self, Self::MemOnly)
    }

    /// Whether a commit must sync before returning.
    #[must_use]
    pub const fn syncs_on_commit(self) -> bool {
        matches!(self, Self::Full)
    }
}

impl fmt::Display for Durability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Full => "full",
            Self::MemOnly => "mem-only",
            Self::Async => "async",
        };
        f.write_str(name)
    }
}

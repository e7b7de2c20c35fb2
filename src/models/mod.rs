//! Content models: transactional, isolated views over workspace resources.
//!
//! ## Contents
//! - [`ContentModelFactory`], [`ContentModel`] plugin contracts
//! - [`ContentModels`] factory registry and transaction opener
//! - [`Transaction`] RAII handle bound to one factory and a fixed resource set
//! - [`LockState`] observable per-resource lock
//!
//! ## Isolation
//! ```text
//!              held: none   held: read(n)   held: write
//! want read      ok            ok            conflict
//! want write     ok          conflict        conflict
//! ```
//! Acquisition over a resource set is all-or-nothing; conflicts fail
//! immediately with `ModelError::TransactionConflict`.

use std::fmt;

mod factory;
mod locks;
mod registry;
mod transaction;

pub use factory::{ContentModel, ContentModelFactory};
pub use locks::LockState;
pub use registry::ContentModels;
pub use transaction::Transaction;

/// Access requested by a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Shared access; coexists with other readers.
    Read,
    /// Exclusive access; commit publishes `UpdatedResource`.
    Write,
}

impl AccessMode {
    /// Short stable name (for logs).
    pub fn as_str(self) -> &'static str {
        match self {
            AccessMode::Read => "read",
            AccessMode::Write => "write",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

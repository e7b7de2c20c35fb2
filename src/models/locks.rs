//! # Resource lock table.
//!
//! Readers/writer locks keyed by [`ResourceId`], acquired all-or-nothing over a
//! resource set and released by dropping the returned [`LockGuard`].
//!
//! ## Rules
//! - The requested set is sorted ascending and deduplicated; the first
//!   conflict in that order is the one reported.
//! - The whole set is checked and taken under one mutex, so two overlapping
//!   requests can never each hold a part of what the other needs.
//! - Acquisition never waits: a conflict fails at once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::ModelError;
use crate::models::AccessMode;
use crate::workspace::ResourceId;

/// Current lock on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// Held by `holders` read transactions.
    Read {
        /// Number of open read transactions.
        holders: usize,
    },
    /// Held by one write transaction.
    Write,
}

impl LockState {
    fn mode(self) -> AccessMode {
        match self {
            LockState::Read { .. } => AccessMode::Read,
            LockState::Write => AccessMode::Write,
        }
    }
}

#[derive(Default)]
pub(crate) struct LockTable {
    held: Mutex<HashMap<ResourceId, LockState>>,
}

impl LockTable {
    fn held(&self) -> MutexGuard<'_, HashMap<ResourceId, LockState>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquires `mode` on every id in `resources`, or nothing.
    pub(crate) fn acquire(
        self: &Arc<Self>,
        resources: &[ResourceId],
        mode: AccessMode,
    ) -> Result<LockGuard, ModelError> {
        let mut ids = resources.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut held = self.held();
        for id in &ids {
            if let Some(state) = held.get(id) {
                let compatible = mode == AccessMode::Read && state.mode() == AccessMode::Read;
                if !compatible {
                    return Err(ModelError::TransactionConflict {
                        resource: *id,
                        held: state.mode(),
                    });
                }
            }
        }

        for id in &ids {
            let next = match (mode, held.get(id)) {
                (AccessMode::Read, Some(LockState::Read { holders })) => LockState::Read {
                    holders: holders + 1,
                },
                (AccessMode::Read, _) => LockState::Read { holders: 1 },
                (AccessMode::Write, _) => LockState::Write,
            };
            held.insert(*id, next);
        }
        drop(held);

        Ok(LockGuard {
            table: Arc::clone(self),
            resources: ids,
            mode,
        })
    }

    pub(crate) fn state(&self, resource: ResourceId) -> Option<LockState> {
        self.held().get(&resource).copied()
    }

    fn release(&self, resources: &[ResourceId], mode: AccessMode) {
        let mut held = self.held();
        for id in resources {
            match (mode, held.get(id).copied()) {
                (AccessMode::Read, Some(LockState::Read { holders })) if holders > 1 => {
                    held.insert(*id, LockState::Read { holders: holders - 1 });
                }
                _ => {
                    held.remove(id);
                }
            }
        }
    }
}

/// Locks held by one transaction; released on drop.
pub(crate) struct LockGuard {
    table: Arc<LockTable>,
    resources: Vec<ResourceId>,
    mode: AccessMode,
}

impl LockGuard {
    /// Locked ids, ascending.
    pub(crate) fn resources(&self) -> &[ResourceId] {
        &self.resources
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.table.release(&self.resources, self.mode);
    }
}

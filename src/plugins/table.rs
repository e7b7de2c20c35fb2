//! # Capability table: identifier → handler.
//!
//! Plugins register handlers during startup; features look them up by
//! identifier at use time. Once the application started the table is sealed
//! and further registrations fail.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::error::PluginError;

/// Mapping from identifier to a shared handler.
pub struct CapabilityTable<H: ?Sized> {
    label: &'static str,
    entries: RwLock<HashMap<String, Arc<H>>>,
    sealed: AtomicBool,
}

impl<H: ?Sized> CapabilityTable<H> {
    /// Creates an empty table; `label` names it in errors and logs.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            entries: RwLock::new(HashMap::new()),
            sealed: AtomicBool::new(false),
        }
    }

    /// Registers `handler` under `identifier`.
    ///
    /// Fails with [`PluginError::Duplicate`] if the identifier is taken and with
    /// [`PluginError::Sealed`] after startup.
    pub fn register(&self, identifier: impl Into<String>, handler: Arc<H>) -> Result<(), PluginError> {
        let identifier = identifier.into();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if self.sealed.load(Ordering::Acquire) {
            return Err(PluginError::Sealed {
                table: self.label,
                identifier,
            });
        }
        if entries.contains_key(&identifier) {
            return Err(PluginError::Duplicate {
                table: self.label,
                identifier,
            });
        }
        debug!(table = self.label, %identifier, "capability registered");
        entries.insert(identifier, handler);
        Ok(())
    }

    /// Handler registered under `identifier`.
    pub fn get(&self, identifier: &str) -> Option<Arc<H>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identifier)
            .cloned()
    }

    /// Registered identifiers, sorted.
    pub fn identifiers(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = entries.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    /// Rejects all further registrations.
    pub fn seal(&self) {
        let _entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        self.sealed.store(true, Ordering::Release);
    }

    /// True once [`seal`](Self::seal) was called.
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }
}

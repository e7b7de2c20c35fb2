//! # Content-model registry.
//!
//! Holds the registered [`ContentModelFactory`]s and the resource lock table,
//! and opens [`Transaction`]s.
//!
//! ## Flow
//! ```text
//! open_transaction(factory, ids, mode)
//!   ├─► lookup factory          ── missing ──► UnknownFactory
//!   ├─► locks.acquire(ids, mode) ── busy   ──► TransactionConflict (nothing held)
//!   ├─► factory.open(ids, mode)  ── Err    ──► Open (locks released)
//!   └─► Transaction
//! ```
//!
//! ## Rules
//! - Factory identifiers are unique; re-registering fails with `DuplicateFactory`.
//! - `open_transaction` never waits for a lock. Retrying is the caller's call,
//!   made explicit by [`ContentModels::open_with_retry`].

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::time;
use tracing::{debug, info};

use crate::error::ModelError;
use crate::events::Broker;
use crate::models::locks::LockTable;
use crate::models::{AccessMode, ContentModelFactory, LockState, Transaction};
use crate::policies::BackoffPolicy;
use crate::workspace::{ResourceId, ResourceTree};

/// Registry of content-model factories.
pub struct ContentModels {
    factories: RwLock<HashMap<String, Arc<dyn ContentModelFactory>>>,
    locks: Arc<LockTable>,
    broker: Arc<Broker>,
    tree: Arc<ResourceTree>,
}

impl ContentModels {
    /// Creates an empty registry; commits publish through `broker` and resolve
    /// handles in `tree`.
    pub fn new(broker: Arc<Broker>, tree: Arc<ResourceTree>) -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
            locks: Arc::new(LockTable::default()),
            broker,
            tree,
        }
    }

    /// Registers `factory` under its identifier.
    pub fn register_factory(&self, factory: Arc<dyn ContentModelFactory>) -> Result<(), ModelError> {
        let id = factory.identifier().to_string();
        let mut factories = self.factories.write().unwrap_or_else(PoisonError::into_inner);
        if factories.contains_key(&id) {
            return Err(ModelError::DuplicateFactory { factory: id });
        }
        info!(factory = %id, "content-model factory registered");
        factories.insert(id, factory);
        Ok(())
    }

    /// Registered factory identifiers, sorted.
    pub fn factories(&self) -> Vec<String> {
        let factories = self.factories.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = factories.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    /// Opens a transaction of `factory` over `resources` with `mode` access.
    pub async fn open_transaction(
        &self,
        factory: &str,
        resources: &[ResourceId],
        mode: AccessMode,
    ) -> Result<Transaction, ModelError> {
        let builder = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(factory)
            .cloned()
            .ok_or_else(|| ModelError::UnknownFactory {
                factory: factory.to_string(),
            })?;

        let locks = self.locks.acquire(resources, mode).inspect_err(|err| {
            debug!(%factory, %mode, error = %err, "transaction conflict");
        })?;

        let model = builder
            .open(locks.resources(), mode)
            .await
            .map_err(|err| ModelError::Open {
                factory: factory.to_string(),
                reason: format!("{err:#}"),
            })?;

        debug!(%factory, %mode, resources = ?locks.resources(), "transaction opened");
        Ok(Transaction::new(
            Arc::from(factory),
            mode,
            model,
            locks,
            Arc::clone(&self.broker),
            Arc::clone(&self.tree),
        ))
    }

    /// [`open_transaction`](Self::open_transaction), retried on conflict.
    ///
    /// Makes at most `attempts` tries (at least one), sleeping `backoff.next(n)`
    /// between them. Errors other than a conflict are returned at once.
    pub async fn open_with_retry(
        &self,
        factory: &str,
        resources: &[ResourceId],
        mode: AccessMode,
        backoff: &BackoffPolicy,
        attempts: u32,
    ) -> Result<Transaction, ModelError> {
        let mut attempt: u32 = 0;
        loop {
            match self.open_transaction(factory, resources, mode).await {
                Err(err) if err.is_conflict() && attempt + 1 < attempts => {
                    let delay = backoff.next(attempt);
                    debug!(%factory, attempt, ?delay, "retrying after conflict");
                    time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Current lock on `resource` (`None` = free).
    pub fn lock_state(&self, resource: ResourceId) -> Option<LockState> {
        self.locks.state(resource)
    }
}

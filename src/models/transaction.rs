//! # Content-model transaction.
//!
//! A [`Transaction`] binds one factory's [`ContentModel`] to a fixed, locked
//! resource set. It ends in exactly one of three ways:
//!
//! ```text
//! commit()  ──► model.commit() ──► release locks ──► UpdatedResource per id (write mode)
//!                    └─ Err    ──► model.discard() ──► release locks ──► ModelError::Commit
//! discard() ──► model.discard() ──► release locks
//! drop      ──► model.discard() ──► release locks
//! ```
//!
//! Dropping is what releases the locks of a command that was cancelled while
//! holding a transaction: its future is dropped, and the transaction with it.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::ModelError;
use crate::events::{Broker, Event, EventKind};
use crate::models::locks::LockGuard;
use crate::models::{AccessMode, ContentModel};
use crate::workspace::{ResourceId, ResourceTree};

/// Open content-model transaction.
pub struct Transaction {
    factory: Arc<str>,
    mode: AccessMode,
    model: Option<Box<dyn ContentModel>>,
    locks: Option<LockGuard>,
    broker: Arc<Broker>,
    tree: Arc<ResourceTree>,
}

impl Transaction {
    pub(crate) fn new(
        factory: Arc<str>,
        mode: AccessMode,
        model: Box<dyn ContentModel>,
        locks: LockGuard,
        broker: Arc<Broker>,
        tree: Arc<ResourceTree>,
    ) -> Self {
        Self {
            factory,
            mode,
            model: Some(model),
            locks: Some(locks),
            broker,
            tree,
        }
    }

    /// Identifier of the factory that built the model.
    pub fn factory(&self) -> &str {
        &self.factory
    }

    /// Access mode of the transaction.
    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Locked resource ids, ascending.
    pub fn resources(&self) -> &[ResourceId] {
        match &self.locks {
            Some(locks) => locks.resources(),
            None => &[],
        }
    }

    /// The model as its concrete type `T`, if it is one.
    pub fn model<T: ContentModel>(&self) -> Option<&T> {
        self.model.as_deref()?.as_any().downcast_ref::<T>()
    }

    /// Mutable access to the model as its concrete type `T`.
    pub fn model_mut<T: ContentModel>(&mut self) -> Option<&mut T> {
        self.model.as_deref_mut()?.as_any_mut().downcast_mut::<T>()
    }

    /// Commits the model and releases the locks.
    ///
    /// On success a write transaction publishes one `UpdatedResource` per locked
    /// id; a read transaction publishes nothing. On failure the model is
    /// discarded and nothing is published.
    pub async fn commit(mut self) -> Result<(), ModelError> {
        let Some(mut model) = self.model.take() else {
            return Ok(());
        };
        let res = model.commit().await;
        if res.is_err() {
            model.discard();
        }
        let resources = self
            .locks
            .take()
            .map(|locks| locks.resources().to_vec())
            .unwrap_or_default();

        if let Err(err) = res {
            let reason = format!("{err:#}");
            warn!(factory = %self.factory, %reason, "content model commit failed");
            return Err(ModelError::Commit {
                factory: self.factory.to_string(),
                reason,
            });
        }

        debug!(factory = %self.factory, mode = %self.mode, resources = resources.len(), "transaction committed");
        if self.mode == AccessMode::Write {
            for id in resources {
                self.broker.publish(Event::resource(
                    EventKind::UpdatedResource,
                    id,
                    self.tree.handle(id),
                ));
            }
        }
        Ok(())
    }

    /// Discards the model and releases the locks; publishes nothing.
    pub fn discard(mut self) {
        self.abandon();
    }

    fn abandon(&mut self) {
        if let Some(mut model) = self.model.take() {
            model.discard();
            debug!(factory = %self.factory, mode = %self.mode, "transaction discarded");
        }
        self.locks.take();
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        self.abandon();
    }
}

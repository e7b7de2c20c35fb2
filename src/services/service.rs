//! # Service abstraction.
//!
//! A [`Service`] is a named, long-lived subsystem with a single asynchronous
//! initialization phase. During `initialize` it subscribes to the events it
//! cares about (and registers plugin capabilities); afterwards the broker
//! considers it live.
//!
//! # Example
//! ```
//! use async_trait::async_trait;
//! use std::sync::Arc;
//! use workbench::{Broker, Event, EventKind, HandlerFn, Service};
//!
//! struct Indexer;
//!
//! #[async_trait]
//! impl Service for Indexer {
//!     fn name(&self) -> &str { "indexer" }
//!
//!     async fn initialize(&self, broker: &Broker) -> anyhow::Result<()> {
//!         broker.subscribe(
//!             EventKind::AddedResource,
//!             HandlerFn::arc("indexer", |ev: Event| async move {
//!                 let _ = ev.resource;
//!                 Ok(())
//!             }),
//!         );
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Broker;

/// # Named subsystem with a one-time initialization phase.
///
/// The name is the service's identity and must be unique in the
/// [`ServiceRegistry`](crate::ServiceRegistry).
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Returns the unique service name.
    fn name(&self) -> &str;

    /// Runs once, before the service is considered live.
    ///
    /// Subscriptions made here are installed before the call returns.
    async fn initialize(&self, broker: &Broker) -> anyhow::Result<()>;
}

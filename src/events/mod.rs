//! Events: types, broker and (absent) wire codec.
//!
//! This module groups the event **data model** and the **broker** every
//! component publishes to and subscribes through.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload
//! - [`Broker`] per-kind publish/subscribe hub with per-handler workers
//! - [`codec`] cross-process (de)serialization, unimplemented by design
//!
//! ## Quick reference
//! - **Publishers**: `ServiceRegistry` (started), `Workspace` (connected, closing,
//!   added/deleted resources), `Transaction::commit` (updated resources),
//!   `Dispatcher` (task status), broker workers (handler failures).
//! - **Consumers**: `Dispatcher` (closing → cancel all) and any plugin service.

mod bus;
pub mod codec;
mod event;

pub use bus::Broker;
pub use event::{Event, EventKind};

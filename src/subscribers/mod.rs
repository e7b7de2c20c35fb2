//! # Event handlers for the workbench broker.
//!
//! This module provides the [`Subscribe`] trait, the closure adapter
//! [`HandlerFn`], and the per-handler delivery queue used by the
//! [`Broker`](crate::Broker).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Dispatcher ── publish(Event) ──► Broker ──► handlers subscribed to the kind
//!                                                 │
//!                                            ┌────┴────┬──────────┬─────────┐
//!                                            ▼         ▼          ▼         ▼
//!                                        LogWriter  Indexer  CancelOnClose  ...
//! ```

mod handler_fn;
#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

pub use handler_fn::HandlerFn;
#[cfg(feature = "logging")]
pub use log::LogWriter;
pub(crate) use set::{HandlerQueue, panic_message};
pub use subscribe::Subscribe;

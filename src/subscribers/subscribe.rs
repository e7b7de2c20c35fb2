//! # Core handler trait
//!
//! `Subscribe` is the extension point for reacting to broker events. Each
//! subscribed handler is driven by a dedicated worker fed by its own queue,
//! owned by the [`Broker`](crate::Broker).
//!
//! ## Contract
//! - Implementations may be slow (I/O, content-model transactions); they do
//!   **not** block the publisher nor other handlers.
//! - Returning `Err` (or panicking) is reported by the broker as a
//!   `HandlerFailed` event; the handler keeps receiving later events.
//! - The handler object is its identity: subscribing the same `Arc` to the
//!   same kind twice is a no-op. [`Subscribe::name`] labels logs and
//!   `HandlerFailed` reports and need not be unique.
//!
//! ## Example (skeleton)
//! ```rust
//! use async_trait::async_trait;
//! use workbench::{Event, Subscribe};
//!
//! struct Indexer;
//!
//! #[async_trait]
//! impl Subscribe for Indexer {
//!     async fn on_event(&self, ev: &Event) -> anyhow::Result<()> {
//!         // index ev.resource ...
//!         let _ = ev;
//!         Ok(())
//!     }
//!     fn name(&self) -> &str { "indexer" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event handlers.
///
/// Called from the handler's worker task. Implementations should avoid
/// blocking the async runtime (prefer async I/O and cooperative waits).
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event.
    async fn on_event(&self, event: &Event) -> anyhow::Result<()>;

    /// Label used in logs and `HandlerFailed` reports.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

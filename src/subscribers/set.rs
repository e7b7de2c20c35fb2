//! # Per-handler delivery queues.
//!
//! Every handler subscribed with the [`Broker`] gets one
//! [`HandlerQueue`]: an unbounded FIFO plus a worker task that drives
//! [`Subscribe::on_event`] one event at a time.
//!
//! ## Architecture
//! ```text
//! publish(event)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► handler1.on_event()
//!     │                      └──────► Err / panic → warn! + HandlerFailed
//!     ├──► [queue 2] ──► worker 2 ──► handler2.on_event()
//!     └──► [queue N] ──► worker N ──► handlerN.on_event()
//! ```
//!
//! ## Rules
//! - **Per-handler FIFO**: a handler sees events in the order they were pushed
//! - **No cross-handler ordering**: handler A may process event N while B processes N+5
//! - **Non-blocking push**: the queue is unbounded, so publishers never wait and
//!   no event is dropped for a live handler
//! - **Isolation**: an erroring or panicking handler is reported and keeps running
//!
//! ## Failure reporting
//! Failures are logged and re-published as `HandlerFailed`. A failure while
//! handling `HandlerFailed` itself is only logged, which keeps a broken
//! failure-listener from feeding on its own reports.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a handler uses `Arc<Mutex<T>>` and panics while holding the lock.

use std::any::Any;
use std::sync::{Arc, Weak};

use futures::FutureExt;
use tokio::{runtime::Handle, sync::mpsc, task::JoinHandle};
use tracing::warn;

use crate::events::{Broker, Event};
use crate::subscribers::Subscribe;

/// Queue and worker of a single handler.
pub(crate) struct HandlerQueue {
    name: Arc<str>,
    sender: mpsc::UnboundedSender<Arc<Event>>,
    worker: JoinHandle<()>,
}

impl HandlerQueue {
    /// Spawns the worker for `handler` on `runtime`.
    ///
    /// Failures are re-published through `broker` while it is alive.
    pub(crate) fn spawn(runtime: &Handle, handler: Arc<dyn Subscribe>, broker: Weak<Broker>) -> Self {
        let name: Arc<str> = Arc::from(handler.name());
        let (sender, mut rx) = mpsc::unbounded_channel::<Arc<Event>>();
        let worker_name = Arc::clone(&name);

        let worker = runtime.spawn(async move {
            while let Some(ev) = rx.recv().await {
                let outcome = std::panic::AssertUnwindSafe(handler.on_event(&ev))
                    .catch_unwind()
                    .await;
                let reason = match outcome {
                    Ok(Ok(())) => continue,
                    Ok(Err(err)) => format!("{err:#}"),
                    Err(panic) => format!("panicked: {}", panic_message(panic.as_ref())),
                };

                warn!(
                    handler = %worker_name,
                    event = ev.kind.as_str(),
                    seq = ev.seq,
                    %reason,
                    "event handler failed"
                );
                if ev.is_handler_failure() {
                    continue;
                }
                if let Some(broker) = broker.upgrade() {
                    broker.publish(Event::handler_failed(Arc::clone(&worker_name), reason));
                }
            }
        });

        Self {
            name,
            sender,
            worker,
        }
    }

    /// Handler label.
    pub(crate) fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// Enqueues one event; `false` if the worker is gone.
    pub(crate) fn push(&self, event: &Arc<Event>) -> bool {
        self.sender.send(Arc::clone(event)).is_ok()
    }

    /// Closes the queue and waits until the worker drained it.
    pub(crate) async fn close(self) {
        drop(self.sender);
        let _ = self.worker.await;
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

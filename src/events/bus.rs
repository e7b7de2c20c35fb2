//! # Event broker: the only channel between components.
//!
//! [`Broker`] routes each published [`Event`] to the handlers subscribed to its
//! [`EventKind`]. Delivery is decoupled: every subscribed handler owns a FIFO
//! queue and a worker (see `subscribers::set`), so `publish()` never waits on a slow
//! handler.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                         Handlers (per kind):
//!   Workspace   ──┐                          ┌──► [queue A] ─► worker A
//!   Dispatcher  ──┼──► Broker::publish ──────┼──► [queue B] ─► worker B
//!   Transaction ──┤    (kind → handler ids)  └──► [queue C] ─► worker C
//!   Registry    ──┘
//! ```
//!
//! ## Rules
//! - **Per-handler order**: a handler observes events in publish order, across
//!   every kind it subscribed to (one queue per handler, not per kind).
//! - **No cross-handler order**: one handler may lag behind another.
//! - **Idempotent subscribe**: identity is the handler object (the `Arc`
//!   allocation); subscribing the same handler to the same kind twice is a
//!   no-op. [`Subscribe::name`] is only a label, so two handlers sharing a name
//!   are still two handlers with two queues.
//! - **Isolation**: handler errors/panics are logged and re-published as
//!   `HandlerFailed`; delivery to every other handler continues.
//! - **Startup gate**: [`Broker::register_service`] runs one service
//!   initialization at a time; subscriptions made during it are installed
//!   before it returns.
//! - **No persistence**: an event published before a handler subscribed is not
//!   replayed to it.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use tokio::runtime::Handle;
use tracing::{debug, info, trace, warn};

use crate::error::RuntimeError;
use crate::events::{Event, EventKind};
use crate::services::Service;
use crate::subscribers::{HandlerQueue, Subscribe};

/// Identity of a subscribed handler: the address of its `Arc` allocation.
///
/// Stable while subscribed, since the queue's worker keeps the handler alive.
type HandlerKey = usize;

fn handler_key(handler: &Arc<dyn Subscribe>) -> HandlerKey {
    Arc::as_ptr(handler).cast::<()>() as usize
}

#[derive(Default)]
struct HandlerTable {
    queues: HashMap<HandlerKey, HandlerQueue>,
    by_kind: HashMap<EventKind, Vec<HandlerKey>>,
}

/// Asynchronous publish/subscribe hub.
///
/// Construct one per application and hand `Arc<Broker>` to every component
/// that needs it.
pub struct Broker {
    me: Weak<Broker>,
    runtime: Handle,
    table: RwLock<HandlerTable>,
    live: Mutex<HashSet<String>>,
    startup: tokio::sync::Mutex<()>,
}

impl Broker {
    /// Creates a broker whose handler workers run on the current tokio runtime.
    ///
    /// Fails with [`RuntimeError::BrokerInit`] outside a runtime: without one the
    /// broker has nowhere to run its delivery queues.
    pub fn new() -> Result<Arc<Self>, RuntimeError> {
        let runtime = Handle::try_current().map_err(|e| RuntimeError::BrokerInit {
            reason: e.to_string(),
        })?;
        Ok(Self::with_runtime(runtime))
    }

    /// Creates a broker whose handler workers run on `runtime`.
    pub fn with_runtime(runtime: Handle) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            runtime,
            table: RwLock::new(HandlerTable::default()),
            live: Mutex::new(HashSet::new()),
            startup: tokio::sync::Mutex::new(()),
        })
    }

    /// Runtime hosting the broker's workers.
    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    fn read(&self) -> RwLockReadGuard<'_, HandlerTable> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HandlerTable> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `service`'s initialization phase and marks it live.
    ///
    /// Initializations are serialized: a second call waits until the first one
    /// finished. Calling this from inside an `initialize` deadlocks.
    pub async fn register_service(&self, service: Arc<dyn Service>) -> Result<(), RuntimeError> {
        let _gate = self.startup.lock().await;
        let name = service.name().to_string();

        debug!(service = %name, "initializing service");
        if let Err(err) = service.initialize(self).await {
            let reason = format!("{err:#}");
            warn!(service = %name, %reason, "service initialization failed");
            return Err(RuntimeError::ServiceInit { name, reason });
        }

        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.clone());
        info!(service = %name, "service live");
        Ok(())
    }

    /// True once `service` finished its initialization phase.
    pub fn is_live(&self, service: &str) -> bool {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(service)
    }

    /// Subscribes `handler` to every future event of `kind`.
    ///
    /// Returns `false` if this same handler already listens to `kind`. A
    /// different handler that happens to share its name is subscribed normally.
    pub fn subscribe(&self, kind: EventKind, handler: Arc<dyn Subscribe>) -> bool {
        let mut guard = self.write();
        let table = &mut *guard;
        let key = handler_key(&handler);

        let subscribed = table.by_kind.entry(kind).or_default();
        if subscribed.contains(&key) {
            debug!(handler = handler.name(), event = kind.as_str(), "already subscribed");
            return false;
        }
        subscribed.push(key);

        if !table.queues.contains_key(&key) {
            if table.queues.values().any(|q| &**q.name() == handler.name()) {
                debug!(handler = handler.name(), "another handler already uses this name");
            }
            let queue = HandlerQueue::spawn(&self.runtime, handler, self.me.clone());
            table.queues.insert(key, queue);
        }
        debug!(handler = %table.queues[&key].name(), event = kind.as_str(), "subscribed");
        true
    }

    /// Subscribes `handler` to every [`EventKind`]; returns how many were new.
    pub fn subscribe_all(&self, handler: Arc<dyn Subscribe>) -> usize {
        EventKind::ALL
            .iter()
            .filter(|kind| self.subscribe(**kind, Arc::clone(&handler)))
            .count()
    }

    /// Number of handlers subscribed to `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.read().by_kind.get(&kind).map_or(0, Vec::len)
    }

    /// Delivers `event` to every handler currently subscribed to its kind.
    ///
    /// Returns immediately; handlers process it on their own workers.
    pub fn publish(&self, event: Event) {
        let ev = Arc::new(event);
        let table = self.read();
        let Some(keys) = table.by_kind.get(&ev.kind) else {
            trace!(event = ev.kind.as_str(), seq = ev.seq, "no handlers");
            return;
        };

        for key in keys {
            if let Some(queue) = table.queues.get(key) {
                if !queue.push(&ev) {
                    warn!(handler = %queue.name(), event = ev.kind.as_str(), "dropped event: worker closed");
                }
            }
        }
    }

    /// Closes every handler queue and waits until the workers drained them.
    ///
    /// Events published afterwards reach nobody. Must not be awaited from inside
    /// a handler (it would wait for its own worker).
    pub async fn shutdown(&self) {
        let queues: Vec<HandlerQueue> = {
            let mut table = self.write();
            table.by_kind.clear();
            table.queues.drain().map(|(_, q)| q).collect()
        };
        debug!(handlers = queues.len(), "draining handler queues");
        for queue in queues {
            queue.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscribers::HandlerFn;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    fn recorder(name: &'static str) -> (Arc<dyn Subscribe>, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handler = HandlerFn::arc(name, move |ev: Event| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(ev);
                Ok(())
            }
        });
        (handler, rx)
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
        timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("event not delivered in time")
            .expect("channel closed")
    }

    #[test]
    fn broker_needs_a_runtime() {
        let err = match Broker::new() {
            Err(err) => err,
            Ok(_) => panic!("broker created outside a runtime"),
        };
        assert_eq!(err.as_label(), "runtime_broker_init");
    }

    #[tokio::test]
    async fn handler_sees_events_in_publish_order() {
        let broker = Broker::new().unwrap();
        let (handler, mut rx) = recorder("ordered");
        broker.subscribe(EventKind::AddedResource, handler.clone());
        broker.subscribe(EventKind::DeletedResource, handler);

        let mut published = Vec::new();
        for i in 0..200u64 {
            let kind = if i % 3 == 0 {
                EventKind::DeletedResource
            } else {
                EventKind::AddedResource
            };
            let ev = Event::new(kind).with_resource(i.into());
            published.push(ev.seq);
            broker.publish(ev);
        }

        for seq in published {
            assert_eq!(next(&mut rx).await.seq, seq);
        }
    }

    #[tokio::test]
    async fn subscribe_is_idempotent_per_handler_and_kind() {
        let broker = Broker::new().unwrap();
        let (handler, mut rx) = recorder("once");
        assert!(broker.subscribe(EventKind::ApplicationStarted, handler.clone()));
        assert!(!broker.subscribe(EventKind::ApplicationStarted, handler));
        assert_eq!(broker.handler_count(EventKind::ApplicationStarted), 1);

        broker.publish(Event::new(EventKind::ApplicationStarted));
        next(&mut rx).await;
        broker.shutdown().await;
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn handlers_sharing_a_name_keep_their_own_deliveries() {
        let broker = Broker::new().unwrap();
        let (adder, mut added) = recorder("indexer");
        let (deleter, mut deleted) = recorder("indexer");
        assert!(broker.subscribe(EventKind::AddedResource, adder));
        assert!(broker.subscribe(EventKind::DeletedResource, deleter));

        broker.publish(Event::new(EventKind::DeletedResource).with_resource(7u64.into()));
        broker.publish(Event::new(EventKind::AddedResource).with_resource(8u64.into()));

        let ev = next(&mut deleted).await;
        assert_eq!((ev.kind, ev.resource), (EventKind::DeletedResource, Some(7u64.into())));
        let ev = next(&mut added).await;
        assert_eq!((ev.kind, ev.resource), (EventKind::AddedResource, Some(8u64.into())));

        broker.shutdown().await;
        assert!(added.recv().await.is_none());
        assert!(deleted.recv().await.is_none());
    }

    #[tokio::test]
    async fn failing_handlers_do_not_block_others() {
        let broker = Broker::new().unwrap();
        let erring = HandlerFn::arc("erring", |_ev: Event| async { anyhow::bail!("cannot index") });
        let panicking = HandlerFn::arc("panicking", |_ev: Event| async { panic!("boom") });
        let (healthy, mut rx) = recorder("healthy");
        let (failures, mut failed_rx) = recorder("failures");

        broker.subscribe(EventKind::AddedResource, erring);
        broker.subscribe(EventKind::AddedResource, panicking);
        broker.subscribe(EventKind::AddedResource, healthy);
        broker.subscribe(EventKind::HandlerFailed, failures);

        for i in 0..3u64 {
            broker.publish(Event::new(EventKind::AddedResource).with_resource(i.into()));
        }
        for i in 0..3u64 {
            assert_eq!(next(&mut rx).await.resource, Some(i.into()));
        }

        let mut reports = Vec::new();
        for _ in 0..6 {
            let ev = next(&mut failed_rx).await;
            reports.push((ev.handler.unwrap().to_string(), ev.reason.unwrap().to_string()));
        }
        assert_eq!(reports.iter().filter(|(h, _)| h == "erring").count(), 3);
        assert!(
            reports
                .iter()
                .any(|(h, r)| h == "panicking" && r == "panicked: boom")
        );
    }

    #[tokio::test]
    async fn failing_failure_handler_is_not_republished() {
        let broker = Broker::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let broken = HandlerFn::arc("broken-listener", move |_ev: Event| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { anyhow::bail!("still broken") }
        });
        broker.subscribe(EventKind::HandlerFailed, broken);

        broker.publish(Event::handler_failed("someone", "x"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn publish_does_not_wait_for_slow_handlers() {
        let broker = Broker::new().unwrap();
        let slow = HandlerFn::arc("slow", |_ev: Event| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        });
        let (fast, mut rx) = recorder("fast");
        broker.subscribe(EventKind::UpdatedResource, slow);
        broker.subscribe(EventKind::UpdatedResource, fast);

        for _ in 0..10 {
            broker.publish(Event::new(EventKind::UpdatedResource));
        }
        for _ in 0..10 {
            next(&mut rx).await;
        }
    }

    struct Listener {
        tx: mpsc::UnboundedSender<Event>,
    }

    #[async_trait]
    impl Subscribe for Listener {
        async fn on_event(&self, event: &Event) -> anyhow::Result<()> {
            let _ = self.tx.send(event.clone());
            Ok(())
        }

        fn name(&self) -> &str {
            "listener"
        }
    }

    struct SubscribingService {
        tx: mpsc::UnboundedSender<Event>,
    }

    #[async_trait]
    impl Service for SubscribingService {
        fn name(&self) -> &str {
            "subscribing"
        }

        async fn initialize(&self, broker: &Broker) -> anyhow::Result<()> {
            tokio::task::yield_now().await;
            broker.subscribe(
                EventKind::DatabaseConnected,
                Arc::new(Listener { tx: self.tx.clone() }),
            );
            Ok(())
        }
    }

    struct BrokenService;

    #[async_trait]
    impl Service for BrokenService {
        fn name(&self) -> &str {
            "broken"
        }

        async fn initialize(&self, _broker: &Broker) -> anyhow::Result<()> {
            anyhow::bail!("missing index directory")
        }
    }

    #[tokio::test]
    async fn subscriptions_from_initialize_see_later_events() {
        let broker = Broker::new().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        broker
            .register_service(Arc::new(SubscribingService { tx }))
            .await
            .unwrap();
        assert!(broker.is_live("subscribing"));

        broker.publish(Event::new(EventKind::DatabaseConnected));
        assert_eq!(next(&mut rx).await.kind, EventKind::DatabaseConnected);
    }

    #[tokio::test]
    async fn failed_initialization_is_not_live() {
        let broker = Broker::new().unwrap();
        let err = broker.register_service(Arc::new(BrokenService)).await.unwrap_err();
        assert!(matches!(err, RuntimeError::ServiceInit { ref reason, .. } if reason == "missing index directory"));
        assert!(!broker.is_live("broken"));
    }
}

//! # Workspace: the feature orchestrating the resource tree.
//!
//! The [`ResourceTree`] itself never publishes; every structural change that
//! others must hear about goes through [`Workspace`], which mutates the tree
//! and then publishes the matching resource event.
//!
//! ```text
//! open()            ──► publish DatabaseConnected
//! add_resource()    ──► tree.attach ──► publish AddedResource
//! delete_resource() ──► tree.remove ──► publish DeletedResource (per removed node, pre-order)
//! close()           ──► publish ClosingWorkspace
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::error::TreeError;
use crate::events::{Broker, Event, EventKind};
use crate::workspace::{ResourceHandle, ResourceId, ResourceTree};

/// Owner of the resource tree.
pub struct Workspace {
    broker: Arc<Broker>,
    tree: Arc<ResourceTree>,
    open: AtomicBool,
}

impl Workspace {
    /// Creates a closed workspace over `tree`.
    pub fn new(broker: Arc<Broker>, tree: Arc<ResourceTree>) -> Self {
        Self {
            broker,
            tree,
            open: AtomicBool::new(false),
        }
    }

    /// Marks the workspace open and announces that persistence is ready.
    pub fn open(&self) {
        self.open.store(true, Ordering::Release);
        info!(resources = self.tree.len(), "workspace opened");
        self.broker.publish(Event::new(EventKind::DatabaseConnected));
    }

    /// True between [`open`](Self::open) and [`close`](Self::close).
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Announces shutdown; listeners cancel outstanding work.
    ///
    /// Only the first call after `open` publishes.
    pub fn close(&self) {
        if self.open.swap(false, Ordering::AcqRel) {
            info!("workspace closing");
            self.broker.publish(Event::new(EventKind::ClosingWorkspace));
        }
    }

    /// The resource tree (read access and navigation).
    pub fn tree(&self) -> &Arc<ResourceTree> {
        &self.tree
    }

    /// Attaches `handle` below `parent` (or as a root) and publishes `AddedResource`.
    pub fn add_resource(
        &self,
        parent: Option<ResourceId>,
        handle: impl Into<ResourceHandle>,
    ) -> Result<ResourceId, TreeError> {
        let handle = handle.into();
        let id = self.tree.attach(parent, handle.clone())?;
        debug!(resource = %id, %handle, "resource added");
        self.broker
            .publish(Event::resource(EventKind::AddedResource, id, Some(handle)));
        Ok(id)
    }

    /// Removes `node` with its subtree and publishes one `DeletedResource` per removed node.
    ///
    /// Returns the removed ids in pre-order.
    pub fn delete_resource(&self, node: ResourceId) -> Result<Vec<ResourceId>, TreeError> {
        let removed = self.tree.remove(node)?;
        debug!(resource = %node, removed = removed.len(), "resources deleted");
        Ok(removed
            .into_iter()
            .map(|(id, handle)| {
                self.broker
                    .publish(Event::resource(EventKind::DeletedResource, id, Some(handle)));
                id
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscribers::HandlerFn;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn recorder(broker: &Broker) -> mpsc::UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        let handler = HandlerFn::arc("workspace-recorder", move |ev: Event| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(ev);
                Ok(())
            }
        });
        broker.subscribe_all(handler);
        rx
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("event not delivered in time")
            .expect("channel closed")
    }

    #[tokio::test]
    async fn structural_changes_are_announced() {
        let broker = Broker::new().unwrap();
        let mut rx = recorder(&broker);
        let ws = Workspace::new(Arc::clone(&broker), Arc::new(ResourceTree::new()));

        ws.open();
        assert_eq!(next(&mut rx).await.kind, EventKind::DatabaseConnected);

        let jar = ws.add_resource(None, "app.jar").unwrap();
        let class = ws.add_resource(Some(jar), "app.jar!/Main.class").unwrap();
        for id in [jar, class] {
            let ev = next(&mut rx).await;
            assert_eq!(ev.kind, EventKind::AddedResource);
            assert_eq!(ev.resource, Some(id));
        }

        assert_eq!(ws.delete_resource(jar).unwrap(), vec![jar, class]);
        for id in [jar, class] {
            let ev = next(&mut rx).await;
            assert_eq!(ev.kind, EventKind::DeletedResource);
            assert_eq!(ev.resource, Some(id));
        }
        assert!(ws.tree().is_empty());

        ws.close();
        ws.close();
        assert_eq!(next(&mut rx).await.kind, EventKind::ClosingWorkspace);
        assert!(!ws.is_open());
    }

    #[tokio::test]
    async fn failed_attach_publishes_nothing() {
        let broker = Broker::new().unwrap();
        let mut rx = recorder(&broker);
        let ws = Workspace::new(broker, Arc::new(ResourceTree::new()));

        let err = ws.add_resource(Some(ResourceId::new(9)), "orphan").unwrap_err();
        assert_eq!(err, TreeError::ParentNotFound { parent: ResourceId::new(9) });
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(rx.try_recv().is_err());
    }
}

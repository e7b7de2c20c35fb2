use std::sync::Arc;

use crate::{
    commands::Dispatcher,
    config::Config,
    error::RuntimeError,
    events::Broker,
    models::ContentModels,
    plugins::Plugins,
    services::ServiceRegistry,
    subscribers::Subscribe,
    workspace::{ResourceTree, Workspace},
};

use super::workbench::Workbench;

/// Builder for a [`Workbench`].
pub struct WorkbenchBuilder {
    cfg: Config,
    observers: Vec<Arc<dyn Subscribe>>,
}

impl WorkbenchBuilder {
    /// Creates a builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            observers: Vec::new(),
        }
    }

    /// Adds a handler subscribed to every event kind before anything is published.
    pub fn with_observer(mut self, observer: Arc<dyn Subscribe>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Adds several observers (see [`with_observer`](Self::with_observer)).
    pub fn with_observers(mut self, observers: impl IntoIterator<Item = Arc<dyn Subscribe>>) -> Self {
        self.observers.extend(observers);
        self
    }

    /// Builds the runtime components:
    /// - the broker (fails with `RuntimeError::BrokerInit` outside a tokio runtime)
    /// - resource tree and workspace
    /// - content-model registry and plugin tables
    /// - dispatcher and service registry
    pub fn build(self) -> Result<Workbench, RuntimeError> {
        let broker = Broker::new()?;
        for observer in self.observers {
            broker.subscribe_all(observer);
        }

        let tree = Arc::new(ResourceTree::new());
        let workspace = Arc::new(Workspace::new(Arc::clone(&broker), Arc::clone(&tree)));
        let models = Arc::new(ContentModels::new(Arc::clone(&broker), tree));
        let plugins = Arc::new(Plugins::new());
        let dispatcher = Dispatcher::new(Arc::clone(&broker), &self.cfg);
        let services = ServiceRegistry::new(Arc::clone(&broker), Arc::clone(&plugins));

        Ok(Workbench::new_internal(
            self.cfg, broker, workspace, models, plugins, dispatcher, services,
        ))
    }
}

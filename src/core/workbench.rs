//! # Workbench: one instance of every coordination component.
//!
//! [`Workbench`] owns the broker, the resource tree behind the [`Workspace`],
//! the content-model registry, the plugin tables, the [`Dispatcher`] and the
//! [`ServiceRegistry`], and hands out shared references to them. Nothing is
//! global: two workbenches in one process do not see each other.
//!
//! ## Lifecycle
//! ```text
//! build()
//!   └─► Broker::new() ── no runtime ──► RuntimeError::BrokerInit
//!
//! register(service)*          (plugins register capabilities in initialize)
//!
//! start()
//!   ├─► register(dispatcher)   (subscribes ClosingWorkspace → cancel_all)
//!   ├─► seal plugins, publish ApplicationStarted
//!   └─► workspace.open()       (publish DatabaseConnected)
//!
//! shutdown()
//!   ├─► workspace.close()      (publish ClosingWorkspace → tasks cancelled)
//!   ├─► dispatcher.wait_idle(cfg.grace)
//!   ├─► broker.shutdown()      (drain handler queues)
//!   └─► stuck tasks? ──► RuntimeError::GraceExceeded
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use workbench::{Config, Echo, TaskStatus, Workbench};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let wb = Workbench::builder(Config::default()).build()?;
//!     wb.start().await?;
//!
//!     let id = wb.dispatch(Arc::new(Echo::new("hello")));
//!     let done = wb.dispatcher().wait(id).await.unwrap();
//!     assert_eq!(done.status, TaskStatus::Succeeded);
//!     assert_eq!(done.output.as_deref(), Some("hello"));
//!
//!     wb.shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    commands::{CommandRef, Dispatcher, ImportArchive, TaskId},
    config::Config,
    error::RuntimeError,
    events::Broker,
    models::ContentModels,
    plugins::Plugins,
    services::{Service, ServiceRegistry},
    workspace::{ResourceHandle, ResourceTree, Workspace},
};

use super::{builder::WorkbenchBuilder, shutdown};

/// Coordination core of the archive workbench.
pub struct Workbench {
    cfg: Config,
    broker: Arc<Broker>,
    workspace: Arc<Workspace>,
    models: Arc<ContentModels>,
    plugins: Arc<Plugins>,
    dispatcher: Arc<Dispatcher>,
    services: ServiceRegistry,
}

impl Workbench {
    /// Returns a builder for a workbench with `cfg`.
    pub fn builder(cfg: Config) -> WorkbenchBuilder {
        WorkbenchBuilder::new(cfg)
    }

    pub(super) fn new_internal(
        cfg: Config,
        broker: Arc<Broker>,
        workspace: Arc<Workspace>,
        models: Arc<ContentModels>,
        plugins: Arc<Plugins>,
        dispatcher: Arc<Dispatcher>,
        services: ServiceRegistry,
    ) -> Self {
        Self {
            cfg,
            broker,
            workspace,
            models,
            plugins,
            dispatcher,
            services,
        }
    }

    /// Runtime configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// The event broker.
    pub fn broker(&self) -> &Arc<Broker> {
        &self.broker
    }

    /// The workspace (and through it, the resource tree).
    pub fn workspace(&self) -> &Arc<Workspace> {
        &self.workspace
    }

    /// The resource tree.
    pub fn tree(&self) -> &Arc<ResourceTree> {
        self.workspace.tree()
    }

    /// The content-model registry.
    pub fn models(&self) -> &Arc<ContentModels> {
        &self.models
    }

    /// The plugin capability tables.
    pub fn plugins(&self) -> &Arc<Plugins> {
        &self.plugins
    }

    /// The command dispatcher.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Registered service names, in registration order.
    pub fn services(&self) -> Vec<String> {
        self.services.services()
    }

    /// Registers `service` and runs its initialization.
    ///
    /// A duplicate name or a failed initialization is fatal for startup.
    pub async fn register(&self, service: Arc<dyn Service>) -> Result<(), RuntimeError> {
        self.services.register(service).await
    }

    /// Ends startup: registers the dispatcher, announces `ApplicationStarted`
    /// and opens the workspace.
    ///
    /// A second call is a no-op. Fails with [`RuntimeError::DuplicateService`]
    /// if another service already took the dispatcher's name.
    pub async fn start(&self) -> Result<(), RuntimeError> {
        if self.services.is_started() {
            return Ok(());
        }
        if !self.dispatcher.is_listening() {
            self.register(Arc::clone(&self.dispatcher) as Arc<dyn Service>)
                .await?;
        }
        self.services.start();
        self.workspace.open();
        Ok(())
    }

    /// Dispatches `command`; shorthand for `dispatcher().dispatch(..)`.
    pub fn dispatch(&self, command: CommandRef) -> TaskId {
        self.dispatcher.dispatch(command)
    }

    /// Dispatches an [`ImportArchive`] of `archive_type` for `handle`.
    pub fn import_archive(
        &self,
        archive_type: impl Into<String>,
        handle: impl Into<ResourceHandle>,
    ) -> TaskId {
        self.dispatch(Arc::new(ImportArchive::new(
            archive_type,
            handle,
            Arc::clone(&self.plugins),
            Arc::clone(&self.workspace),
        )))
    }

    /// Closes the workspace, waits up to `grace` for outstanding tasks and
    /// drains the broker.
    ///
    /// Returns [`RuntimeError::GraceExceeded`] listing tasks that never finished.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        if self.workspace.is_open() {
            self.workspace.close();
        } else {
            self.dispatcher.cancel_all();
        }

        let grace = self.cfg.grace;
        let stuck = self.dispatcher.wait_idle(grace).await;
        self.broker.shutdown().await;

        if stuck.is_empty() {
            info!("workbench stopped");
            return Ok(());
        }
        let stuck: Vec<String> = stuck.iter().map(TaskId::to_string).collect();
        warn!(?grace, ?stuck, "shutdown grace exceeded");
        Err(RuntimeError::GraceExceeded { grace, stuck })
    }

    /// Runs until a termination signal arrives, then [`shutdown`](Self::shutdown)s.
    pub async fn run_until_signal(&self) -> Result<(), RuntimeError> {
        match shutdown::wait_for_shutdown_signal().await {
            Ok(signal) => info!(signal, "termination signal received"),
            Err(err) => warn!(error = %err, "signal listener failed; shutting down"),
        }
        self.shutdown().await
    }
}

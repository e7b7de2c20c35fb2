//! # workbench
//!
//! **Workbench** is the coordination core of a plugin-extensible archive
//! workbench: an application that imports archives, indexes their entries in a
//! resource tree and lets plugins analyse, view and disassemble them.
//!
//! It provides the runtime every feature plugs into: an asynchronous event
//! broker, a service registry with a two-phase startup, a command dispatcher
//! with observable task states, a content-model registry with single-writer
//! transactions, and an arena-backed resource tree.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Service #1  │   │  Service #2  │   │  Dispatcher  │
//!     │ (workspace)  │   │  (analysis)  │   │  (service)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │ subscribe/publish│                  │ TaskStatusChanged
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Broker                                                           │
//! │  - kind → handler identities                                      │
//! │  - one FIFO queue + worker per subscribed handler                 │
//! │  - handler errors/panics → HandlerFailed                          │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   [queue A]          [queue B]          [queue C]
//!   worker A           worker B           worker C
//!
//! ┌───────────────┐   ┌──────────────────────┐   ┌───────────────────┐
//! │   Workspace   │──►│     ResourceTree     │◄──│   ContentModels   │
//! │ add / delete  │   │ (arena, id-linked)   │   │ factories + locks │
//! │ open / close  │   └──────────────────────┘   │ → Transaction     │
//! └───────────────┘                              └───────────────────┘
//! ```
//!
//! ### Data flow
//! ```text
//! register(service) ──► initialize(): subscribe AddedResource, register plugins
//! start()           ──► ApplicationStarted, DatabaseConnected
//! dispatch(import)  ──► queued ─► running
//!                         └─► Workspace::add_resource ──► AddedResource
//!                               └─► analysis handler: open_transaction(write)
//!                                     └─► commit ──► UpdatedResource
//!                   ──► succeeded
//! shutdown()        ──► ClosingWorkspace ──► outstanding tasks failed(Cancelled)
//! ```
//!
//! ## Features
//! | Area                | Description                                              | Key types / traits                              |
//! |---------------------|----------------------------------------------------------|-------------------------------------------------|
//! | **Events**          | Publish/subscribe with per-handler ordering.             | [`Broker`], [`Event`], [`Subscribe`], [`HandlerFn`] |
//! | **Services**        | Named subsystems with one initialization phase.          | [`Service`], [`ServiceRegistry`]                |
//! | **Commands**        | Asynchronous execution with status events.               | [`Command`], [`CommandFn`], [`Dispatcher`]      |
//! | **Content models**  | Transactional views with read/write isolation.           | [`ContentModelFactory`], [`Transaction`]        |
//! | **Resources**       | Ordered hierarchical index of workspace resources.       | [`ResourceTree`], [`Workspace`]                 |
//! | **Plugins**         | Identifier → handler capability tables.                  | [`Plugins`], [`CapabilityTable`]                |
//! | **Errors**          | Typed errors for startup, tasks and registries.          | [`RuntimeError`], [`TaskError`], [`ModelError`] |
//! | **Configuration**   | Centralized runtime settings.                            | [`Config`]                                      |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] observer.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use workbench::{
//!     Broker, Config, Echo, Event, EventKind, HandlerFn, Service, TaskStatus, Workbench,
//! };
//!
//! struct WorkspaceService;
//!
//! #[async_trait]
//! impl Service for WorkspaceService {
//!     fn name(&self) -> &str { "workspace" }
//!
//!     async fn initialize(&self, broker: &Broker) -> anyhow::Result<()> {
//!         broker.subscribe(
//!             EventKind::TaskStatusChanged,
//!             HandlerFn::arc("workspace", |ev: Event| async move {
//!                 println!("task {:?} is now {:?}", ev.task, ev.status);
//!                 Ok(())
//!             }),
//!         );
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let wb = Workbench::builder(Config::default()).build()?;
//!     wb.register(Arc::new(WorkspaceService)).await?;
//!     wb.start().await?;
//!
//!     let id = wb.dispatch(Arc::new(Echo::new("hello")));
//!     let done = wb.dispatcher().wait(id).await.unwrap();
//!     assert_eq!(done.status, TaskStatus::Succeeded);
//!
//!     wb.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod commands;
mod config;
mod core;
mod error;
mod models;
mod plugins;
mod policies;
mod services;
mod subscribers;
mod workspace;

pub mod events;

// ---- Public re-exports ----

pub use commands::{
    Command, CommandContext, CommandFn, CommandRef, Dispatcher, Echo, ImportArchive, TaskId,
    TaskSnapshot, TaskStatus,
};
pub use config::Config;
pub use crate::core::{Workbench, WorkbenchBuilder};
pub use error::{CodecError, ModelError, PluginError, RuntimeError, TaskError, TreeError};
pub use events::{Broker, Event, EventKind};
pub use models::{AccessMode, ContentModel, ContentModelFactory, ContentModels, LockState, Transaction};
pub use plugins::{
    ArchiveHandler, CapabilityTable, Disassembler, Plugins, StructuralUnit, ViewArtifact,
    ViewGenerator,
};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use services::{Service, ServiceRegistry};
pub use subscribers::{HandlerFn, Subscribe};
pub use workspace::{Ancestors, ResourceHandle, ResourceId, ResourceTree, TreeView, Workspace};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

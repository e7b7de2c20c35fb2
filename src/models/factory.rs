//! # Content-model plugin contracts.
//!
//! A [`ContentModelFactory`] is registered once under a unique identifier and
//! builds a fresh [`ContentModel`] for every transaction. The model owns its
//! working state for the transaction's lifetime.
//!
//! # Example
//! ```
//! use std::any::Any;
//! use async_trait::async_trait;
//! use workbench::{AccessMode, ContentModel, ContentModelFactory, ResourceId};
//!
//! #[derive(Default)]
//! struct ClassModel {
//!     methods: Vec<String>,
//! }
//!
//! #[async_trait]
//! impl ContentModel for ClassModel {
//!     async fn commit(&mut self) -> anyhow::Result<()> { Ok(()) }
//!     fn as_any(&self) -> &dyn Any { self }
//!     fn as_any_mut(&mut self) -> &mut dyn Any { self }
//! }
//!
//! struct ClassModelFactory;
//!
//! #[async_trait]
//! impl ContentModelFactory for ClassModelFactory {
//!     fn identifier(&self) -> &str { "class-model" }
//!
//!     async fn open(
//!         &self,
//!         _resources: &[ResourceId],
//!         _mode: AccessMode,
//!     ) -> anyhow::Result<Box<dyn ContentModel>> {
//!         Ok(Box::new(ClassModel::default()))
//!     }
//! }
//! ```

use std::any::Any;

use async_trait::async_trait;

use crate::models::AccessMode;
use crate::workspace::ResourceId;

/// Working state of one transaction.
#[async_trait]
pub trait ContentModel: Send + Sync + 'static {
    /// Makes the model's changes durable/visible.
    async fn commit(&mut self) -> anyhow::Result<()>;

    /// Throws the working state away. Called at most once, instead of `commit`.
    fn discard(&mut self) {}

    /// Upcast for [`Transaction::model`](crate::Transaction::model).
    fn as_any(&self) -> &dyn Any;

    /// Upcast for [`Transaction::model_mut`](crate::Transaction::model_mut).
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Builds content models over a set of resources.
#[async_trait]
pub trait ContentModelFactory: Send + Sync + 'static {
    /// Unique factory identifier (e.g. `"class-model"`).
    fn identifier(&self) -> &str;

    /// Opens a model over `resources` (sorted, deduplicated, already locked).
    async fn open(
        &self,
        resources: &[ResourceId],
        mode: AccessMode,
    ) -> anyhow::Result<Box<dyn ContentModel>>;
}

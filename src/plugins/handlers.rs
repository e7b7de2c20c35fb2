//! Handler contracts for the plugin capability tables.
//!
//! The features that invoke these handlers (import, view, disassembly) live
//! outside the core; the core only stores handlers and hands them out.

use std::sync::Arc;

use async_trait::async_trait;

use crate::workspace::{ResourceHandle, ResourceId, Workspace};

/// Expands an imported archive into Resource Tree nodes.
#[async_trait]
pub trait ArchiveHandler: Send + Sync + 'static {
    /// Attaches the archive's entries below `archive` (already in the tree).
    async fn expand(&self, archive: ResourceId, workspace: &Workspace) -> anyhow::Result<()>;
}

/// Output of a [`ViewGenerator`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewArtifact {
    /// Media type of `bytes` (e.g. `image/png`, `text/plain`).
    pub media_type: String,
    /// Rendered view.
    pub bytes: Vec<u8>,
}

/// Produces a view artifact for a resource.
#[async_trait]
pub trait ViewGenerator: Send + Sync + 'static {
    async fn generate(&self, resource: &ResourceHandle) -> anyhow::Result<ViewArtifact>;
}

/// Parsed structural unit handed to a [`Disassembler`] (e.g. one class file).
#[derive(Clone, Debug)]
pub struct StructuralUnit {
    /// Resource the unit was read from.
    pub resource: ResourceId,
    /// Display name of the unit.
    pub name: Arc<str>,
    /// Raw bytes of the unit.
    pub bytes: Arc<[u8]>,
}

/// Turns a structural unit into textual disassembly.
#[async_trait]
pub trait Disassembler: Send + Sync + 'static {
    async fn disassemble(&self, unit: &StructuralUnit) -> anyhow::Result<String>;
}

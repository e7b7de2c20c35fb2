//! Commands shipped with the runtime.
//!
//! - [`Echo`] (`"echo"`): succeeds with its payload as output.
//! - [`ImportArchive`] (`"import-archive"`): attaches an archive to the
//!   resource tree and lets the registered archive-type handler expand it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::commands::{Command, CommandContext};
use crate::error::TaskError;
use crate::plugins::Plugins;
use crate::workspace::{ResourceHandle, ResourceId, Workspace};

/// Returns its payload unchanged.
#[derive(Debug, Clone, Default)]
pub struct Echo {
    payload: String,
}

impl Echo {
    /// Command type.
    pub const KIND: &'static str = "echo";

    /// Echoes `payload`.
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

#[async_trait]
impl Command for Echo {
    fn kind(&self) -> &str {
        Self::KIND
    }

    async fn execute(&self, ctx: CommandContext) -> Result<Option<String>, TaskError> {
        if ctx.is_cancelled() {
            return Err(TaskError::Cancelled);
        }
        Ok(Some(self.payload.clone()))
    }
}

/// Imports an archive of a registered archive type.
///
/// The archive root is attached under `parent` (or as a new root), which
/// publishes `AddedResource`; the handler then expands its content below it.
/// The output is the root's resource id.
pub struct ImportArchive {
    archive_type: String,
    handle: ResourceHandle,
    parent: Option<ResourceId>,
    plugins: Arc<Plugins>,
    workspace: Arc<Workspace>,
}

impl ImportArchive {
    /// Command type.
    pub const KIND: &'static str = "import-archive";

    /// Imports `handle` as an archive of `archive_type` at the tree root.
    pub fn new(
        archive_type: impl Into<String>,
        handle: impl Into<ResourceHandle>,
        plugins: Arc<Plugins>,
        workspace: Arc<Workspace>,
    ) -> Self {
        Self {
            archive_type: archive_type.into(),
            handle: handle.into(),
            parent: None,
            plugins,
            workspace,
        }
    }

    /// Attaches the archive below `parent` instead of as a root.
    pub fn under(mut self, parent: ResourceId) -> Self {
        self.parent = Some(parent);
        self
    }
}

#[async_trait]
impl Command for ImportArchive {
    fn kind(&self) -> &str {
        Self::KIND
    }

    async fn execute(&self, ctx: CommandContext) -> Result<Option<String>, TaskError> {
        let handler = self.plugins.archives.get(&self.archive_type).ok_or_else(|| {
            TaskError::fail(format!("no handler for archive type '{}'", self.archive_type))
        })?;
        if ctx.is_cancelled() {
            return Err(TaskError::Cancelled);
        }

        let root = self.workspace.add_resource(self.parent, self.handle.clone())?;
        debug!(task = %ctx.task_id, archive = %self.handle, %root, "expanding archive");
        handler.expand(root, &self.workspace).await?;
        Ok(Some(root.to_string()))
    }
}

//! # Command abstraction.
//!
//! A [`Command`] has a stable type string ([`Command::kind`]) and a single
//! capability: execute and report an outcome. The dispatcher never looks
//! inside a command; it only sequences the task lifecycle around `execute`.
//!
//! Each execution receives a [`CommandContext`] with the task id, a
//! cancellation token scoped to this task, and the broker.
//!
//! # Example
//! ```
//! use async_trait::async_trait;
//! use workbench::{Command, CommandContext, TaskError};
//!
//! struct CountClasses;
//!
//! #[async_trait]
//! impl Command for CountClasses {
//!     fn kind(&self) -> &str { "count-classes" }
//!
//!     async fn execute(&self, ctx: CommandContext) -> Result<Option<String>, TaskError> {
//!         if ctx.is_cancelled() {
//!             return Err(TaskError::Cancelled);
//!         }
//!         Ok(Some("0".into()))
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::commands::TaskId;
use crate::error::TaskError;
use crate::events::Broker;

/// Per-execution context handed to [`Command::execute`].
#[derive(Clone)]
pub struct CommandContext {
    /// Id of the task executing the command.
    pub task_id: TaskId,
    /// Cancelled when the task is cancelled (workspace closing, explicit cancel).
    pub token: CancellationToken,
    /// Broker, for commands that publish their own events.
    pub broker: Arc<Broker>,
}

impl CommandContext {
    /// True once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves when cancellation is requested.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

/// # Typed, asynchronous request against the workspace.
///
/// `execute` returns an optional textual result on success. Returning
/// `Err(TaskError::Cancelled)` when the token fires is good manners; the
/// dispatcher reports cancellation either way.
#[async_trait]
pub trait Command: Send + Sync + 'static {
    /// Command type discriminant (e.g. `"echo"`).
    fn kind(&self) -> &str;

    /// Executes the command once.
    async fn execute(&self, ctx: CommandContext) -> Result<Option<String>, TaskError>;
}

/// Shared handle to a command.
pub type CommandRef = Arc<dyn Command>;

//! # Function-backed command (`CommandFn`)
//!
//! [`CommandFn`] wraps a closure `F: Fn(CommandContext) -> Fut`, producing a
//! fresh future per execution. Shared state goes into an `Arc` captured by
//! the closure.
//!
//! ## Example
//! ```rust
//! use workbench::{CommandContext, CommandFn, CommandRef, TaskError};
//!
//! let cmd: CommandRef = CommandFn::arc("reindex", |ctx: CommandContext| async move {
//!     if ctx.is_cancelled() {
//!         return Err(TaskError::Cancelled);
//!     }
//!     Ok(None)
//! });
//!
//! assert_eq!(cmd.kind(), "reindex");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::commands::{Command, CommandContext};
use crate::error::TaskError;

/// Function-backed command implementation.
#[derive(Debug)]
pub struct CommandFn<F> {
    kind: Cow<'static, str>,
    f: F,
}

impl<F> CommandFn<F> {
    /// Creates a new function-backed command of type `kind`.
    pub fn new(kind: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            kind: kind.into(),
            f,
        }
    }

    /// Creates the command and returns it as a shared handle.
    pub fn arc(kind: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(kind, f))
    }
}

#[async_trait]
impl<F, Fut> Command for CommandFn<F>
where
    F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<String>, TaskError>> + Send + 'static,
{
    fn kind(&self) -> &str {
        &self.kind
    }

    async fn execute(&self, ctx: CommandContext) -> Result<Option<String>, TaskError> {
        (self.f)(ctx).await
    }
}

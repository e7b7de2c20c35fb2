//! # Run one command execution.
//!
//! Executes [`Command::execute`] once under the task's cancellation token,
//! with an optional timeout and panic isolation.
//!
//! ```text
//! execute(ctx) ──► Ok(output)          → Ok(output)
//!              ├─► Err(e)              → Err(e)
//!              ├─► panic               → Err(Panicked)
//!              ├─► timeout elapsed     → cancel token, Err(Timeout)
//!              └─► token cancelled     → Err(Cancelled)
//! ```
//!
//! ## Rules
//! - Cancellation wins over a pending result (`biased` select).
//! - An error returned after cancellation was requested is reported as `Cancelled`.
//! - The command future is dropped before this function returns, so every
//!   transaction the command still held is discarded and its locks released
//!   before the dispatcher publishes the terminal status.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::time;

use crate::commands::{Command, CommandContext};
use crate::error::TaskError;
use crate::subscribers::panic_message;

/// Executes `command` once with `ctx`.
pub(crate) async fn run_once(
    command: &dyn Command,
    ctx: CommandContext,
    timeout: Option<Duration>,
) -> Result<Option<String>, TaskError> {
    let token = ctx.token.clone();

    let guarded = async {
        match AssertUnwindSafe(command.execute(ctx)).catch_unwind().await {
            Ok(res) => res,
            Err(panic) => Err(TaskError::Panicked {
                info: panic_message(panic.as_ref()),
            }),
        }
    };

    let timed = async {
        match timeout.filter(|d| *d > Duration::ZERO) {
            Some(dur) => match time::timeout(dur, guarded).await {
                Ok(res) => res,
                Err(_elapsed) => {
                    token.cancel();
                    Err(TaskError::Timeout { timeout: dur })
                }
            },
            None => guarded.await,
        }
    };

    let res = tokio::select! {
        biased;
        _ = token.cancelled() => Err(TaskError::Cancelled),
        res = timed => res,
    };

    match res {
        Err(err) if token.is_cancelled() && !matches!(err, TaskError::Timeout { .. }) => {
            Err(TaskError::Cancelled)
        }
        other => other,
    }
}

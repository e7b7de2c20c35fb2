//! # LogWriter: event tracer
//!
//! A minimal handler that renders every incoming [`Event`] as one `tracing`
//! line. Attach it with [`Broker::subscribe_all`](crate::Broker::subscribe_all).
//!
//! ## Example output
//! ```text
//! INFO [started]
//! INFO [added] resource=3 handle="com/A.class"
//! INFO [task] id=1 command="echo" status=running
//! WARN [task] id=2 command="import" status=failed reason="Cancelled"
//! WARN [handler-failed] handler="indexer" reason="cannot index"
//! ```

use async_trait::async_trait;
use tracing::{info, warn};

use crate::commands::TaskStatus;
use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer handler.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) -> anyhow::Result<()> {
        let handle = e.handle.as_ref().map(|h| h.as_str()).unwrap_or("");
        match e.kind {
            EventKind::ApplicationStarted => info!("[started]"),
            EventKind::DatabaseConnected => info!("[database-connected]"),
            EventKind::ClosingWorkspace => info!("[closing]"),
            EventKind::AddedResource => {
                info!("[added] resource={:?} handle={:?}", e.resource, handle)
            }
            EventKind::UpdatedResource => {
                info!("[updated] resource={:?} handle={:?}", e.resource, handle)
            }
            EventKind::DeletedResource => {
                info!("[deleted] resource={:?} handle={:?}", e.resource, handle)
            }
            EventKind::TaskStatusChanged => match e.status {
                Some(TaskStatus::Failed) => warn!(
                    "[task] id={:?} command={:?} status=failed reason={:?}",
                    e.task,
                    e.command.as_deref().unwrap_or("unknown"),
                    e.reason.as_deref().unwrap_or("unknown"),
                ),
                status => info!(
                    "[task] id={:?} command={:?} status={:?}",
                    e.task,
                    e.command.as_deref().unwrap_or("unknown"),
                    status,
                ),
            },
            EventKind::HandlerFailed => warn!(
                "[handler-failed] handler={:?} reason={:?}",
                e.handler.as_deref().unwrap_or("unknown"),
                e.reason.as_deref().unwrap_or("unknown"),
            ),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "LogWriter"
    }
}

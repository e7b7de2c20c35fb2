//! # Events published through the broker.
//!
//! The [`EventKind`] enum classifies events across four groups:
//! - **Lifecycle**: application and workspace phases (started, connected, closing)
//! - **Resources**: added / updated / deleted resources
//! - **Tasks**: command status transitions
//! - **Broker**: handler failures reported by the broker itself
//!
//! The [`Event`] struct carries the payload fields relevant to its kind. Events
//! are immutable once published; handlers receive shared references.
//!
//! ## Ordering
//! Each event has a process-wide sequence number (`seq`) assigned at creation.
//! The broker guarantees per-handler delivery order, not a global order; `seq`
//! lets observers correlate events across handlers.
//!
//! ## Example
//! ```rust
//! use workbench::{Event, EventKind, TaskId, TaskStatus};
//!
//! let ev = Event::task_status(TaskId::new(7), TaskStatus::Failed)
//!     .with_command("echo")
//!     .with_reason("Cancelled");
//!
//! assert_eq!(ev.kind, EventKind::TaskStatusChanged);
//! assert_eq!(ev.status, Some(TaskStatus::Failed));
//! assert_eq!(ev.reason.as_deref(), Some("Cancelled"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::commands::{TaskId, TaskStatus};
use crate::workspace::{ResourceHandle, ResourceId};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Lifecycle events ===
    /// All startup services are live; normal runtime traffic begins.
    ApplicationStarted,

    /// The workspace's persistence collaborator is ready.
    DatabaseConnected,

    /// The workspace is shutting down; outstanding work must stop.
    ClosingWorkspace,

    // === Resource events ===
    /// A resource was imported into the workspace.
    ///
    /// Sets:
    /// - `resource`: resource id
    /// - `handle`: resource handle
    AddedResource,

    /// A content-model commit changed a resource.
    ///
    /// Sets:
    /// - `resource`: resource id
    /// - `handle`: resource handle, if the resource is in the tree
    UpdatedResource,

    /// A resource was removed from the workspace.
    ///
    /// Sets:
    /// - `resource`: resource id
    /// - `handle`: resource handle
    DeletedResource,

    // === Task events ===
    /// A dispatched command changed state.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `status`: new status
    /// - `command`: command type
    /// - `reason`: failure reason (only for `failed`)
    /// - `output`: optional result payload (only for `succeeded`)
    TaskStatusChanged,

    // === Broker events ===
    /// A handler returned an error or panicked while processing an event.
    ///
    /// Sets:
    /// - `handler`: handler name
    /// - `reason`: error or panic message
    HandlerFailed,
}

impl EventKind {
    /// Every event kind, in declaration order.
    pub const ALL: [EventKind; 8] = [
        EventKind::ApplicationStarted,
        EventKind::DatabaseConnected,
        EventKind::ClosingWorkspace,
        EventKind::AddedResource,
        EventKind::UpdatedResource,
        EventKind::DeletedResource,
        EventKind::TaskStatusChanged,
        EventKind::HandlerFailed,
    ];

    /// Short stable name (for logs).
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ApplicationStarted => "application_started",
            EventKind::DatabaseConnected => "database_connected",
            EventKind::ClosingWorkspace => "closing_workspace",
            EventKind::AddedResource => "added_resource",
            EventKind::UpdatedResource => "updated_resource",
            EventKind::DeletedResource => "deleted_resource",
            EventKind::TaskStatusChanged => "task_status_changed",
            EventKind::HandlerFailed => "handler_failed",
        }
    }
}

/// Event with optional payload.
///
/// - `seq`: monotonic global sequence
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Resource the event is about.
    pub resource: Option<ResourceId>,
    /// Opaque handle of that resource.
    pub handle: Option<ResourceHandle>,

    /// Task the status change belongs to.
    pub task: Option<TaskId>,
    /// New task status.
    pub status: Option<TaskStatus>,
    /// Command type of the task.
    pub command: Option<Arc<str>>,
    /// Result payload of a succeeded task.
    pub output: Option<Arc<str>>,

    /// Name of a failing handler.
    pub handler: Option<Arc<str>>,
    /// Human-readable reason (failures).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            resource: None,
            handle: None,
            task: None,
            status: None,
            command: None,
            output: None,
            handler: None,
            reason: None,
        }
    }

    /// Attaches a resource id.
    #[inline]
    pub fn with_resource(mut self, id: ResourceId) -> Self {
        self.resource = Some(id);
        self
    }

    /// Attaches a resource handle (no-op for `None`).
    #[inline]
    pub fn with_handle(mut self, handle: Option<ResourceHandle>) -> Self {
        if handle.is_some() {
            self.handle = handle;
        }
        self
    }

    /// Attaches the command type.
    #[inline]
    pub fn with_command(mut self, command: impl Into<Arc<str>>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Attaches a task result payload.
    #[inline]
    pub fn with_output(mut self, output: impl Into<Arc<str>>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// `TaskStatusChanged` for `task`.
    pub fn task_status(task: TaskId, status: TaskStatus) -> Self {
        let mut ev = Event::new(EventKind::TaskStatusChanged);
        ev.task = Some(task);
        ev.status = Some(status);
        ev
    }

    /// Resource event (`AddedResource` / `UpdatedResource` / `DeletedResource`).
    pub fn resource(kind: EventKind, id: ResourceId, handle: Option<ResourceHandle>) -> Self {
        Event::new(kind).with_resource(id).with_handle(handle)
    }

    /// `HandlerFailed` for `handler`.
    pub fn handler_failed(handler: impl Into<Arc<str>>, reason: impl Into<Arc<str>>) -> Self {
        let mut ev = Event::new(EventKind::HandlerFailed).with_reason(reason);
        ev.handler = Some(handler.into());
        ev
    }

    #[inline]
    pub fn is_handler_failure(&self) -> bool {
        matches!(self.kind, EventKind::HandlerFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::ApplicationStarted);
        let b = Event::new(EventKind::ApplicationStarted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn resource_event_carries_payload() {
        let ev = Event::resource(
            EventKind::AddedResource,
            ResourceId::new(3),
            Some(ResourceHandle::new("a/B.class")),
        );
        assert_eq!(ev.kind, EventKind::AddedResource);
        assert_eq!(ev.resource, Some(ResourceId::new(3)));
        assert_eq!(ev.handle.as_ref().map(|h| h.as_str()), Some("a/B.class"));
        assert!(ev.task.is_none());
    }

    #[test]
    fn handler_failure_is_flagged() {
        let ev = Event::handler_failed("indexer", "boom");
        assert!(ev.is_handler_failure());
        assert_eq!(ev.handler.as_deref(), Some("indexer"));
        assert_eq!(ev.reason.as_deref(), Some("boom"));
    }
}

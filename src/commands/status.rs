//! # Task identity and status state machine.
//!
//! ```text
//!   queued ──► running ──► succeeded
//!                  │
//!                  └─────► failed
//! ```
//!
//! Every dispatched command produces exactly this sequence of statuses; a
//! `failed` task carries a reason, a `succeeded` one an optional output.

use std::fmt;
use std::sync::Arc;

/// Dispatcher-assigned task identifier, unique per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// Wraps a raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Lifecycle state of a dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Accepted, waiting for an execution slot.
    Queued,
    /// Executing.
    Running,
    /// Finished without error.
    Succeeded,
    /// Finished with an error, timed out, panicked or was cancelled.
    Failed,
}

impl TaskStatus {
    /// True for `succeeded` and `failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed)
    }

    /// True if a task in `self` may move to `next`.
    pub fn can_transition(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Queued, TaskStatus::Running)
                | (TaskStatus::Running, TaskStatus::Succeeded)
                | (TaskStatus::Running, TaskStatus::Failed)
        )
    }

    /// Short stable name (for logs).
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Running => "running",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSnapshot {
    /// Task id.
    pub id: TaskId,
    /// Command type.
    pub command: Arc<str>,
    /// Current status.
    pub status: TaskStatus,
    /// Output of a succeeded task.
    pub output: Option<Arc<str>>,
    /// Reason of a failed task.
    pub reason: Option<Arc<str>>,
}

impl TaskSnapshot {
    pub(crate) fn queued(id: TaskId, command: Arc<str>) -> Self {
        Self {
            id,
            command,
            status: TaskStatus::Queued,
            output: None,
            reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_forward_transitions_are_allowed() {
        use TaskStatus::*;

        assert!(Queued.can_transition(Running));
        assert!(Running.can_transition(Succeeded));
        assert!(Running.can_transition(Failed));

        assert!(!Queued.can_transition(Succeeded));
        assert!(!Queued.can_transition(Failed));
        assert!(!Succeeded.can_transition(Running));
        assert!(!Failed.can_transition(Failed));
        assert!(!Running.can_transition(Queued));
    }

    #[test]
    fn terminal_states() {
        assert!(!TaskStatus::Queued.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Succeeded.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert_eq!(TaskId::new(3).to_string(), "task-3");
    }
}

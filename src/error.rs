//! Error types used by the workbench runtime, commands and registries.
//!
//! Errors are split by how they surface:
//!
//! - [`RuntimeError`] fatal startup/shutdown failures of the runtime itself.
//! - [`TaskError`] outcome of a single command execution; never returned to the
//!   dispatcher's caller, only reported as the reason of a `failed` status event.
//! - [`ModelError`], [`TreeError`], [`PluginError`] synchronous, recoverable
//!   failures of the content-model registry, resource tree and capability tables.
//! - [`CodecError`] cross-process event transport, which has no wire format yet.
//!
//! Every enum provides `as_label` (short snake_case label for logs/metrics).

use std::time::Duration;
use thiserror::Error;

use crate::models::AccessMode;
use crate::workspace::ResourceId;

/// # Errors produced by the workbench runtime.
///
/// All of these abort startup (or report a failed shutdown); none is recoverable
/// by retrying the same call.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The broker could not set up its delivery machinery.
    #[error("event broker failed to initialize: {reason}")]
    BrokerInit {
        /// What went wrong.
        reason: String,
    },

    /// Two services were registered under the same name.
    #[error("service '{name}' is already registered")]
    DuplicateService {
        /// The conflicting service name.
        name: String,
    },

    /// A service's initialization phase returned an error.
    #[error("service '{name}' failed to initialize: {reason}")]
    ServiceInit {
        /// Service name.
        name: String,
        /// Error reported by the service.
        reason: String,
    },

    /// Shutdown grace period was exceeded; some tasks never reached a terminal state.
    #[error("shutdown timeout {grace:?} exceeded; stuck tasks: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Ids of tasks still outstanding.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use workbench::RuntimeError;
    ///
    /// let err = RuntimeError::DuplicateService { name: "workspace".into() };
    /// assert_eq!(err.as_label(), "runtime_duplicate_service");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::BrokerInit { .. } => "runtime_broker_init",
            RuntimeError::DuplicateService { .. } => "runtime_duplicate_service",
            RuntimeError::ServiceInit { .. } => "runtime_service_init",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// # Errors produced by command execution.
///
/// The `Display` text of a `TaskError` becomes the human-readable reason of the
/// task's terminal `failed` status.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// Command reported a failure.
    #[error("{error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Command execution exceeded the configured timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// Command panicked while executing.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// Task was cancelled (workspace closing or explicit cancel).
    #[error("Cancelled")]
    Cancelled,
}

impl TaskError {
    /// Builds a [`TaskError::Fail`] from any displayable error.
    pub fn fail(error: impl std::fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Cancelled => "task_cancelled",
        }
    }

    /// True if the task ended because it was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TaskError::Cancelled)
    }
}

impl From<anyhow::Error> for TaskError {
    fn from(err: anyhow::Error) -> Self {
        TaskError::Fail {
            error: format!("{err:#}"),
        }
    }
}

impl From<ModelError> for TaskError {
    fn from(err: ModelError) -> Self {
        TaskError::fail(err)
    }
}

impl From<TreeError> for TaskError {
    fn from(err: TreeError) -> Self {
        TaskError::fail(err)
    }
}

/// # Errors produced by the content-model registry.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A factory with this identifier is already registered.
    #[error("content-model factory '{factory}' is already registered")]
    DuplicateFactory {
        /// Factory identifier.
        factory: String,
    },

    /// No factory is registered under this identifier.
    #[error("no content-model factory named '{factory}'")]
    UnknownFactory {
        /// Factory identifier.
        factory: String,
    },

    /// A requested resource is held under a conflicting mode.
    #[error("resource {resource} is already held for {held}")]
    TransactionConflict {
        /// First conflicting resource (in lock order).
        resource: ResourceId,
        /// Mode the resource is currently held in.
        held: AccessMode,
    },

    /// The factory failed to build the content model.
    #[error("factory '{factory}' failed to open content model: {reason}")]
    Open {
        /// Factory identifier.
        factory: String,
        /// Error reported by the factory.
        reason: String,
    },

    /// The content model failed to commit.
    #[error("content model of '{factory}' failed to commit: {reason}")]
    Commit {
        /// Factory identifier.
        factory: String,
        /// Error reported by the model.
        reason: String,
    },
}

impl ModelError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ModelError::DuplicateFactory { .. } => "model_duplicate_factory",
            ModelError::UnknownFactory { .. } => "model_unknown_factory",
            ModelError::TransactionConflict { .. } => "model_transaction_conflict",
            ModelError::Open { .. } => "model_open_failed",
            ModelError::Commit { .. } => "model_commit_failed",
        }
    }

    /// True for [`ModelError::TransactionConflict`], the only error worth retrying.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ModelError::TransactionConflict { .. })
    }
}

/// # Errors produced by resource-tree mutations and lookups.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    /// The requested parent does not exist.
    #[error("parent node {parent} not found")]
    ParentNotFound {
        /// Requested parent id.
        parent: ResourceId,
    },

    /// The node does not exist.
    #[error("node {node} not found")]
    NodeNotFound {
        /// Requested node id.
        node: ResourceId,
    },

    /// The mutation would make a node its own ancestor.
    #[error("moving node {node} under {parent} would create a cycle")]
    Cycle {
        /// Node being moved.
        node: ResourceId,
        /// Requested new parent.
        parent: ResourceId,
    },
}

impl TreeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TreeError::ParentNotFound { .. } => "tree_parent_not_found",
            TreeError::NodeNotFound { .. } => "tree_node_not_found",
            TreeError::Cycle { .. } => "tree_cycle",
        }
    }
}

/// # Errors produced by plugin capability tables.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    /// The identifier is already taken in this table.
    #[error("{table} '{identifier}' is already registered")]
    Duplicate {
        /// Table label (e.g. "archive type").
        table: &'static str,
        /// Conflicting identifier.
        identifier: String,
    },

    /// Registration attempted after the application started.
    #[error("{table} '{identifier}' registered after startup")]
    Sealed {
        /// Table label.
        table: &'static str,
        /// Rejected identifier.
        identifier: String,
    },
}

impl PluginError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            PluginError::Duplicate { .. } => "plugin_duplicate",
            PluginError::Sealed { .. } => "plugin_sealed",
        }
    }
}

/// # Errors produced by the event codec.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Cross-process event transport has no wire format.
    #[error("event (de)serialization is not implemented")]
    NotImplemented,
}

//! Command execution: the [`Command`] contract, task status model and the
//! [`Dispatcher`] that sequences each task's lifecycle.
//!
//! ## Contents
//! - [`Command`], [`CommandContext`], [`CommandRef`] what a command is and receives
//! - [`CommandFn`] closure-backed command
//! - [`Echo`], [`ImportArchive`] builtin commands
//! - [`TaskId`], [`TaskStatus`], [`TaskSnapshot`] task identity and state
//! - [`Dispatcher`] asynchronous executor publishing `TaskStatusChanged`

mod builtin;
mod command;
mod command_fn;
mod dispatcher;
mod runner;
mod status;

pub use builtin::{Echo, ImportArchive};
pub use command::{Command, CommandContext, CommandRef};
pub use command_fn::CommandFn;
pub use dispatcher::Dispatcher;
pub use status::{TaskId, TaskSnapshot, TaskStatus};

//! Workspace resources: identifiers, the arena-backed [`ResourceTree`] and the
//! [`Workspace`] feature that mutates it and announces the changes.

mod resource;
mod tree;
mod workspace;

pub use resource::{ResourceHandle, ResourceId};
pub use tree::{Ancestors, ResourceTree, TreeView};
pub use workspace::Workspace;

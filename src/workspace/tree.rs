//! # Resource tree: hierarchical index of workspace resources.
//!
//! Arena-style storage: every node lives in one flat table keyed by
//! [`ResourceId`]; parent/child links are ids, never pointers.
//!
//! ```text
//! Arena
//!   nodes: { id → Node { handle, parent: Option<id>, children: [id, ...] } }
//!   roots: [id, ...]            (insertion order)
//! ```
//!
//! ## Rules
//! - Every non-root node has exactly one parent; roots have none.
//! - Child order is insertion order and is part of the contract.
//! - Every mutation validates before touching the arena: a failing call leaves
//!   the tree unchanged.
//! - Mutations are serialized by one `RwLock`; readers see whole mutations only.
//! - The tree never publishes events; [`Workspace`](super::Workspace) does.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::TreeError;
use crate::workspace::resource::{ResourceHandle, ResourceId};

struct Node {
    handle: ResourceHandle,
    parent: Option<ResourceId>,
    children: Vec<ResourceId>,
}

#[derive(Default)]
struct Arena {
    nodes: HashMap<ResourceId, Node>,
    roots: Vec<ResourceId>,
    last_id: u64,
}

impl Arena {
    fn node(&self, id: ResourceId) -> Result<&Node, TreeError> {
        self.nodes.get(&id).ok_or(TreeError::NodeNotFound { node: id })
    }

    /// Detaches `id` from its parent's child list (or from the roots).
    fn unlink(&mut self, id: ResourceId, parent: Option<ResourceId>) {
        let siblings = match parent {
            Some(p) => match self.nodes.get_mut(&p) {
                Some(node) => &mut node.children,
                None => return,
            },
            None => &mut self.roots,
        };
        siblings.retain(|c| *c != id);
    }

    /// True if `candidate` is `node` or lies below it.
    fn is_in_subtree(&self, node: ResourceId, candidate: ResourceId) -> bool {
        let mut cursor = Some(candidate);
        while let Some(id) = cursor {
            if id == node {
                return true;
            }
            cursor = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }
}

/// Thread-safe arena tree of workspace resources.
#[derive(Default)]
pub struct ResourceTree {
    arena: RwLock<Arena>,
}

impl ResourceTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Arena> {
        self.arena.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Arena> {
        self.arena.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts a new node and returns its id.
    ///
    /// - `parent = None` → the node becomes a new root.
    /// - `parent = Some(p)` → the node is appended as the last child of `p`.
    ///
    /// Fails with [`TreeError::ParentNotFound`] (tree unchanged) if `p` does not exist.
    pub fn attach(
        &self,
        parent: Option<ResourceId>,
        handle: ResourceHandle,
    ) -> Result<ResourceId, TreeError> {
        let mut arena = self.write();
        if let Some(p) = parent {
            if !arena.nodes.contains_key(&p) {
                return Err(TreeError::ParentNotFound { parent: p });
            }
        }

        arena.last_id += 1;
        let id = ResourceId::new(arena.last_id);
        arena.nodes.insert(
            id,
            Node {
                handle,
                parent,
                children: Vec::new(),
            },
        );
        match parent {
            Some(p) => {
                if let Some(node) = arena.nodes.get_mut(&p) {
                    node.children.push(id);
                }
            }
            None => arena.roots.push(id),
        }
        Ok(id)
    }

    /// Removes `node` and its whole subtree.
    ///
    /// Returns the removed `(id, handle)` pairs in pre-order (the node first),
    /// so the caller can emit deletion events.
    pub fn remove(&self, node: ResourceId) -> Result<Vec<(ResourceId, ResourceHandle)>, TreeError> {
        let mut arena = self.write();
        let parent = arena.node(node)?.parent;
        arena.unlink(node, parent);

        let mut removed = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(n) = arena.nodes.remove(&id) {
                stack.extend(n.children.iter().rev().copied());
                removed.push((id, n.handle));
            }
        }
        Ok(removed)
    }

    /// Moves `node` (with its subtree) under `new_parent`, appended last.
    ///
    /// `new_parent = None` turns the node into a root. Moving a node under itself
    /// or one of its descendants fails with [`TreeError::Cycle`].
    pub fn reparent(
        &self,
        node: ResourceId,
        new_parent: Option<ResourceId>,
    ) -> Result<(), TreeError> {
        let mut arena = self.write();
        let old_parent = arena.node(node)?.parent;
        if let Some(p) = new_parent {
            if !arena.nodes.contains_key(&p) {
                return Err(TreeError::ParentNotFound { parent: p });
            }
            if arena.is_in_subtree(node, p) {
                return Err(TreeError::Cycle { node, parent: p });
            }
        }

        arena.unlink(node, old_parent);
        match new_parent {
            Some(p) => {
                if let Some(n) = arena.nodes.get_mut(&p) {
                    n.children.push(node);
                }
            }
            None => arena.roots.push(node),
        }
        if let Some(n) = arena.nodes.get_mut(&node) {
            n.parent = new_parent;
        }
        Ok(())
    }

    /// Direct children of `node`, in insertion order.
    pub fn children(&self, node: ResourceId) -> Result<Vec<ResourceId>, TreeError> {
        Ok(self.read().node(node)?.children.clone())
    }

    /// Parent of `node` (`None` for roots).
    pub fn parent(&self, node: ResourceId) -> Result<Option<ResourceId>, TreeError> {
        Ok(self.read().node(node)?.parent)
    }

    /// Handle attached to `node`, if the node exists.
    pub fn handle(&self, node: ResourceId) -> Option<ResourceHandle> {
        self.read().nodes.get(&node).map(|n| n.handle.clone())
    }

    /// `node` followed by each ancestor up to its root.
    pub fn ancestors(&self, node: ResourceId) -> Result<Vec<ResourceId>, TreeError> {
        let view = self.view();
        view.arena.node(node)?;
        Ok(view.ancestors(node).collect())
    }

    /// Root nodes in insertion order.
    pub fn roots(&self) -> Vec<ResourceId> {
        self.read().roots.clone()
    }

    /// True if `node` exists.
    pub fn contains(&self, node: ResourceId) -> bool {
        self.read().nodes.contains_key(&node)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.read().nodes.len()
    }

    /// True if the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.read().nodes.is_empty()
    }

    /// Consistent read view; mutations wait until it is dropped.
    pub fn view(&self) -> TreeView<'_> {
        TreeView { arena: self.read() }
    }
}

/// Read-locked view over a [`ResourceTree`].
pub struct TreeView<'a> {
    arena: RwLockReadGuard<'a, Arena>,
}

impl TreeView<'_> {
    /// Lazy walk from `node` up to its root (yields `node` first).
    ///
    /// Yields nothing for an unknown node.
    pub fn ancestors(&self, node: ResourceId) -> Ancestors<'_> {
        let start = self.arena.nodes.contains_key(&node).then_some(node);
        Ancestors {
            arena: &self.arena,
            next: start,
        }
    }

    /// Direct children of `node` (empty for unknown nodes).
    pub fn children(&self, node: ResourceId) -> &[ResourceId] {
        self.arena
            .nodes
            .get(&node)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Handle attached to `node`.
    pub fn handle(&self, node: ResourceId) -> Option<&ResourceHandle> {
        self.arena.nodes.get(&node).map(|n| &n.handle)
    }
}

/// Iterator returned by [`TreeView::ancestors`].
pub struct Ancestors<'a> {
    arena: &'a Arena,
    next: Option<ResourceId>,
}

impl Iterator for Ancestors<'_> {
    type Item = ResourceId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.arena.nodes.get(&current).and_then(|n| n.parent);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(s: &str) -> ResourceHandle {
        ResourceHandle::new(s)
    }

    #[test]
    fn children_keep_insertion_order() {
        let tree = ResourceTree::new();
        let root = tree.attach(None, h("app.jar")).unwrap();
        let b = tree.attach(Some(root), h("b.class")).unwrap();
        let a = tree.attach(Some(root), h("a.class")).unwrap();
        let c = tree.attach(Some(root), h("c.class")).unwrap();

        assert_eq!(tree.children(root).unwrap(), vec![b, a, c]);
        assert_eq!(tree.parent(a).unwrap(), Some(root));
        assert_eq!(tree.parent(root).unwrap(), None);
        assert_eq!(tree.roots(), vec![root]);
    }

    #[test]
    fn attach_under_missing_parent_leaves_tree_unchanged() {
        let tree = ResourceTree::new();
        let root = tree.attach(None, h("app.jar")).unwrap();

        let err = tree.attach(Some(ResourceId::new(99)), h("orphan")).unwrap_err();
        assert_eq!(
            err,
            TreeError::ParentNotFound {
                parent: ResourceId::new(99)
            }
        );
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.roots(), vec![root]);
        assert!(tree.children(root).unwrap().is_empty());
    }

    #[test]
    fn remove_detaches_whole_subtree_in_preorder() {
        let tree = ResourceTree::new();
        let root = tree.attach(None, h("app.jar")).unwrap();
        let pkg = tree.attach(Some(root), h("com/")).unwrap();
        let a = tree.attach(Some(pkg), h("com/A.class")).unwrap();
        let b = tree.attach(Some(pkg), h("com/B.class")).unwrap();
        let keep = tree.attach(Some(root), h("META-INF/")).unwrap();

        let removed: Vec<ResourceId> = tree.remove(pkg).unwrap().into_iter().map(|(id, _)| id).collect();
        assert_eq!(removed, vec![pkg, a, b]);
        assert_eq!(tree.children(root).unwrap(), vec![keep]);
        assert!(!tree.contains(a));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.remove(pkg).unwrap_err(), TreeError::NodeNotFound { node: pkg });
    }

    #[test]
    fn reparent_rejects_cycles() {
        let tree = ResourceTree::new();
        let root = tree.attach(None, h("r")).unwrap();
        let mid = tree.attach(Some(root), h("m")).unwrap();
        let leaf = tree.attach(Some(mid), h("l")).unwrap();

        assert_eq!(
            tree.reparent(mid, Some(leaf)).unwrap_err(),
            TreeError::Cycle { node: mid, parent: leaf }
        );
        assert_eq!(
            tree.reparent(mid, Some(mid)).unwrap_err(),
            TreeError::Cycle { node: mid, parent: mid }
        );
        assert_eq!(tree.children(mid).unwrap(), vec![leaf]);

        tree.reparent(leaf, Some(root)).unwrap();
        assert_eq!(tree.children(root).unwrap(), vec![mid, leaf]);
        assert!(tree.children(mid).unwrap().is_empty());

        tree.reparent(mid, None).unwrap();
        assert_eq!(tree.roots(), vec![root, mid]);
        assert_eq!(tree.parent(mid).unwrap(), None);
    }

    #[test]
    fn ancestors_walk_up_to_root() {
        let tree = ResourceTree::new();
        let root = tree.attach(None, h("r")).unwrap();
        let mid = tree.attach(Some(root), h("m")).unwrap();
        let leaf = tree.attach(Some(mid), h("l")).unwrap();

        assert_eq!(tree.ancestors(leaf).unwrap(), vec![leaf, mid, root]);
        assert_eq!(tree.ancestors(root).unwrap(), vec![root]);

        let view = tree.view();
        let mut walk = view.ancestors(leaf);
        assert_eq!(walk.next(), Some(leaf));
        assert_eq!(walk.next(), Some(mid));
        assert_eq!(view.ancestors(ResourceId::new(77)).count(), 0);
        assert_eq!(view.handle(mid).map(|h| h.as_str()), Some("m"));
    }
}

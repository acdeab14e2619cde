//! Undo/redo over reversible selection edits.
//!
//! Only selection changes are recorded. Cursor movement and expand/collapse
//! run immediately and never reach the history.

use crate::tree::{FileTree, NodeId, SelectionState};
use std::collections::BTreeMap;

/// A change that can be replayed and rolled back against `Target`.
pub trait Reversible {
    type Target;

    fn apply(&self, target: &mut Self::Target);
    fn revert(&self, target: &mut Self::Target);
}

/// Linear history: committing a new action drops everything that was undone.
#[derive(Debug)]
pub struct History<A> {
    undo_stack: Vec<A>,
    redo_stack: Vec<A>,
    limit: usize,
}

impl<A: Reversible> History<A> {
    /// `limit` caps the undo stack; the oldest action falls off first.
    pub fn new(limit: usize) -> Self {
        History {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn commit(&mut self, action: A, target: &mut A::Target) {
        action.apply(target);
        self.undo_stack.push(action);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.limit {
            self.undo_stack.remove(0);
        }
    }

    /// Returns false when there is nothing to undo.
    pub fn undo(&mut self, target: &mut A::Target) -> bool {
        let Some(action) = self.undo_stack.pop() else {
            return false;
        };
        action.revert(target);
        self.redo_stack.push(action);
        true
    }

    /// Returns false when there is nothing to redo.
    pub fn redo(&mut self, target: &mut A::Target) -> bool {
        let Some(action) = self.redo_stack.pop() else {
            return false;
        };
        action.apply(target);
        self.undo_stack.push(action);
        true
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
}

/// Selection edit recorded as data. `previous` holds the state of every node
/// the edit can touch (targets, their subtrees and their ancestors) as it was
/// before the first apply, so reverting is a plain write-back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionAction {
    SetSelection {
        node: NodeId,
        target: bool,
        previous: Vec<(NodeId, SelectionState)>,
    },
    BulkSetSelection {
        nodes: Vec<NodeId>,
        target: bool,
        previous: Vec<(NodeId, SelectionState)>,
    },
}

impl SelectionAction {
    pub fn set_selection(tree: &FileTree, node: NodeId, target: bool) -> Self {
        SelectionAction::SetSelection {
            node,
            target,
            previous: capture(tree, &[node]),
        }
    }

    pub fn bulk(tree: &FileTree, nodes: Vec<NodeId>, target: bool) -> Self {
        let previous = capture(tree, &nodes);
        SelectionAction::BulkSetSelection {
            nodes,
            target,
            previous,
        }
    }

    pub fn previous(&self) -> &[(NodeId, SelectionState)] {
        match self {
            SelectionAction::SetSelection { previous, .. }
            | SelectionAction::BulkSetSelection { previous, .. } => previous,
        }
    }
}

fn capture(tree: &FileTree, nodes: &[NodeId]) -> Vec<(NodeId, SelectionState)> {
    let mut touched = BTreeMap::new();
    for &node in nodes {
        for id in tree.subtree(node).into_iter().chain(tree.ancestors(node)) {
            touched.entry(id).or_insert_with(|| tree.node(id).state);
        }
    }
    touched.into_iter().collect()
}

impl Reversible for SelectionAction {
    type Target = FileTree;

    fn apply(&self, tree: &mut FileTree) {
        match self {
            SelectionAction::SetSelection { node, target, .. } => {
                tree.set_selected(*node, *target);
            }
            SelectionAction::BulkSetSelection { nodes, target, .. } => {
                for &node in nodes {
                    tree.set_selected(node, *target);
                }
            }
        }
    }

    fn revert(&self, tree: &mut FileTree) {
        for &(id, state) in self.previous() {
            tree.restore_state(id, state);
        }
    }
}

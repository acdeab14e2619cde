use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Stable handle into a [`FileTree`] arena. Valid for the whole session since
/// the tree is never restructured after the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Unselected,
    PartiallySelected,
    Selected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    /// Path relative to the session root; empty for the root itself.
    pub path: PathBuf,
    pub kind: NodeKind,
    pub is_binary: bool,
    pub size: u64,
    pub depth: usize,
    pub expanded: bool,
    pub state: SelectionState,
    eligible: bool,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Node {
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn is_empty_dir(&self) -> bool {
        self.is_dir() && self.children.is_empty()
    }

    /// Binary files never change state and are left out of their parent's
    /// aggregate. So is a directory with nothing selectable below it, whether
    /// it is empty or holds only binaries.
    pub fn is_selectable(&self) -> bool {
        self.eligible
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// Arena-backed directory tree. Parents own their `children` lists; the
/// `parent` link is a plain index used only for upward propagation.
#[derive(Debug, Clone)]
pub struct FileTree {
    root_path: PathBuf,
    nodes: Vec<Node>,
    by_path: HashMap<PathBuf, NodeId>,
}

impl FileTree {
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        let root_path = root_path.into();
        let name = root_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root_path.display().to_string());
        let root = Node {
            name,
            path: PathBuf::new(),
            kind: NodeKind::Directory,
            is_binary: false,
            size: 0,
            depth: 0,
            expanded: true,
            state: SelectionState::Unselected,
            eligible: false,
            children: Vec::new(),
            parent: None,
        };
        let mut by_path = HashMap::new();
        by_path.insert(PathBuf::new(), NodeId(0));
        FileTree {
            root_path,
            nodes: vec![root],
            by_path,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Looks a node up by its root-relative path.
    pub fn find(&self, relative: &Path) -> Option<NodeId> {
        self.by_path.get(&normalize(relative)).copied()
    }

    pub(crate) fn insert_file(
        &mut self,
        parent: NodeId,
        name: &str,
        size: u64,
        is_binary: bool,
    ) -> NodeId {
        self.push_child(parent, name, NodeKind::File, size, is_binary)
    }

    pub(crate) fn insert_dir(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.push_child(parent, name, NodeKind::Directory, 0, false)
    }

    fn push_child(
        &mut self,
        parent: NodeId,
        name: &str,
        kind: NodeKind,
        size: u64,
        is_binary: bool,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent_node = &self.nodes[parent.0];
        let path = parent_node.path.join(name);
        let depth = parent_node.depth + 1;
        let is_binary = kind == NodeKind::File && is_binary;
        let eligible = kind == NodeKind::File && !is_binary;
        self.nodes.push(Node {
            name: name.to_string(),
            path: path.clone(),
            kind,
            is_binary,
            size,
            depth,
            expanded: kind == NodeKind::Directory,
            state: SelectionState::Unselected,
            eligible,
            children: Vec::new(),
            parent: Some(parent),
        });
        self.nodes[parent.0].children.push(id);
        self.by_path.insert(path, id);
        if eligible {
            self.mark_eligible_upwards(parent);
        }
        id
    }

    /// A directory becomes selectable once its first selectable descendant
    /// is inserted.
    fn mark_eligible_upwards(&mut self, from: NodeId) {
        let mut current = Some(from);
        while let Some(dir) = current {
            let node = &mut self.nodes[dir.0];
            if node.eligible {
                break;
            }
            node.eligible = true;
            current = node.parent;
        }
    }

    /// Selects or deselects `id` and its whole subtree, then re-derives the
    /// ancestors. Returns whether any node changed state.
    pub fn set_selected(&mut self, id: NodeId, target: bool) -> bool {
        if !self.nodes[id.0].is_selectable() {
            return false;
        }
        let state = if target {
            SelectionState::Selected
        } else {
            SelectionState::Unselected
        };

        let mut changed = false;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &mut self.nodes[current.0];
            if !node.is_selectable() {
                continue;
            }
            if node.state != state {
                node.state = state;
                changed = true;
            }
            stack.extend(node.children.iter().copied());
        }

        if self.propagate_up(id) {
            changed = true;
        }
        changed
    }

    /// Walks from `from`'s parent towards the root, stopping at the first
    /// ancestor whose derived state is already current.
    fn propagate_up(&mut self, from: NodeId) -> bool {
        let mut changed = false;
        let mut current = self.nodes[from.0].parent;
        while let Some(ancestor) = current {
            let Some(derived) = self.derive_state(ancestor) else {
                break;
            };
            if derived == self.nodes[ancestor.0].state {
                break;
            }
            self.nodes[ancestor.0].state = derived;
            changed = true;
            current = self.nodes[ancestor.0].parent;
        }
        changed
    }

    /// State a directory must hold given its eligible children, or `None` for
    /// files and for non-selectable directories.
    pub fn derive_state(&self, id: NodeId) -> Option<SelectionState> {
        let node = &self.nodes[id.0];
        if !node.is_dir() {
            return None;
        }
        let mut eligible = 0usize;
        let mut selected = 0usize;
        let mut touched = false;
        for &child in &node.children {
            let child = &self.nodes[child.0];
            if !child.is_selectable() {
                continue;
            }
            eligible += 1;
            match child.state {
                SelectionState::Selected => {
                    selected += 1;
                    touched = true;
                }
                SelectionState::PartiallySelected => touched = true,
                SelectionState::Unselected => {}
            }
        }
        if eligible == 0 {
            return None;
        }
        Some(if selected == eligible {
            SelectionState::Selected
        } else if touched {
            SelectionState::PartiallySelected
        } else {
            SelectionState::Unselected
        })
    }

    pub fn toggle_expand(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.0];
        if node.is_dir() {
            node.expanded = !node.expanded;
        }
    }

    pub fn set_expanded(&mut self, id: NodeId, expanded: bool) {
        let node = &mut self.nodes[id.0];
        if node.is_dir() {
            node.expanded = expanded;
        }
    }

    /// Writes a recorded state back verbatim. Only history uses this, with a
    /// snapshot that already satisfies the aggregation rule.
    pub(crate) fn restore_state(&mut self, id: NodeId, state: SelectionState) {
        self.nodes[id.0].state = state;
    }

    /// `id` followed by all of its descendants, pre-order.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.nodes[current.0].children.iter().rev().copied());
        }
        out
    }

    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.nodes[id.0].parent, |p| self.nodes[p.0].parent)
    }

    /// Selected leaf files in tree order.
    pub fn selected_leaves(&self) -> Vec<NodeId> {
        self.subtree(self.root())
            .into_iter()
            .filter(|&id| {
                let node = &self.nodes[id.0];
                !node.is_dir() && node.state == SelectionState::Selected
            })
            .collect()
    }

    pub fn selected_size(&self) -> u64 {
        self.selected_leaves()
            .into_iter()
            .map(|id| self.nodes[id.0].size)
            .sum()
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

use crate::tree::{FileTree, NodeId};

/// The rows the user currently sees: pre-order from the root's children,
/// descending only into expanded directories. The root itself is never listed.
pub fn flatten(tree: &FileTree) -> Vec<NodeId> {
    let mut visible = Vec::new();
    let mut stack: Vec<NodeId> = tree
        .node(tree.root())
        .children()
        .iter()
        .rev()
        .copied()
        .collect();

    while let Some(id) = stack.pop() {
        visible.push(id);
        let node = tree.node(id);
        if node.is_dir() && node.expanded {
            stack.extend(node.children().iter().rev().copied());
        }
    }
    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::SelectionState;
    use crate::tree::tests::{id, nested_tree, sample_tree};

    fn names(tree: &FileTree, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .map(|&id| tree.node(id).path.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_collapse_and_reexpand_scenario() {
        let mut tree = sample_tree();
        let dir_a = id(&tree, "dirA");
        tree.set_selected(id(&tree, "dirA/f1.txt"), true);
        assert_eq!(tree.node(dir_a).state, SelectionState::Selected);

        let expanded = flatten(&tree);
        assert_eq!(
            names(&tree, &expanded),
            vec!["dirA", "dirA/f1.txt", "dirA/f2.bin", "f3.txt"]
        );

        tree.toggle_expand(dir_a);
        assert_eq!(names(&tree, &flatten(&tree)), vec!["dirA", "f3.txt"]);

        tree.toggle_expand(dir_a);
        assert_eq!(flatten(&tree), expanded);
    }

    #[test]
    fn test_collapsed_ancestor_hides_expanded_descendants() {
        let mut tree = nested_tree();
        let a = id(&tree, "a");
        let b = id(&tree, "a/b");
        assert!(tree.node(b).expanded);

        tree.toggle_expand(a);
        let visible = flatten(&tree);
        assert!(!visible.contains(&b));
        assert!(!visible.contains(&id(&tree, "a/b/z.txt")));
        assert_eq!(names(&tree, &visible), vec!["a", "c.txt", "d", "d/only.bin"]);
    }

    #[test]
    fn test_flatten_is_repeatable() {
        let tree = nested_tree();
        let first = flatten(&tree);
        assert_eq!(first, flatten(&tree));
        assert!(!first.contains(&tree.root()));
        assert_eq!(first.len(), tree.len() - 1);
    }
}

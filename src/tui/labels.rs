use crate::tree::{FileTree, NodeId};

fn is_last_child(tree: &FileTree, id: NodeId) -> bool {
    match tree.node(id).parent() {
        Some(parent) => tree.node(parent).children().last() == Some(&id),
        None => true,
    }
}

/// Tree guide drawn in front of a row's name, e.g. `│  └─ `.
///
/// Top-level rows get a branch only; each deeper level adds `│  ` when the
/// ancestor at that level still has siblings below it, `   ` otherwise.
pub fn guide_prefix(tree: &FileTree, id: NodeId) -> String {
    let mut segments = vec![if is_last_child(tree, id) {
        "└─ "
    } else {
        "├─ "
    }];
    for ancestor in tree.ancestors(id) {
        if tree.node(ancestor).parent().is_none() {
            break;
        }
        segments.push(if is_last_child(tree, ancestor) {
            "   "
        } else {
            "│  "
        });
    }
    segments.reverse();
    segments.concat()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::{id, nested_tree};

    #[test]
    fn test_guides_follow_sibling_structure() {
        let tree = nested_tree();
        assert_eq!(guide_prefix(&tree, id(&tree, "a")), "├─ ");
        assert_eq!(guide_prefix(&tree, id(&tree, "d")), "└─ ");
        assert_eq!(guide_prefix(&tree, id(&tree, "a/x.txt")), "│  ├─ ");
        assert_eq!(guide_prefix(&tree, id(&tree, "a/empty")), "│  └─ ");
        assert_eq!(guide_prefix(&tree, id(&tree, "a/b/w.txt")), "│  │  └─ ");
        assert_eq!(guide_prefix(&tree, id(&tree, "d/only.bin")), "   └─ ");
    }
}

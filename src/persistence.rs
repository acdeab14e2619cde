use crate::error::{Error, Result};
use crate::tree::FileTree;
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

pub const STATE_FILE_NAME: &str = ".punjado";

/// Where the selected leaf paths live between sessions.
pub trait SelectionStore {
    fn load(&self) -> Result<BTreeSet<String>>;
    fn save(&self, paths: &BTreeSet<String>) -> Result<()>;
}

/// Plain text, one root-relative POSIX path per line.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn in_dir(root: &Path) -> Self {
        StateFile {
            path: root.join(STATE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SelectionStore for StateFile {
    fn load(&self) -> Result<BTreeSet<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(parse(&contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeSet::new()),
            Err(e) => Err(Error::io(&self.path, e)),
        }
    }

    fn save(&self, paths: &BTreeSet<String>) -> Result<()> {
        let mut contents = String::new();
        for path in paths {
            contents.push_str(path);
            contents.push('\n');
        }
        fs::write(&self.path, contents).map_err(|e| Error::io(&self.path, e))?;
        debug!(path = ?self.path, entries = paths.len(), "Saved selection");
        Ok(())
    }
}

fn parse(contents: &str) -> BTreeSet<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(normalize)
        .collect()
}

/// Root-relative path in the stored form: `/`-separated, no `.` segments.
pub fn to_posix(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

pub fn normalize(entry: &str) -> String {
    to_posix(Path::new(entry))
}

pub fn from_posix(entry: &str) -> PathBuf {
    entry.split('/').filter(|part| !part.is_empty()).collect()
}

/// Selected leaves of `tree` in stored form.
pub fn selected_paths(tree: &FileTree) -> BTreeSet<String> {
    tree.selected_leaves()
        .into_iter()
        .map(|id| to_posix(&tree.node(id).path))
        .collect()
}

/// Re-selects every stored leaf; ancestors re-derive through the normal
/// propagation. Returns how many entries matched a selectable file.
pub fn restore_selection(tree: &mut FileTree, paths: &BTreeSet<String>) -> usize {
    let mut restored = 0;
    for entry in paths {
        let Some(id) = tree.find(&from_posix(entry)) else {
            debug!(path = %entry, "Stored path no longer exists");
            continue;
        };
        let node = tree.node(id);
        if node.is_dir() || !node.is_selectable() {
            debug!(path = %entry, "Stored path is not a selectable file");
            continue;
        }
        tree.set_selected(id, true);
        restored += 1;
    }
    restored
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::file_scanner::{ScanOptions, scan_tree};
    use crate::tree::{NodeId, SelectionState};
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    /// In-memory store whose contents stay observable after it is moved.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct MemoryStore {
        pub(crate) saved: Rc<RefCell<BTreeSet<String>>>,
        pub(crate) saves: Rc<RefCell<usize>>,
    }

    impl SelectionStore for MemoryStore {
        fn load(&self) -> Result<BTreeSet<String>> {
            Ok(self.saved.borrow().clone())
        }

        fn save(&self, paths: &BTreeSet<String>) -> Result<()> {
            *self.saved.borrow_mut() = paths.clone();
            *self.saves.borrow_mut() += 1;
            Ok(())
        }
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/util")).unwrap();
        fs::create_dir_all(root.join("docs")).unwrap();
        fs::create_dir_all(root.join("assets")).unwrap();
        fs::write(root.join("assets/logo.png"), "png").unwrap();
        fs::write(root.join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(root.join("src/util/a.rs"), "// a").unwrap();
        fs::write(root.join("src/util/b.rs"), "// b").unwrap();
        fs::write(root.join("docs/guide.md"), "guide").unwrap();
        fs::write(root.join("Cargo.toml"), "[package]").unwrap();
        dir
    }

    fn scan(root: &Path) -> FileTree {
        let options = ScanOptions {
            ignore: vec![STATE_FILE_NAME.into()],
            respect_gitignore: false,
        };
        scan_tree(root, &options)
    }

    fn dir_states(tree: &FileTree) -> Vec<(PathBuf, SelectionState)> {
        tree.ids()
            .map(|id: NodeId| tree.node(id))
            .filter(|node| node.is_dir())
            .map(|node| (node.path.clone(), node.state))
            .collect()
    }

    #[test]
    fn test_round_trip_through_state_file() {
        let dir = project();
        let mut tree = scan(dir.path());
        for path in ["src/util/a.rs", "src/util/b.rs", "Cargo.toml"] {
            let id = tree.find(Path::new(path)).unwrap();
            tree.set_selected(id, true);
        }
        let expected = selected_paths(&tree);
        let expected_dirs = dir_states(&tree);

        let store = StateFile::in_dir(dir.path());
        store.save(&expected).unwrap();

        let mut rebuilt = scan(dir.path());
        let loaded = store.load().unwrap();
        assert_eq!(restore_selection(&mut rebuilt, &loaded), 3);
        assert_eq!(selected_paths(&rebuilt), expected);
        assert_eq!(dir_states(&rebuilt), expected_dirs);

        let util = rebuilt.find(Path::new("src/util")).unwrap();
        let src = rebuilt.find(Path::new("src")).unwrap();
        assert_eq!(rebuilt.node(util).state, SelectionState::Selected);
        assert_eq!(rebuilt.node(src).state, SelectionState::PartiallySelected);

        // Everything selected, including a directory that holds only a binary.
        let root = tree.root();
        tree.set_selected(root, true);
        assert_eq!(tree.node(root).state, SelectionState::Selected);
        let expected_dirs = dir_states(&tree);
        store.save(&selected_paths(&tree)).unwrap();

        let mut rebuilt = scan(dir.path());
        restore_selection(&mut rebuilt, &store.load().unwrap());
        assert_eq!(dir_states(&rebuilt), expected_dirs);
        let assets = rebuilt.find(Path::new("assets")).unwrap();
        assert!(!rebuilt.node(assets).is_selectable());
        assert_eq!(rebuilt.node(assets).state, SelectionState::Unselected);
    }

    #[test]
    fn test_missing_file_is_empty_selection() {
        let dir = TempDir::new().unwrap();
        let store = StateFile::in_dir(dir.path());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_blank_lines_and_dot_prefixes_are_normalized() {
        let dir = TempDir::new().unwrap();
        let store = StateFile::in_dir(dir.path());
        fs::write(store.path(), "\n./src/main.rs\n\n  docs/guide.md  \n").unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(
            loaded.into_iter().collect::<Vec<_>>(),
            vec!["docs/guide.md".to_string(), "src/main.rs".to_string()]
        );
    }

    #[test]
    fn test_directories_and_unknown_paths_are_not_restored() {
        let dir = project();
        let mut tree = scan(dir.path());
        let stored: BTreeSet<String> = ["src", "gone.rs", "docs/guide.md"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(restore_selection(&mut tree, &stored), 1);
        let src = tree.find(Path::new("src")).unwrap();
        assert_eq!(tree.node(src).state, SelectionState::Unselected);
    }

    #[test]
    fn test_save_writes_sorted_lines() {
        let dir = TempDir::new().unwrap();
        let store = StateFile::in_dir(dir.path());
        let paths: BTreeSet<String> = ["b.rs", "a/z.rs"].into_iter().map(String::from).collect();
        store.save(&paths).unwrap();
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "a/z.rs\nb.rs\n");
    }
}

use crate::tree::{FileTree, NodeId};
use ignore::WalkBuilder;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "ico", "webp", // images
    "pdf", "zip", "tar", "gz", "7z", "rar", // archives
    "exe", "dll", "so", "dylib", "bin", // executables
    "mp3", "mp4", "wav", "avi", "mov", // media
];

const SNIFF_LEN: usize = 512;

#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Substrings matched against root-relative paths. A matching directory
    /// is pruned together with its subtree.
    pub ignore: Vec<String>,
    pub respect_gitignore: bool,
}

impl ScanOptions {
    pub fn is_ignored(&self, relative: &Path) -> bool {
        let text = relative.to_string_lossy();
        self.ignore.iter().any(|pattern| text.contains(pattern.as_str()))
    }
}

/// Extension allowlist first, then a NUL byte in the first 512 bytes.
/// Unreadable files count as text.
pub fn is_binary(path: &Path) -> bool {
    let by_extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| BINARY_EXTENSIONS.contains(&ext.as_str()));
    if by_extension {
        return true;
    }

    let Ok(file) = File::open(path) else {
        return false;
    };
    let mut head = Vec::with_capacity(SNIFF_LEN);
    if file.take(SNIFF_LEN as u64).read_to_end(&mut head).is_err() {
        return false;
    }
    head.contains(&0)
}

/// Scans `root` into a [`FileTree`]. Entries that fail to read are left out;
/// the scan itself never fails.
pub fn scan_tree(root: &Path, options: &ScanOptions) -> FileTree {
    let mut tree = FileTree::new(root);
    let filter_root = root.to_path_buf();
    let filter_options = options.clone();

    let mut walker = WalkBuilder::new(root);
    walker
        .standard_filters(false)
        .hidden(false)
        .git_ignore(options.respect_gitignore)
        .require_git(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            let relative = entry
                .path()
                .strip_prefix(&filter_root)
                .unwrap_or(entry.path());
            relative.as_os_str().is_empty() || !filter_options.is_ignored(relative)
        });

    let mut skipped = 0usize;
    for result in walker.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                skipped += 1;
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }

        let path = entry.path();
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let Some(parent) = relative.parent().and_then(|p| tree.find(p)) else {
            // Parent was itself omitted.
            skipped += 1;
            continue;
        };
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!(path = ?path, error = %e, "No metadata, omitting");
                skipped += 1;
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy();
        if metadata.is_dir() {
            tree.insert_dir(parent, &name);
        } else {
            tree.insert_file(parent, &name, metadata.len(), is_binary(path));
        }
    }

    debug!(root = ?root, nodes = tree.len(), skipped, "Scanned tree");
    tree
}

/// Eligible files at or below `relative`, as root-relative paths. Used by the
/// command line surface, which stores leaves only.
pub fn collect_leaves(root: &Path, relative: &Path, options: &ScanOptions) -> Vec<PathBuf> {
    let target = root.join(relative);
    if target.is_file() {
        if is_binary(&target) {
            return Vec::new();
        }
        return vec![relative.to_path_buf()];
    }

    let tree = scan_tree(root, options);
    let Some(start) = tree.find(relative) else {
        return Vec::new();
    };
    tree.subtree(start)
        .into_iter()
        .map(|id: NodeId| tree.node(id))
        .filter(|node| !node.is_dir() && node.is_selectable())
        .map(|node| node.path.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("src/main.rs"), "fn main() {}\n").unwrap();
        fs::write(root.join("src/nested/lib.rs"), "pub fn f() {}\n").unwrap();
        fs::write(root.join("src/blob.dat"), [0x7f, 0x45, 0x00, 0x01]).unwrap();
        fs::write(root.join("logo.png"), "not really a png").unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "x").unwrap();
        fs::write(root.join("README.md"), "# hi\n").unwrap();
        dir
    }

    fn options() -> ScanOptions {
        ScanOptions {
            ignore: vec!["node_modules".into()],
            respect_gitignore: false,
        }
    }

    #[test]
    fn test_scan_builds_sorted_tree_and_prunes_ignored() {
        let dir = fixture();
        let tree = scan_tree(dir.path(), &options());

        let names: Vec<_> = tree
            .node(tree.root())
            .children()
            .iter()
            .map(|&id| tree.node(id).name.clone())
            .collect();
        assert_eq!(names, vec!["README.md", "empty", "logo.png", "src"]);
        assert!(tree.find(Path::new("node_modules")).is_none());
        assert!(tree.find(Path::new("node_modules/pkg/index.js")).is_none());

        let lib = tree.find(Path::new("src/nested/lib.rs")).unwrap();
        assert_eq!(tree.node(lib).depth, 3);
        assert_eq!(tree.node(lib).size, 14);
    }

    #[test]
    fn test_scan_flags_binaries_and_empty_dirs() {
        let dir = fixture();
        let tree = scan_tree(dir.path(), &options());

        let blob = tree.find(Path::new("src/blob.dat")).unwrap();
        let logo = tree.find(Path::new("logo.png")).unwrap();
        let main = tree.find(Path::new("src/main.rs")).unwrap();
        let empty = tree.find(Path::new("empty")).unwrap();
        assert!(tree.node(blob).is_binary);
        assert!(tree.node(logo).is_binary);
        assert!(!tree.node(main).is_binary);
        assert!(tree.node(empty).is_empty_dir());
        assert!(!tree.node(empty).is_selectable());
    }

    #[test]
    fn test_scan_of_missing_root_is_just_the_root() {
        let dir = TempDir::new().unwrap();
        let tree = scan_tree(&dir.path().join("gone"), &options());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_is_binary_by_content() {
        let dir = TempDir::new().unwrap();
        let text = dir.path().join("notes.txt");
        let nul = dir.path().join("data.raw");
        fs::write(&text, "plain text").unwrap();
        fs::write(&nul, b"abc\0def").unwrap();
        assert!(!is_binary(&text));
        assert!(is_binary(&nul));
        assert!(!is_binary(&dir.path().join("missing.txt")));
    }

    #[test]
    fn test_collect_leaves_expands_directories() {
        let dir = fixture();
        let leaves = collect_leaves(dir.path(), Path::new("src"), &options());
        assert_eq!(
            leaves,
            vec![PathBuf::from("src/main.rs"), PathBuf::from("src/nested/lib.rs")]
        );
        assert_eq!(
            collect_leaves(dir.path(), Path::new("README.md"), &options()),
            vec![PathBuf::from("README.md")]
        );
        assert!(collect_leaves(dir.path(), Path::new("logo.png"), &options()).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_left_out() {
        use std::os::unix::fs::PermissionsExt;

        let dir = fixture();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("secret.rs"), "x").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        // Privileged users read through mode 000; nothing to check then.
        let readable = fs::read_dir(&locked).is_ok();

        let tree = scan_tree(dir.path(), &options());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        if readable {
            return;
        }

        assert!(tree.find(Path::new("locked/secret.rs")).is_none());
        if let Some(id) = tree.find(Path::new("locked")) {
            assert!(!tree.node(id).is_selectable());
        }
        assert!(tree.find(Path::new("src/nested/lib.rs")).is_some());
        assert!(tree.find(Path::new("README.md")).is_some());
    }

    #[test]
    fn test_directory_of_binaries_is_not_selectable() {
        let dir = fixture();
        fs::create_dir_all(dir.path().join("assets/icons")).unwrap();
        fs::write(dir.path().join("assets/icons/a.png"), "png").unwrap();
        fs::write(dir.path().join("assets/b.gif"), "gif").unwrap();
        let tree = scan_tree(dir.path(), &options());

        let assets = tree.find(Path::new("assets")).unwrap();
        assert!(!tree.node(assets).is_empty_dir());
        assert!(!tree.node(assets).is_selectable());
        assert!(tree.node(tree.root()).is_selectable());
        assert!(collect_leaves(dir.path(), Path::new("assets"), &options()).is_empty());
    }
}

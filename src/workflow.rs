use crate::cli::{Cli, Commands, ScanArgs};
use crate::commands::{self, print_lines};
use crate::config::Config;
use crate::controller::SelectionController;
use crate::export::approx_tokens;
use crate::file_scanner::scan_tree;
use crate::keymap::KeyResolver;
use crate::persistence::{SelectionStore, StateFile, restore_selection};
use crate::tui::{self, Theme};
use anyhow::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub fn run(cli: Cli) -> Result<()> {
    let scan = cli.scan;
    match cli.command {
        None => open_session(&session_root(cli.path), &scan),
        Some(Commands::Open { path }) => open_session(&session_root(path.or(cli.path)), &scan),
        Some(Commands::Add { dir, paths }) => {
            let added = commands::add(&Config::resolve(&dir.dir, &scan)?, &paths)?;
            print_lines(&added, "Added");
            Ok(())
        }
        Some(Commands::Remove { dir, paths }) => {
            let removed = commands::remove(&Config::resolve(&dir.dir, &scan)?, &paths)?;
            print_lines(&removed, "Removed");
            Ok(())
        }
        Some(Commands::Toggle { dir, path }) => {
            let selected = commands::toggle(&Config::resolve(&dir.dir, &scan)?, &path)?;
            let verb = if selected { "Added" } else { "Removed" };
            println!("{verb}: {}", path.display());
            Ok(())
        }
        Some(Commands::List { dir }) => {
            for entry in commands::list(&Config::resolve(&dir.dir, &scan)?)? {
                println!("{entry}");
            }
            Ok(())
        }
        Some(Commands::Status { dir, path }) => {
            let selected = commands::status(&Config::resolve(&dir.dir, &scan)?, &path)?;
            println!("{}", u8::from(selected));
            Ok(())
        }
        Some(Commands::Copy { dir, stdout }) => {
            commands::copy(&Config::resolve(&dir.dir, &scan)?, stdout)
        }
        Some(Commands::Git { dir }) => {
            let added = commands::git(&Config::resolve(&dir.dir, &scan)?)?;
            if added.is_empty() {
                println!("No new changed files to add.");
            }
            print_lines(&added, "Added");
            Ok(())
        }
    }
}

fn session_root(path: Option<PathBuf>) -> PathBuf {
    path.unwrap_or_else(|| PathBuf::from("."))
}

/// A missing or unreadable `.punjado` starts the session empty.
fn load_previous(store: &StateFile) -> BTreeSet<String> {
    store.load().unwrap_or_else(|e| {
        warn!(error = %e, path = %store.path().display(), "Ignoring unreadable selection file");
        BTreeSet::new()
    })
}

fn open_session(root: &Path, scan: &ScanArgs) -> Result<()> {
    let config = Config::resolve(root, scan)?;
    info!(root = %config.root.display(), "Opening selector");

    let mut tree = scan_tree(&config.root, &config.scan);
    let store = StateFile::in_dir(&config.root);
    let restored = restore_selection(&mut tree, &load_previous(&store));
    debug!(nodes = tree.len(), restored, "Tree ready");

    let resolver = KeyResolver::with_defaults()?;
    let mut controller =
        SelectionController::new(tree, resolver, Box::new(store), config.history_limit);
    tui::run(&mut controller, &Theme::default(), config.token_warning)?;
    controller.persist();

    let tree = controller.into_tree();
    let files = tree.selected_leaves().len();
    let tokens = approx_tokens(tree.selected_size());
    println!("✅ {files} files selected (≈ {tokens} tokens).");
    Ok(())
}

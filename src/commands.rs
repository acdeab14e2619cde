//! Subcommands that edit the stored selection without opening the selector.

use crate::clipboard;
use crate::config::Config;
use crate::error::Error;
use crate::export::{approx_tokens, render_context};
use crate::file_scanner::collect_leaves;
use crate::persistence::{SelectionStore, StateFile, normalize, to_posix};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

fn load(store: &StateFile) -> Result<BTreeSet<String>> {
    store
        .load()
        .with_context(|| format!("Cannot read {}", store.path().display()))
}

fn save(store: &StateFile, paths: &BTreeSet<String>) -> Result<()> {
    store
        .save(paths)
        .with_context(|| format!("Cannot write {}", store.path().display()))
}

/// Arguments may be absolute as long as they point below the session root.
fn relative_path(config: &Config, path: &Path) -> Result<PathBuf> {
    if !path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    match absolute.strip_prefix(&config.root) {
        Ok(relative) => Ok(relative.to_path_buf()),
        Err(_) => Err(Error::OutsideRoot(path.to_path_buf()).into()),
    }
}

/// Leaves named by `relative`: the file itself, or every eligible file below
/// a directory.
fn leaves_for(config: &Config, relative: &Path) -> Result<Vec<String>> {
    if !config.root.join(relative).exists() {
        return Err(Error::NotFound(relative.to_path_buf()).into());
    }
    Ok(collect_leaves(&config.root, relative, &config.scan)
        .iter()
        .map(|p| to_posix(p))
        .collect())
}

pub fn add(config: &Config, paths: &[impl AsRef<Path>]) -> Result<Vec<String>> {
    let store = StateFile::in_dir(&config.root);
    let mut selection = load(&store)?;
    let mut added = Vec::new();
    for path in paths {
        let relative = relative_path(config, path.as_ref())?;
        for leaf in leaves_for(config, &relative)? {
            if selection.insert(leaf.clone()) {
                added.push(leaf);
            }
        }
    }
    save(&store, &selection)?;
    info!(count = added.len(), "Added to selection");
    Ok(added)
}

pub fn remove(config: &Config, paths: &[impl AsRef<Path>]) -> Result<Vec<String>> {
    let store = StateFile::in_dir(&config.root);
    let mut selection = load(&store)?;
    let mut removed = Vec::new();
    for path in paths {
        let key = to_posix(&relative_path(config, path.as_ref())?);
        let prefix = format!("{key}/");
        let before = selection.len();
        // A directory removes everything stored below it.
        selection.retain(|entry| {
            let hit = *entry == key || entry.starts_with(&prefix);
            if hit {
                removed.push(entry.clone());
            }
            !hit
        });
        if selection.len() == before {
            debug!(path = %key, "Not in selection");
        }
    }
    save(&store, &selection)?;
    Ok(removed)
}

/// Removes `path` when every file it names is stored, adds it otherwise. A
/// directory stands for its eligible files. Returns true when the files
/// ended up selected.
pub fn toggle(config: &Config, path: &Path) -> Result<bool> {
    let relative = relative_path(config, path)?;
    let selection = load(&StateFile::in_dir(&config.root))?;
    let all_selected = if config.root.join(&relative).exists() {
        let leaves = leaves_for(config, &relative)?;
        if leaves.is_empty() {
            anyhow::bail!("{} holds no selectable files", relative.display());
        }
        leaves.iter().all(|leaf| selection.contains(leaf))
    } else {
        // Deleted since it was stored; only removal makes sense.
        selection.contains(&to_posix(&relative))
    };
    if all_selected {
        remove(config, &[&relative])?;
        Ok(false)
    } else {
        add(config, &[&relative])?;
        Ok(true)
    }
}

pub fn list(config: &Config) -> Result<BTreeSet<String>> {
    load(&StateFile::in_dir(&config.root))
}

pub fn status(config: &Config, path: &Path) -> Result<bool> {
    let relative = relative_path(config, path)?;
    Ok(list(config)?.contains(&to_posix(&relative)))
}

pub fn export(config: &Config) -> Result<(String, usize)> {
    let selection = list(config)?;
    Ok((render_context(&config.root, &selection), selection.len()))
}

pub fn copy(config: &Config, to_stdout: bool) -> Result<()> {
    let (text, count) = export(config)?;
    if to_stdout {
        print!("{text}");
        return Ok(());
    }
    let tokens = approx_tokens(text.len() as u64);
    clipboard::copy_text_to_clipboard(text)
        .context("Error copying to clipboard (install xclip/wl-copy on Linux)")?;
    println!("✅ Copied {count} files (≈ {tokens} tokens) to the clipboard.");
    Ok(())
}

/// Paths from `git status --porcelain` output. Renames resolve to the new
/// name; quoting is left alone.
pub fn parse_porcelain(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| line.len() > 3)
        .map(|line| {
            let path = line[3..].trim();
            let path = path.rsplit(" -> ").next().unwrap_or(path);
            normalize(path)
        })
        .filter(|path| !path.is_empty())
        .collect()
}

/// Porcelain paths are relative to the repository top. Keeps those below
/// `prefix` (as printed by `git rev-parse --show-prefix`) and makes them
/// relative to it.
pub fn strip_repo_prefix(paths: Vec<String>, prefix: &str) -> Vec<String> {
    paths
        .into_iter()
        .filter_map(|path| path.strip_prefix(prefix).map(str::to_string))
        .filter(|path| !path.is_empty())
        .collect()
}

fn run_git(config: &Config, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(&config.root)
        .output()
        .map_err(|e| Error::Git(format!("cannot run git: {e}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Git(format!("git {} failed: {}", args[0], stderr.trim())).into());
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

pub fn git(config: &Config) -> Result<Vec<String>> {
    let prefix = run_git(config, &["rev-parse", "--show-prefix"])?;
    let status = run_git(
        config,
        &["status", "--porcelain", "--untracked-files=all", "--", "."],
    )?;
    debug!(prefix = prefix.trim(), "Reading git status");
    let changed: Vec<String> = strip_repo_prefix(parse_porcelain(&status), prefix.trim())
        .into_iter()
        .filter(|path| config.root.join(path).exists())
        .collect();
    add(config, &changed)
}

pub fn print_lines(lines: &[String], verb: &str) {
    for line in lines {
        println!("{verb}: {line}");
    }
}

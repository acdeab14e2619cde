use crate::cli::ScanArgs;
use crate::file_scanner::ScanOptions;
use crate::persistence::STATE_FILE_NAME;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const DEFAULT_IGNORE: &[&str] = &[".git", STATE_FILE_NAME, "node_modules"];

/// Header token count turns red above this.
pub const TOKEN_WARNING_THRESHOLD: u64 = 32_000;

/// Resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub scan: ScanOptions,
    pub history_limit: usize,
    pub token_warning: u64,
}

impl Config {
    pub fn resolve(root: &Path, args: &ScanArgs) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("Cannot open directory {}", root.display()))?;
        if !root.is_dir() {
            anyhow::bail!("{} is not a directory", root.display());
        }

        let mut ignore: Vec<String> = DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect();
        for extra in &args.ignore {
            if !ignore.contains(extra) {
                ignore.push(extra.clone());
            }
        }

        Ok(Config {
            root,
            scan: ScanOptions {
                ignore,
                respect_gitignore: args.gitignore,
            },
            history_limit: args.history_limit,
            token_warning: TOKEN_WARNING_THRESHOLD,
        })
    }
}

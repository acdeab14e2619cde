use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// punjado – pick the files that go into your LLM context
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Directory to browse (defaults to CWD)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    #[command(flatten)]
    pub scan: ScanArgs,

    /// Append debug logs to this file
    #[arg(long, global = true, value_name = "FILE", env = "PUNJADO_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// True when this invocation opens the selector and owns the terminal.
    pub fn is_interactive(&self) -> bool {
        matches!(self.command, None | Some(Commands::Open { .. }))
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ScanArgs {
    /// Extra path substrings to skip while scanning. Repeatable.
    #[arg(long, global = true, value_name = "SUBSTR")]
    pub ignore: Vec<String>,

    /// Also honor .gitignore files
    #[arg(long, global = true)]
    pub gitignore: bool,

    /// Maximum number of undo steps kept in a session
    #[arg(long, global = true, value_name = "N", default_value_t = 100)]
    pub history_limit: usize,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the interactive selector
    Open {
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },
    /// Add files (or every file below a directory) to the context
    Add {
        #[command(flatten)]
        dir: DirArg,
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,
    },
    /// Remove files from the context
    Remove {
        #[command(flatten)]
        dir: DirArg,
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,
    },
    /// Add a file if absent, remove it otherwise
    Toggle {
        #[command(flatten)]
        dir: DirArg,
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Print the selected files
    List {
        #[command(flatten)]
        dir: DirArg,
    },
    /// Print 1 if the file is selected, 0 otherwise
    Status {
        #[command(flatten)]
        dir: DirArg,
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Copy the selected files' contents to the clipboard
    Copy {
        #[command(flatten)]
        dir: DirArg,
        /// Print to standard output instead
        #[arg(long)]
        stdout: bool,
    },
    /// Add every file reported as changed by `git status`
    Git {
        #[command(flatten)]
        dir: DirArg,
    },
}

#[derive(Args, Debug, Clone)]
pub struct DirArg {
    /// Session root holding the .punjado file
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bare_path_opens_selector() {
        let cli = Cli::try_parse_from(["punjado", "some/dir", "--ignore", "target"]).unwrap();
        assert_eq!(cli.path, Some(PathBuf::from("some/dir")));
        assert!(cli.command.is_none());
        assert_eq!(cli.scan.ignore, vec!["target".to_string()]);
        assert_eq!(cli.scan.history_limit, 100);
        assert!(cli.is_interactive());
    }

    #[test]
    fn test_subcommand_with_dir() {
        let cli = Cli::try_parse_from(["punjado", "add", "-d", "repo", "a.rs", "b.rs"]).unwrap();
        match cli.command {
            Some(Commands::Add { dir, paths }) => {
                assert_eq!(dir.dir, PathBuf::from("repo"));
                assert_eq!(paths.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_log_file_is_global() {
        let cli = Cli::try_parse_from(["punjado", "list", "--log-file", "/tmp/p.log"]).unwrap();
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/p.log")));
        assert!(!cli.is_interactive());
    }
}

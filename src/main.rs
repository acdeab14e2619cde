mod cli;
mod clipboard;
mod commands;
mod config;
mod controller;
mod error;
mod export;
mod file_scanner;
mod flatten;
mod history;
mod keymap;
mod logging;
mod persistence;
mod tree;
mod tui;
mod workflow;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    // The clipboard holder re-invokes this binary; it must exit before clap
    // sees its private flag.
    if clipboard::run_holder_if_requested()? {
        return Ok(());
    }

    let cli = cli::Cli::parse();
    logging::init(cli.log_file.as_deref(), cli.is_interactive())?;
    workflow::run(cli)
}

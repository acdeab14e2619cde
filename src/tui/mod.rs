mod event_handler;
mod labels;
mod theme;
mod ui_renderer;

pub use theme::Theme;

use crate::clipboard;
use crate::controller::{Effect, SelectionController};
use crate::export::render_context;
use crate::persistence::selected_paths;
use anyhow::Result;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use event_handler::handle_events;
use ratatui::prelude::{Backend, CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use tracing::{info, warn};
use ui_renderer::ui_frame;

/// Runs the selector until the user quits. The terminal is restored even
/// when the loop fails.
pub fn run(controller: &mut SelectionController, theme: &Theme, token_warning: u64) -> Result<()> {
    let mut terminal = init_terminal()?;
    let outcome = event_loop(&mut terminal, controller, theme, token_warning);
    restore_terminal(terminal)?;
    outcome
}

fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    controller: &mut SelectionController,
    theme: &Theme,
    token_warning: u64,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui_frame(frame, controller, theme, token_warning))?;
        match handle_events(controller)? {
            Effect::None => {}
            Effect::Yank => yank(controller),
            Effect::Quit => return Ok(()),
        }
    }
}

fn yank(controller: &mut SelectionController) {
    let paths = selected_paths(controller.tree());
    if paths.is_empty() {
        controller.set_status("Nothing selected");
        return;
    }
    let text = render_context(controller.tree().root_path(), &paths);
    match clipboard::copy_text_to_clipboard(text) {
        Ok(()) => {
            info!(files = paths.len(), "Copied selection to clipboard");
            controller.set_status(format!("Copied {} files to the clipboard", paths.len()));
        }
        Err(e) => {
            warn!(error = %e, "Clipboard copy failed");
            controller.set_status(format!("Clipboard error: {e}"));
        }
    }
}

fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor().map_err(Into::into)
}

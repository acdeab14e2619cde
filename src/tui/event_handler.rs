use crate::controller::{Effect, SelectionController};
use crate::keymap::KeyToken;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};

/// Blocks for the next terminal event. Resizes and unmapped keys only
/// trigger a redraw.
pub(super) fn handle_events(controller: &mut SelectionController) -> Result<Effect> {
    if let Event::Key(key_event) = event::read()? {
        if key_event.kind == KeyEventKind::Press {
            if let Some(token) = KeyToken::from_event(&key_event) {
                return Ok(controller.handle_key(token));
            }
        }
    }
    Ok(Effect::None)
}

//! Chorded key bindings.
//!
//! Keys accumulate in a pending buffer until they spell out a complete
//! binding (dispatch), stop being a prefix of any binding (discard), or are
//! still a strict prefix (wait). There is no timeout.

use crate::error::{Error, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::fmt;
use tracing::{debug, warn};

/// One key press, as far as bindings are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyToken {
    Char(char),
    Ctrl(char),
    Up,
    Down,
    Left,
    Right,
    Enter,
    Esc,
    Tab,
    Backspace,
    PageUp,
    PageDown,
    Home,
    End,
}

impl KeyToken {
    pub fn from_event(event: &KeyEvent) -> Option<Self> {
        let token = match event.code {
            KeyCode::Char(c) if event.modifiers.contains(KeyModifiers::CONTROL) => {
                KeyToken::Ctrl(c.to_ascii_lowercase())
            }
            KeyCode::Char(c) => KeyToken::Char(c),
            KeyCode::Up => KeyToken::Up,
            KeyCode::Down => KeyToken::Down,
            KeyCode::Left => KeyToken::Left,
            KeyCode::Right => KeyToken::Right,
            KeyCode::Enter => KeyToken::Enter,
            KeyCode::Esc => KeyToken::Esc,
            KeyCode::Tab => KeyToken::Tab,
            KeyCode::Backspace => KeyToken::Backspace,
            KeyCode::PageUp => KeyToken::PageUp,
            KeyCode::PageDown => KeyToken::PageDown,
            KeyCode::Home => KeyToken::Home,
            KeyCode::End => KeyToken::End,
            _ => return None,
        };
        Some(token)
    }

    fn from_name(name: &str) -> Option<Self> {
        if let Some(rest) = name.strip_prefix("ctrl+") {
            let mut chars = rest.chars();
            return match (chars.next(), chars.next()) {
                (Some(c), None) => Some(KeyToken::Ctrl(c.to_ascii_lowercase())),
                _ => None,
            };
        }
        let token = match name {
            "space" => KeyToken::Char(' '),
            "lt" => KeyToken::Char('<'),
            "up" => KeyToken::Up,
            "down" => KeyToken::Down,
            "left" => KeyToken::Left,
            "right" => KeyToken::Right,
            "enter" | "cr" => KeyToken::Enter,
            "esc" => KeyToken::Esc,
            "tab" => KeyToken::Tab,
            "backspace" | "bs" => KeyToken::Backspace,
            "pageup" => KeyToken::PageUp,
            "pagedown" => KeyToken::PageDown,
            "home" => KeyToken::Home,
            "end" => KeyToken::End,
            _ => return None,
        };
        Some(token)
    }
}

impl fmt::Display for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyToken::Char(' ') => f.write_str("<space>"),
            KeyToken::Char('<') => f.write_str("<lt>"),
            KeyToken::Char(c) => write!(f, "{c}"),
            KeyToken::Ctrl(c) => write!(f, "<ctrl+{c}>"),
            KeyToken::Up => f.write_str("<up>"),
            KeyToken::Down => f.write_str("<down>"),
            KeyToken::Left => f.write_str("<left>"),
            KeyToken::Right => f.write_str("<right>"),
            KeyToken::Enter => f.write_str("<enter>"),
            KeyToken::Esc => f.write_str("<esc>"),
            KeyToken::Tab => f.write_str("<tab>"),
            KeyToken::Backspace => f.write_str("<backspace>"),
            KeyToken::PageUp => f.write_str("<pageup>"),
            KeyToken::PageDown => f.write_str("<pagedown>"),
            KeyToken::Home => f.write_str("<home>"),
            KeyToken::End => f.write_str("<end>"),
        }
    }
}

/// Parses vim-style notation: plain characters, `<name>` and `<ctrl+x>`.
pub fn parse_sequence(notation: &str) -> Result<Vec<KeyToken>> {
    let mut tokens = Vec::new();
    let mut rest = notation;
    while let Some(c) = rest.chars().next() {
        if c == '<' {
            let end = rest
                .find('>')
                .ok_or_else(|| Error::KeyNotation(format!("unclosed '<' in {notation:?}")))?;
            let name = rest[1..end].to_ascii_lowercase();
            let token = KeyToken::from_name(&name)
                .ok_or_else(|| Error::KeyNotation(format!("unknown key <{name}>")))?;
            tokens.push(token);
            rest = &rest[end + 1..];
        } else {
            tokens.push(KeyToken::Char(c));
            rest = &rest[c.len_utf8()..];
        }
    }
    if tokens.is_empty() {
        return Err(Error::KeyNotation("empty key sequence".into()));
    }
    Ok(tokens)
}

pub fn format_sequence(tokens: &[KeyToken]) -> String {
    tokens.iter().map(ToString::to_string).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    MoveDown,
    MoveUp,
    PageDown,
    PageUp,
    GotoTop,
    GotoBottom,
    ToggleFile,
    ToggleAll,
    ToggleDirectory,
    ExpandAll,
    Undo,
    Redo,
    Yank,
    ToggleHelp,
    CloseHelp,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandGroup {
    Navigation,
    Selection,
    Actions,
}

impl Command {
    pub fn description(self) -> &'static str {
        match self {
            Command::MoveDown => "Down",
            Command::MoveUp => "Up",
            Command::PageDown => "Page down",
            Command::PageUp => "Page up",
            Command::GotoTop => "Go to top",
            Command::GotoBottom => "Go to bottom",
            Command::ToggleFile => "Toggle selection",
            Command::ToggleAll => "Toggle all visible",
            Command::ToggleDirectory => "Open/close dir",
            Command::ExpandAll => "Expand/collapse all",
            Command::Undo => "Undo",
            Command::Redo => "Redo",
            Command::Yank => "Copy to clipboard",
            Command::ToggleHelp => "Toggle help",
            Command::CloseHelp => "Close help",
            Command::Quit => "Quit",
        }
    }

    pub fn group(self) -> CommandGroup {
        match self {
            Command::MoveDown
            | Command::MoveUp
            | Command::PageDown
            | Command::PageUp
            | Command::GotoTop
            | Command::GotoBottom => CommandGroup::Navigation,
            Command::ToggleFile
            | Command::ToggleAll
            | Command::ToggleDirectory
            | Command::ExpandAll
            | Command::Undo
            | Command::Redo => CommandGroup::Selection,
            Command::Yank | Command::ToggleHelp | Command::CloseHelp | Command::Quit => {
                CommandGroup::Actions
            }
        }
    }
}

pub const DEFAULT_BINDINGS: &[(&str, Command)] = &[
    ("j", Command::MoveDown),
    ("<down>", Command::MoveDown),
    ("k", Command::MoveUp),
    ("<up>", Command::MoveUp),
    ("<ctrl+d>", Command::PageDown),
    ("<pagedown>", Command::PageDown),
    ("<ctrl+u>", Command::PageUp),
    ("<pageup>", Command::PageUp),
    ("gg", Command::GotoTop),
    ("G", Command::GotoBottom),
    ("<space>", Command::ToggleFile),
    ("s", Command::ToggleFile),
    ("a", Command::ToggleAll),
    ("<enter>", Command::ToggleDirectory),
    ("T", Command::ExpandAll),
    ("u", Command::Undo),
    ("<ctrl+r>", Command::Redo),
    ("y", Command::Yank),
    ("?", Command::ToggleHelp),
    ("<esc>", Command::CloseHelp),
    ("q", Command::Quit),
    ("ZZ", Command::Quit),
    ("<ctrl+c>", Command::Quit),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub keys: Vec<KeyToken>,
    pub command: Command,
}

impl Binding {
    pub fn parse(notation: &str, command: Command) -> Result<Self> {
        Ok(Binding {
            keys: parse_sequence(notation)?,
            command,
        })
    }
}

pub fn default_bindings() -> Result<Vec<Binding>> {
    DEFAULT_BINDINGS
        .iter()
        .map(|&(notation, command)| Binding::parse(notation, command))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Dispatch(Command),
    Pending,
    Discarded,
}

#[derive(Debug)]
pub struct KeyResolver {
    bindings: Vec<Binding>,
    pending: Vec<KeyToken>,
}

impl KeyResolver {
    pub fn new(bindings: Vec<Binding>) -> Self {
        for binding in shadowed(&bindings) {
            warn!(
                keys = %format_sequence(&binding.keys),
                command = ?binding.command,
                "Binding can never fire: a shorter binding is its prefix"
            );
        }
        KeyResolver {
            bindings,
            pending: Vec::new(),
        }
    }

    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(default_bindings()?))
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn pending(&self) -> &[KeyToken] {
        &self.pending
    }

    pub fn feed(&mut self, token: KeyToken) -> Resolution {
        self.pending.push(token);

        let mut candidates = self
            .bindings
            .iter()
            .filter(|binding| binding.keys.starts_with(&self.pending))
            .peekable();
        if candidates.peek().is_none() {
            debug!(keys = %format_sequence(&self.pending), "No binding, discarding");
            self.pending.clear();
            return Resolution::Discarded;
        }

        let exact = candidates
            .find(|binding| binding.keys == self.pending)
            .map(|binding| binding.command);
        match exact {
            Some(command) => {
                self.pending.clear();
                Resolution::Dispatch(command)
            }
            None => Resolution::Pending,
        }
    }
}

/// Bindings whose sequence extends a shorter complete binding.
pub fn shadowed(bindings: &[Binding]) -> Vec<&Binding> {
    bindings
        .iter()
        .filter(|long| {
            bindings.iter().any(|short| {
                short.keys.len() < long.keys.len() && long.keys.starts_with(&short.keys)
            })
        })
        .collect()
}

use crate::tree::{Node, SelectionState};
use ratatui::style::{Color, Modifier, Style};

/// Every style the renderer uses. Passed in explicitly; there is no global
/// theme state.
#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub tokens: Style,
    pub tokens_warning: Style,
    pub key: Style,
    pub description: Style,
    pub pending: Style,
    pub status: Style,
    pub text: Style,
    pub selected: Style,
    pub partial: Style,
    pub muted: Style,
    pub cursor: Style,
    pub border: Style,
}

impl Default for Theme {
    fn default() -> Self {
        let light = Color::Rgb(0xFA, 0xFA, 0xFA);
        let grey = Color::Rgb(0x90, 0x90, 0x90);
        Theme {
            header: Style::default()
                .fg(light)
                .bg(Color::Rgb(0x7D, 0x56, 0xF4))
                .add_modifier(Modifier::BOLD),
            tokens: Style::default().fg(light).bg(Color::Rgb(0x5A, 0x5A, 0x5A)),
            tokens_warning: Style::default().fg(light).bg(Color::Rgb(0xE0, 0x3A, 0x3E)),
            key: Style::default().fg(light).bg(Color::Rgb(0x3C, 0x3C, 0x3C)),
            description: Style::default().fg(Color::Rgb(0xA0, 0xA0, 0xA0)),
            pending: Style::default()
                .fg(Color::Rgb(0xFF, 0xA0, 0x00))
                .add_modifier(Modifier::BOLD),
            status: Style::default().fg(Color::Rgb(0xB8, 0xBB, 0x26)),
            text: Style::default().fg(light),
            selected: Style::default()
                .fg(Color::Rgb(0xB8, 0xBB, 0x26))
                .add_modifier(Modifier::BOLD),
            partial: Style::default().fg(Color::Rgb(0xFF, 0xA0, 0x00)),
            muted: Style::default().fg(grey),
            cursor: Style::default()
                .bg(Color::Rgb(0x44, 0x44, 0x44))
                .add_modifier(Modifier::BOLD),
            border: Style::default().fg(Color::Rgb(0x62, 0x62, 0x62)),
        }
    }
}

impl Theme {
    pub fn node_style(&self, node: &Node) -> Style {
        if !node.is_selectable() {
            return self.muted;
        }
        match node.state {
            SelectionState::Selected => self.selected,
            SelectionState::PartiallySelected => self.partial,
            SelectionState::Unselected => self.text,
        }
    }
}

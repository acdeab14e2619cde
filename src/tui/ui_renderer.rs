use super::labels::guide_prefix;
use super::theme::Theme;
use crate::controller::SelectionController;
use crate::keymap::{Command, CommandGroup, KeyResolver, format_sequence};
use crate::tree::{FileTree, NodeId, SelectionState};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

const FOOTER_HINTS: &[Command] = &[
    Command::ToggleFile,
    Command::ToggleDirectory,
    Command::Yank,
    Command::Undo,
    Command::ToggleHelp,
    Command::Quit,
];

const HELP_GROUPS: &[(CommandGroup, &str)] = &[
    (CommandGroup::Navigation, "Navigation"),
    (CommandGroup::Selection, "Selection"),
    (CommandGroup::Actions, "Actions"),
];

/// Key notations per command in `group`, in binding order, with alternative
/// keys merged: `("j/<down>", "Down")`.
pub(super) fn help_entries(
    resolver: &KeyResolver,
    group: CommandGroup,
) -> Vec<(String, &'static str)> {
    let mut entries: Vec<(Command, Vec<String>)> = Vec::new();
    for binding in resolver
        .bindings()
        .iter()
        .filter(|binding| binding.command.group() == group)
    {
        let keys = format_sequence(&binding.keys);
        match entries.iter_mut().find(|(command, _)| *command == binding.command) {
            Some((_, all_keys)) => all_keys.push(keys),
            None => entries.push((binding.command, vec![keys])),
        }
    }
    entries
        .into_iter()
        .map(|(command, keys)| (keys.join("/"), command.description()))
        .collect()
}

fn first_key(resolver: &KeyResolver, command: Command) -> Option<String> {
    resolver
        .bindings()
        .iter()
        .find(|binding| binding.command == command)
        .map(|binding| format_sequence(&binding.keys))
}

fn row_line(tree: &FileTree, id: NodeId, theme: &Theme) -> Line<'static> {
    let node = tree.node(id);
    let mark = match (node.is_selectable(), node.state) {
        (false, _) => "    ",
        (true, SelectionState::Selected) => "[x] ",
        (true, SelectionState::PartiallySelected) => "[-] ",
        (true, SelectionState::Unselected) => "[ ] ",
    };
    let icon = if !node.is_dir() || node.is_empty_dir() {
        "  "
    } else if node.expanded {
        "▼ "
    } else {
        "▶ "
    };
    let mut name = node.name.clone();
    if node.is_dir() {
        name.push('/');
    }
    let mut spans = vec![
        Span::styled(format!("{mark}{}{icon}", guide_prefix(tree, id)), theme.muted),
        Span::styled(name, theme.node_style(node)),
    ];
    if node.is_binary {
        spans.push(Span::styled(" (bin)", theme.muted));
    }
    Line::from(spans)
}

fn draw_header(
    f: &mut Frame,
    controller: &SelectionController,
    theme: &Theme,
    token_warning: u64,
    area: Rect,
) {
    let tokens = controller.selected_tokens();
    let title = format!(" punjado · {} ", controller.tree().root_path().display());
    let count = format!(" ≈ {tokens} tokens ");
    let count_style = if tokens > token_warning {
        theme.tokens_warning
    } else {
        theme.tokens
    };
    let used = title.chars().count() + count.chars().count();
    let spacer = " ".repeat((area.width as usize).saturating_sub(used));
    let line = Line::from(vec![
        Span::styled(title, theme.header),
        Span::raw(spacer),
        Span::styled(count, count_style),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn draw_tree(f: &mut Frame, controller: &mut SelectionController, theme: &Theme, area: Rect) {
    controller.set_viewport_height(area.height.saturating_sub(2) as usize);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border)
        .title(format!(" {} ", controller.tree().node(controller.tree().root()).name));

    let visible = controller.visible();
    if visible.is_empty() {
        let empty = Paragraph::new(Line::styled("(no files)", theme.muted)).block(block);
        f.render_widget(empty, area);
        return;
    }

    let height = area.height.saturating_sub(2) as usize;
    let end = (controller.scroll_offset() + height).min(visible.len());
    let start = controller.scroll_offset().min(end);
    let items: Vec<ListItem> = visible[start..end]
        .iter()
        .map(|&id| ListItem::new(row_line(controller.tree(), id, theme)))
        .collect();

    let mut state = ListState::default();
    let cursor = controller.cursor();
    if cursor >= start && cursor < end {
        state.select(Some(cursor - start));
    }
    let list = List::new(items)
        .block(block)
        .highlight_style(theme.cursor)
        .highlight_symbol("❯ ");
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_footer(f: &mut Frame, controller: &SelectionController, theme: &Theme, area: Rect) {
    let resolver = controller.resolver();
    let mut spans = Vec::new();
    if !resolver.pending().is_empty() {
        spans.push(Span::styled(
            format!(" {}… ", format_sequence(resolver.pending())),
            theme.pending,
        ));
    }
    if let Some(status) = controller.status() {
        spans.push(Span::styled(format!(" {status} "), theme.status));
    } else {
        for &command in FOOTER_HINTS {
            if let Some(key) = first_key(resolver, command) {
                spans.push(Span::styled(format!(" {key} "), theme.key));
                spans.push(Span::styled(
                    format!(" {} ", command.description()),
                    theme.description,
                ));
            }
        }
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn help_height(resolver: &KeyResolver) -> u16 {
    let rows = HELP_GROUPS
        .iter()
        .map(|&(group, _)| help_entries(resolver, group).len())
        .max()
        .unwrap_or(0);
    // title row plus borders
    rows as u16 + 3
}

fn draw_help(f: &mut Frame, controller: &SelectionController, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border)
        .title(" Help ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(HELP_GROUPS.iter().map(|_| Constraint::Ratio(1, HELP_GROUPS.len() as u32)))
        .split(inner);

    for (&(group, title), &column) in HELP_GROUPS.iter().zip(columns.iter()) {
        let mut lines = vec![Line::styled(title, theme.header)];
        for (keys, description) in help_entries(controller.resolver(), group) {
            lines.push(Line::from(vec![
                Span::styled(format!(" {keys} "), theme.key),
                Span::styled(format!(" {description}"), theme.description),
            ]));
        }
        f.render_widget(Paragraph::new(lines), column);
    }
}

pub(super) fn ui_frame(
    frame: &mut Frame,
    controller: &mut SelectionController,
    theme: &Theme,
    token_warning: u64,
) {
    let bottom_height = if controller.help_visible() {
        help_height(controller.resolver())
    } else {
        1
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(bottom_height),
        ])
        .split(frame.area());

    draw_header(frame, controller, theme, token_warning, chunks[0]);
    draw_tree(frame, controller, theme, chunks[1]);
    if controller.help_visible() {
        draw_help(frame, controller, theme, chunks[2]);
    } else {
        draw_footer(frame, controller, theme, chunks[2]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::KeyToken;
    use crate::persistence::tests::MemoryStore;
    use crate::tree::tests::sample_tree;
    use ratatui::backend::TestBackend;

    fn controller() -> SelectionController {
        SelectionController::new(
            sample_tree(),
            KeyResolver::with_defaults().unwrap(),
            Box::new(MemoryStore::default()),
            100,
        )
    }

    fn render(controller: &mut SelectionController, token_warning: u64) -> Terminal<TestBackend> {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        let theme = Theme::default();
        terminal
            .draw(|frame| ui_frame(frame, controller, &theme, token_warning))
            .unwrap();
        terminal
    }

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_rows_show_guides_markers_and_binary_tag() {
        let mut controller = controller();
        let terminal = render(&mut controller, 32_000);
        let text = screen(&terminal);
        assert!(text.contains("├─ ▼ dirA/"), "{text}");
        assert!(text.contains("│  └─   f2.bin (bin)"), "{text}");
        assert!(text.contains("[ ] └─   f3.txt"), "{text}");
        assert!(text.contains("≈ 0 tokens"), "{text}");
    }

    #[test]
    fn test_header_switches_to_warning_style() {
        let mut controller = controller();
        // cursor on dirA selects f1.txt (40 bytes, 10 tokens)
        controller.handle_key(KeyToken::Char(' '));
        let theme = Theme::default();

        let terminal = render(&mut controller, 5);
        let text = screen(&terminal);
        assert!(text.contains("≈ 10 tokens"), "{text}");
        let buffer = terminal.backend().buffer();
        let last = buffer[(buffer.area.width - 1, 0)].style();
        assert_eq!(last.bg, theme.tokens_warning.bg);

        let terminal = render(&mut controller, 32_000);
        let buffer = terminal.backend().buffer();
        let last = buffer[(buffer.area.width - 1, 0)].style();
        assert_eq!(last.bg, theme.tokens.bg);
    }

    #[test]
    fn test_footer_shows_pending_chord_and_status() {
        let mut controller = controller();
        controller.handle_key(KeyToken::Char('g'));
        let text = screen(&render(&mut controller, 32_000));
        assert!(text.contains("g…"), "{text}");

        controller.handle_key(KeyToken::Char('g'));
        controller.set_status("Copied 1 files");
        let text = screen(&render(&mut controller, 32_000));
        assert!(text.contains("Copied 1 files"), "{text}");
        assert!(!text.contains("g…"), "{text}");
    }

    #[test]
    fn test_help_panel_groups_commands() {
        let mut controller = controller();
        controller.handle_key(KeyToken::Char('?'));
        let text = screen(&render(&mut controller, 32_000));
        assert!(text.contains("Navigation"), "{text}");
        assert!(text.contains("j/<down>"), "{text}");
        assert!(text.contains("q/ZZ/<ctrl+c>"), "{text}");
    }

    #[test]
    fn test_help_entries_merge_alternative_keys() {
        let resolver = KeyResolver::with_defaults().unwrap();
        let selection = help_entries(&resolver, CommandGroup::Selection);
        assert_eq!(selection[0], ("<space>/s".to_string(), "Toggle selection"));
        assert!(selection.iter().any(|(keys, _)| keys == "<ctrl+r>"));
    }
}

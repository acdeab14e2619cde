use crate::export::approx_tokens;
use crate::flatten::flatten;
use crate::history::{History, SelectionAction};
use crate::keymap::{Command, KeyResolver, KeyToken, Resolution};
use crate::persistence::{SelectionStore, selected_paths};
use crate::tree::{FileTree, NodeId, SelectionState};
use tracing::{debug, warn};

/// What the event loop has to do after a key, beyond redrawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    Yank,
    Quit,
}

/// Owns the whole interactive session state. Every key goes through
/// [`SelectionController::handle_key`].
pub struct SelectionController {
    tree: FileTree,
    history: History<SelectionAction>,
    resolver: KeyResolver,
    store: Box<dyn SelectionStore>,
    visible: Vec<NodeId>,
    cursor: usize,
    scroll_offset: usize,
    viewport_height: usize,
    help_visible: bool,
    status: Option<String>,
}

impl SelectionController {
    pub fn new(
        tree: FileTree,
        resolver: KeyResolver,
        store: Box<dyn SelectionStore>,
        history_limit: usize,
    ) -> Self {
        let visible = flatten(&tree);
        SelectionController {
            tree,
            history: History::new(history_limit),
            resolver,
            store,
            visible,
            cursor: 0,
            scroll_offset: 0,
            viewport_height: 0,
            help_visible: false,
            status: None,
        }
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn visible(&self) -> &[NodeId] {
        &self.visible
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<NodeId> {
        self.visible.get(self.cursor).copied()
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn resolver(&self) -> &KeyResolver {
        &self.resolver
    }

    pub fn history(&self) -> &History<SelectionAction> {
        &self.history
    }

    pub fn help_visible(&self) -> bool {
        self.help_visible
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub fn selected_tokens(&self) -> u64 {
        approx_tokens(self.tree.selected_size())
    }

    /// Called by the renderer with the number of list rows it can show.
    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = height;
        self.keep_cursor_in_viewport();
    }

    pub fn handle_key(&mut self, token: KeyToken) -> Effect {
        match self.resolver.feed(token) {
            Resolution::Dispatch(command) => {
                debug!(?command, "Running command");
                self.execute(command)
            }
            Resolution::Pending | Resolution::Discarded => Effect::None,
        }
    }

    pub fn execute(&mut self, command: Command) -> Effect {
        self.status = None;
        let last = self.visible.len().saturating_sub(1);
        let page = self.viewport_height.max(1);
        match command {
            Command::MoveDown => self.cursor = (self.cursor + 1).min(last),
            Command::MoveUp => self.cursor = self.cursor.saturating_sub(1),
            Command::PageDown => self.cursor = (self.cursor + page).min(last),
            Command::PageUp => self.cursor = self.cursor.saturating_sub(page),
            Command::GotoTop => self.cursor = 0,
            Command::GotoBottom => self.cursor = last,
            Command::ToggleFile => self.toggle_current(),
            Command::ToggleAll => self.toggle_all_visible(),
            Command::ToggleDirectory => {
                if let Some(id) = self.current() {
                    self.tree.toggle_expand(id);
                    self.refresh();
                }
            }
            Command::ExpandAll => self.toggle_expand_visible(),
            Command::Undo => {
                if self.history.undo(&mut self.tree) {
                    self.persist();
                }
            }
            Command::Redo => {
                if self.history.redo(&mut self.tree) {
                    self.persist();
                }
            }
            Command::ToggleHelp => self.help_visible = !self.help_visible,
            Command::CloseHelp => self.help_visible = false,
            Command::Yank => return Effect::Yank,
            Command::Quit => return Effect::Quit,
        }
        self.keep_cursor_in_viewport();
        Effect::None
    }

    fn toggle_current(&mut self) {
        let Some(id) = self.current() else {
            return;
        };
        let node = self.tree.node(id);
        if !node.is_selectable() {
            return;
        }
        let target = node.state != SelectionState::Selected;
        let action = SelectionAction::set_selection(&self.tree, id, target);
        self.history.commit(action, &mut self.tree);
        self.persist();
    }

    /// Deselects every visible eligible node if they are all selected,
    /// otherwise selects them all. Recorded as one action.
    fn toggle_all_visible(&mut self) {
        let eligible: Vec<NodeId> = self
            .visible
            .iter()
            .copied()
            .filter(|&id| self.tree.node(id).is_selectable())
            .collect();
        if eligible.is_empty() {
            return;
        }
        let all_selected = eligible
            .iter()
            .all(|&id| self.tree.node(id).state == SelectionState::Selected);
        let action = SelectionAction::bulk(&self.tree, eligible, !all_selected);
        self.history.commit(action, &mut self.tree);
        self.persist();
    }

    /// Collapses every visible directory if all are expanded, otherwise
    /// expands them. Not recorded in history.
    fn toggle_expand_visible(&mut self) {
        let dirs: Vec<NodeId> = self
            .visible
            .iter()
            .copied()
            .filter(|&id| self.tree.node(id).is_dir())
            .collect();
        let all_expanded = dirs.iter().all(|&id| self.tree.node(id).expanded);
        for id in dirs {
            self.tree.set_expanded(id, !all_expanded);
        }
        self.refresh();
    }

    fn refresh(&mut self) {
        self.visible = flatten(&self.tree);
        self.cursor = self.cursor.min(self.visible.len().saturating_sub(1));
    }

    fn keep_cursor_in_viewport(&mut self) {
        if self.viewport_height == 0 {
            return;
        }
        if self.cursor < self.scroll_offset {
            self.scroll_offset = self.cursor;
        } else if self.cursor >= self.scroll_offset + self.viewport_height {
            self.scroll_offset = self.cursor + 1 - self.viewport_height;
        }
        let max_offset = self.visible.len().saturating_sub(self.viewport_height);
        self.scroll_offset = self.scroll_offset.min(max_offset);
    }

    /// Write failures are logged and otherwise ignored.
    pub fn persist(&self) {
        if let Err(e) = self.store.save(&selected_paths(&self.tree)) {
            warn!(error = %e, "Failed to save selection");
        }
    }

    pub fn into_tree(self) -> FileTree {
        self.tree
    }
}

//! Conversation sidebar: the user's stored conversations plus a slot for
//! starting a fresh one.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Widget},
};

use crate::theme::Theme;

/// What a sidebar row points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarEntry {
    /// The "start a new conversation" row, always first.
    NewConversation,
    /// A stored conversation id.
    Conversation(String),
}

/// Selection state for the sidebar list.
#[derive(Debug, Clone, Default)]
pub struct SidebarState {
    conversations: Vec<String>,
    selected: usize,
    loading: bool,
}

impl SidebarState {
    pub fn new() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    pub fn set_conversations(&mut self, conversations: Vec<String>) {
        self.conversations = conversations;
        self.loading = false;
        self.selected = self.selected.min(self.len().saturating_sub(1));
    }

    pub fn set_loading(&mut self) {
        self.loading = true;
    }

    /// A refresh failed; stop the spinner but keep the last known list.
    pub fn finish_loading(&mut self) {
        self.loading = false;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Number of rows, the new-conversation slot included.
    pub fn len(&self) -> usize {
        self.conversations.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected(&self) -> SidebarEntry {
        if self.selected == 0 {
            SidebarEntry::NewConversation
        } else {
            SidebarEntry::Conversation(self.conversations[self.selected - 1].clone())
        }
    }

    /// Move the selection onto a conversation id, if it is listed.
    pub fn select_id(&mut self, id: &str) {
        if let Some(pos) = self.conversations.iter().position(|c| c == id) {
            self.selected = pos + 1;
        }
    }
}

/// The sidebar widget.
pub struct Sidebar<'a> {
    state: &'a SidebarState,
    theme: &'a Theme,
    /// Id of the conversation currently open in the transcript.
    active: Option<&'a str>,
    focused: bool,
}

impl<'a> Sidebar<'a> {
    pub fn new(state: &'a SidebarState, theme: &'a Theme) -> Self {
        Self {
            state,
            theme,
            active: None,
            focused: false,
        }
    }

    pub fn active(mut self, active: Option<&'a str>) -> Self {
        self.active = active;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl Widget for Sidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(self.theme.border_focused)
        } else {
            Style::default().fg(self.theme.border)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Conversations ");

        let mut items: Vec<ListItem> = Vec::with_capacity(self.state.len() + 1);

        let new_style = if self.state.selected == 0 && self.focused {
            Style::default()
                .fg(self.theme.primary)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.theme.primary)
        };
        let new_marker = if self.state.selected == 0 { "▸ " } else { "  " };
        items.push(ListItem::new(Line::from(Span::styled(
            format!("{new_marker}+ New conversation"),
            new_style,
        ))));

        if self.state.loading {
            items.push(ListItem::new(Line::from(Span::styled(
                "  loading…",
                Style::default().fg(self.theme.muted),
            ))));
        }

        for (i, id) in self.state.conversations.iter().enumerate() {
            let row = i + 1;
            let selected = row == self.state.selected;
            let active = self.active == Some(id.as_str());
            let marker = if selected { "▸ " } else { "  " };
            let mut style = if active {
                Style::default()
                    .fg(self.theme.text)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.muted)
            };
            if selected && self.focused {
                style = style.fg(self.theme.primary);
            }
            items.push(ListItem::new(Line::from(Span::styled(
                format!("{marker}{id}"),
                style,
            ))));
        }

        List::new(items).block(block).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_new_conversation_row_is_default_selection() {
        let state = SidebarState::new();
        assert_eq!(state.selected(), SidebarEntry::NewConversation);
    }

    #[test]
    fn test_selection_stays_in_bounds() {
        let mut state = SidebarState::new();
        state.set_conversations(vec!["conv-1".into(), "conv-2".into()]);

        state.select_prev();
        assert_eq!(state.selected(), SidebarEntry::NewConversation);

        state.select_next();
        state.select_next();
        state.select_next();
        assert_eq!(
            state.selected(),
            SidebarEntry::Conversation("conv-2".into())
        );
    }

    #[test]
    fn test_selection_clamped_when_list_shrinks() {
        let mut state = SidebarState::new();
        state.set_conversations(vec!["conv-1".into(), "conv-2".into(), "conv-3".into()]);
        state.select_next();
        state.select_next();
        state.select_next();
        state.set_conversations(vec!["conv-1".into()]);
        assert_eq!(
            state.selected(),
            SidebarEntry::Conversation("conv-1".into())
        );
    }

    #[test]
    fn test_select_id_moves_selection() {
        let mut state = SidebarState::new();
        state.set_conversations(vec!["conv-1".into(), "conv-2".into()]);
        state.select_id("conv-2");
        assert_eq!(
            state.selected(),
            SidebarEntry::Conversation("conv-2".into())
        );
    }

    #[test]
    fn test_render_lists_conversations() {
        let mut state = SidebarState::new();
        state.set_conversations(vec!["conv-1".into()]);
        let theme = Theme::default();
        let backend = TestBackend::new(30, 8);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| {
                frame.render_widget(
                    Sidebar::new(&state, &theme).active(Some("conv-1")),
                    frame.area(),
                );
            })
            .unwrap();
        let rendered = format!("{:?}", terminal.backend().buffer());
        assert!(rendered.contains("New conversation"));
        assert!(rendered.contains("conv-1"));
    }
}

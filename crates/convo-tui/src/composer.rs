//! Message composer: input state and widget.

use convo_client::MAX_MESSAGE_LEN;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::theme::Theme;

/// Smallest composer height in rows, borders included.
pub const MIN_COMPOSER_HEIGHT: u16 = 3;
/// Largest composer height in rows, borders included.
pub const MAX_COMPOSER_HEIGHT: u16 = 8;

/// Character count above which the remaining-budget counter is shown.
const NEAR_LIMIT_THRESHOLD: usize = MAX_MESSAGE_LEN * 4 / 5;

/// What a key press did to the composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The composer produced a finished message to send.
    Submitted(String),
    /// The key edited or was swallowed by the composer.
    Consumed,
    /// The key is not a composer key; let the app act on it.
    Ignored,
}

/// Editable state behind the composer widget.
///
/// The cursor is a character index into `content`. Every edit is applied
/// wholesale: if the result would exceed [`MAX_MESSAGE_LEN`] characters the
/// edit is rejected and the content is left untouched.
#[derive(Debug, Clone, Default)]
pub struct ComposerState {
    content: String,
    cursor: usize,
    composing: bool,
}

impl ComposerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Current length in characters, not bytes.
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_composing(&self) -> bool {
        self.composing
    }

    /// An input method has opened a composition session. Submission is held
    /// back until [`Self::composition_ended`] so that Enter confirms the
    /// candidate instead of sending the message.
    pub fn composition_started(&mut self) {
        self.composing = true;
    }

    pub fn composition_ended(&mut self) {
        self.composing = false;
    }

    /// Byte offset of the character at `cursor`.
    fn byte_index(&self) -> usize {
        self.content
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    /// Insert a single character at the cursor. Returns false if the limit
    /// would be exceeded.
    pub fn insert_char(&mut self, ch: char) -> bool {
        if self.char_count() + 1 > MAX_MESSAGE_LEN {
            return false;
        }
        let at = self.byte_index();
        self.content.insert(at, ch);
        self.cursor += 1;
        true
    }

    /// Insert a string at the cursor (paste). The whole edit is rejected if
    /// it would push the content past the limit; nothing is truncated.
    pub fn insert_str(&mut self, s: &str) -> bool {
        let added = s.chars().count();
        if self.char_count() + added > MAX_MESSAGE_LEN {
            return false;
        }
        let at = self.byte_index();
        self.content.insert_str(at, s);
        self.cursor += added;
        true
    }

    pub fn insert_newline(&mut self) -> bool {
        self.insert_char('\n')
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index();
        self.content.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.char_count() {
            let at = self.byte_index();
            self.content.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.char_count() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_count();
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    /// `(count, max)` once the content passes 80% of the limit.
    pub fn near_limit(&self) -> Option<(usize, usize)> {
        let count = self.char_count();
        (count > NEAR_LIMIT_THRESHOLD).then_some((count, MAX_MESSAGE_LEN))
    }

    /// Take the trimmed content out of the composer if it is submittable.
    ///
    /// Returns `None` while the composer is disabled, while an IME
    /// composition is open, or when the content is only whitespace. The
    /// draft is kept intact in all of those cases.
    pub fn take_submission(&mut self, disabled: bool) -> Option<String> {
        if disabled || self.composing {
            return None;
        }
        let trimmed = self.content.trim();
        if trimmed.is_empty() {
            return None;
        }
        let message = trimmed.to_string();
        self.clear();
        Some(message)
    }

    /// Route a key press. While `disabled` is set every edit is rejected,
    /// matching a greyed-out input field.
    pub fn handle_key(&mut self, key: KeyEvent, disabled: bool) -> KeyOutcome {
        if disabled {
            return KeyOutcome::Ignored;
        }
        match key.code {
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.insert_newline();
                KeyOutcome::Consumed
            }
            KeyCode::Enter => match self.take_submission(disabled) {
                Some(message) => KeyOutcome::Submitted(message),
                None => KeyOutcome::Consumed,
            },
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.insert_char(ch);
                KeyOutcome::Consumed
            }
            KeyCode::Backspace => {
                self.backspace();
                KeyOutcome::Consumed
            }
            KeyCode::Delete => {
                self.delete();
                KeyOutcome::Consumed
            }
            KeyCode::Left => {
                self.move_left();
                KeyOutcome::Consumed
            }
            KeyCode::Right => {
                self.move_right();
                KeyOutcome::Consumed
            }
            KeyCode::Home => {
                self.move_home();
                KeyOutcome::Consumed
            }
            KeyCode::End => {
                self.move_end();
                KeyOutcome::Consumed
            }
            _ => KeyOutcome::Ignored,
        }
    }

    /// Widget height (borders included) for the current draft, grown one row
    /// per line and clamped to the min/max band.
    pub fn desired_height(&self) -> u16 {
        let lines = self.content.split('\n').count().max(1) as u16;
        (lines + 2).clamp(MIN_COMPOSER_HEIGHT, MAX_COMPOSER_HEIGHT)
    }
}

/// The composer input widget.
pub struct Composer<'a> {
    state: &'a ComposerState,
    theme: &'a Theme,
    /// True while a send is in flight and the field is greyed out.
    waiting: bool,
    focused: bool,
}

impl<'a> Composer<'a> {
    pub fn new(state: &'a ComposerState, theme: &'a Theme) -> Self {
        Self {
            state,
            theme,
            waiting: false,
            focused: true,
        }
    }

    pub fn waiting(mut self, waiting: bool) -> Self {
        self.waiting = waiting;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl Widget for Composer<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused && !self.waiting {
            Style::default().fg(self.theme.border_focused)
        } else {
            Style::default().fg(self.theme.border)
        };

        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style);

        if let Some((count, max)) = self.state.near_limit() {
            block = block.title_bottom(
                Line::from(Span::styled(
                    format!(" {count}/{max} "),
                    Style::default().fg(self.theme.pending),
                ))
                .right_aligned(),
            );
        }

        let text = if self.waiting {
            Line::from(Span::styled(
                "Waiting for reply...",
                Style::default()
                    .fg(self.theme.muted)
                    .add_modifier(Modifier::ITALIC),
            ))
        } else if self.state.is_empty() {
            Line::from(vec![
                Span::styled("> ", Style::default().fg(self.theme.primary)),
                Span::styled(
                    "Type a message (Enter to send, Shift+Enter for newline)",
                    Style::default().fg(self.theme.muted),
                ),
            ])
        } else {
            Line::from(vec![
                Span::styled("> ", Style::default().fg(self.theme.primary)),
                Span::styled(
                    self.state.content().to_string(),
                    Style::default().fg(self.theme.text),
                ),
            ])
        };

        Paragraph::new(text)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

//! Color theme for the TUI.

use ratatui::style::Color;

/// Colors used across the conversation surface.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Background.
    pub base: Color,
    /// Primary text.
    pub text: Color,
    /// Secondary/dimmed text (placeholders, timestamps, metadata).
    pub muted: Color,
    /// Accent (prompt, own messages).
    pub primary: Color,
    /// Unfocused borders.
    pub border: Color,
    /// Focused borders.
    pub border_focused: Color,
    /// Failure notices.
    pub error: Color,
    /// Pending (unacknowledged) entries.
    pub pending: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            base: Color::Reset,
            text: Color::White,
            muted: Color::DarkGray,
            primary: Color::Cyan,
            border: Color::DarkGray,
            border_focused: Color::Cyan,
            error: Color::Red,
            pending: Color::Yellow,
        }
    }
}

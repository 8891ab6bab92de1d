//! convo-tui: Terminal UI for the convo chat surface
//!
//! This crate provides the TUI layer for convo, including:
//! - The message composer with length limits and multiline editing
//! - The scrolling conversation transcript
//! - The conversation sidebar
//! - Key routing and the main event loop

pub mod app;
pub mod composer;
pub mod event;
pub mod sidebar;
pub mod theme;
pub mod transcript;

pub use app::{App, Focus};
pub use composer::{Composer, ComposerState, KeyOutcome};
pub use event::{Action, Event, EventHandler};
pub use sidebar::{Sidebar, SidebarEntry, SidebarState};
pub use theme::Theme;
pub use transcript::{workflow_line, Transcript, TranscriptState};

use std::io::{self, stdout};
use std::sync::Arc;

use convo_client::{ChatApi, SessionContext};
use crossterm::{
    cursor::Show as ShowCursor,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    Frame, Terminal,
};

/// RAII guard for terminal state restoration.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), LeaveAlternateScreen, ShowCursor);
    }
}

/// Run the TUI application.
///
/// This is the main entry point for the TUI. It sets up the terminal,
/// runs the event loop, and restores the terminal on exit.
pub async fn run_tui(
    api: Arc<dyn ChatApi>,
    session: SessionContext,
) -> Result<(), Box<dyn std::error::Error>> {
    // Setup terminal with RAII guard for cleanup
    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(api, session);

    // Create event handler (4 Hz tick rate = 250ms)
    let mut events = EventHandler::new(250);

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    // Restore cursor before guard drops
    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| draw(app, frame))?;

        match events.next().await {
            Some(Event::Key(key)) => app.handle_key(key),
            Some(Event::Tick) => app.tick(),
            Some(Event::Resize(_, _)) | Some(Event::Mouse(_)) => {}
            None => break,
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Layout: sidebar on the left, transcript over composer on the right. The
/// composer row grows with the draft within its clamp band.
fn draw(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let [sidebar_area, main_area] = split_columns(area);
    let [transcript_area, composer_area] =
        split_main(main_area, app.composer.desired_height());

    frame.render_widget(
        Sidebar::new(&app.sidebar, &app.theme)
            .active(app.active_conversation())
            .focused(app.focus == Focus::Sidebar),
        sidebar_area,
    );

    let title = match app.active_conversation() {
        Some(id) => format!(" {id} "),
        None => " New conversation ".to_string(),
    };
    frame.render_widget(
        Transcript::new(app.controller.messages(), &app.transcript, &app.theme).title(title),
        transcript_area,
    );

    frame.render_widget(
        Composer::new(&app.composer, &app.theme)
            .waiting(!app.controller.composer_enabled())
            .focused(app.focus == Focus::Composer),
        composer_area,
    );
}

fn split_columns(area: Rect) -> [Rect; 2] {
    Layout::horizontal([Constraint::Length(28), Constraint::Min(20)]).areas(area)
}

fn split_main(area: Rect, composer_height: u16) -> [Rect; 2] {
    Layout::vertical([Constraint::Min(3), Constraint::Length(composer_height)]).areas(area)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::layout::Rect;

    #[test]
    fn test_columns_reserve_sidebar_width() {
        let [sidebar, main] = split_columns(Rect::new(0, 0, 100, 30));
        assert_eq!(sidebar.width, 28);
        assert_eq!(main.width, 72);
    }

    #[test]
    fn test_composer_row_takes_requested_height() {
        let [transcript, composer] = split_main(Rect::new(0, 0, 72, 30), 5);
        assert_eq!(composer.height, 5);
        assert_eq!(transcript.height, 25);
    }
}

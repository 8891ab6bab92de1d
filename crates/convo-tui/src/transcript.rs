//! Conversation transcript: scroll state and widget.

use convo_client::{DeliveryStatus, Message, WorkflowStep};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::theme::Theme;

/// Scroll state for the transcript pane.
///
/// While `follow` is set the view pins itself to the newest entry; any
/// upward scroll detaches it until [`TranscriptState::follow_latest`].
#[derive(Debug, Clone)]
pub struct TranscriptState {
    scroll: usize,
    follow: bool,
}

impl Default for TranscriptState {
    fn default() -> Self {
        Self {
            scroll: 0,
            follow: true,
        }
    }
}

impl TranscriptState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_following(&self) -> bool {
        self.follow
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
        self.follow = false;
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1);
    }

    pub fn follow_latest(&mut self) {
        self.follow = true;
    }
}

/// One line summarizing the agent hops behind a reply, or `None` when no
/// workflow metadata was attached.
pub fn workflow_line(steps: &[WorkflowStep]) -> Option<String> {
    if steps.is_empty() {
        return None;
    }
    let parts: Vec<String> = steps
        .iter()
        .map(|step| match &step.decision {
            Some(decision) => format!("{} → {}", step.agent, decision),
            None => step.agent.clone(),
        })
        .collect();
    Some(parts.join(" · "))
}

/// The transcript widget.
pub struct Transcript<'a> {
    messages: &'a [Message],
    state: &'a TranscriptState,
    theme: &'a Theme,
    title: String,
}

impl<'a> Transcript<'a> {
    pub fn new(messages: &'a [Message], state: &'a TranscriptState, theme: &'a Theme) -> Self {
        Self {
            messages,
            state,
            theme,
            title: " Conversation ".to_string(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    fn message_lines(&self, message: &Message, width: usize) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        let (label, label_style) = if message.is_assistant() {
            (
                "Assistant",
                Style::default()
                    .fg(self.theme.text)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            (
                "You",
                Style::default()
                    .fg(self.theme.primary)
                    .add_modifier(Modifier::BOLD),
            )
        };
        let stamp = message.timestamp.format("%H:%M").to_string();

        let mut header = vec![
            Span::styled(label.to_string(), label_style),
            Span::styled(format!("  {stamp}"), Style::default().fg(self.theme.muted)),
        ];
        match message.status {
            DeliveryStatus::Pending => header.push(Span::styled(
                "  sending…",
                Style::default().fg(self.theme.pending),
            )),
            DeliveryStatus::Error => header.push(Span::styled(
                "  failed",
                Style::default().fg(self.theme.error),
            )),
            DeliveryStatus::Delivered => {}
        }
        lines.push(Line::from(header));

        let body_style = match message.status {
            DeliveryStatus::Error => Style::default().fg(self.theme.error),
            DeliveryStatus::Pending => Style::default().fg(self.theme.muted),
            DeliveryStatus::Delivered => Style::default().fg(self.theme.text),
        };
        for raw in message.text.split('\n') {
            if raw.is_empty() {
                lines.push(Line::from(String::new()));
                continue;
            }
            for wrapped in textwrap::wrap(raw, width.max(1)) {
                lines.push(Line::from(Span::styled(wrapped.into_owned(), body_style)));
            }
        }

        if let Some(summary) = workflow_line(&message.workflow) {
            lines.push(Line::from(Span::styled(
                format!("⚙ {summary}"),
                Style::default()
                    .fg(self.theme.muted)
                    .add_modifier(Modifier::ITALIC),
            )));
        }

        lines
    }

    fn build_lines(&self, width: usize) -> Vec<Line<'static>> {
        if self.messages.is_empty() {
            return vec![Line::from(Span::styled(
                "No messages yet. Say hello!",
                Style::default().fg(self.theme.muted),
            ))];
        }
        let mut lines = Vec::new();
        for (i, message) in self.messages.iter().enumerate() {
            if i > 0 {
                lines.push(Line::from(String::new()));
            }
            lines.extend(self.message_lines(message, width));
        }
        lines
    }
}

impl Widget for Transcript<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border))
            .title(self.title.clone());
        let inner = block.inner(area);

        let lines = self.build_lines(inner.width.saturating_sub(1) as usize);
        let viewport = inner.height as usize;
        let max_scroll = lines.len().saturating_sub(viewport);
        let offset = if self.state.follow {
            max_scroll
        } else {
            self.state.scroll.min(max_scroll)
        };

        Paragraph::new(lines)
            .block(block)
            .scroll((offset as u16, 0))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convo_client::ChatResponse;
    use ratatui::{backend::TestBackend, Terminal};

    fn render(messages: &[Message], width: u16, height: u16) -> String {
        let state = TranscriptState::new();
        let theme = Theme::default();
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| {
                frame.render_widget(Transcript::new(messages, &state, &theme), frame.area());
            })
            .unwrap();
        format!("{:?}", terminal.backend().buffer())
    }

    #[test]
    fn test_workflow_line_single_step() {
        let steps = vec![WorkflowStep {
            agent: "RouterAgent".into(),
            decision: Some("KnowledgeAgent".into()),
        }];
        assert_eq!(
            workflow_line(&steps).as_deref(),
            Some("RouterAgent → KnowledgeAgent")
        );
    }

    #[test]
    fn test_workflow_line_absent_for_empty_metadata() {
        assert_eq!(workflow_line(&[]), None);
    }

    #[test]
    fn test_workflow_line_step_without_decision() {
        let steps = vec![
            WorkflowStep {
                agent: "RouterAgent".into(),
                decision: Some("MathAgent".into()),
            },
            WorkflowStep {
                agent: "MathAgent".into(),
                decision: None,
            },
        ];
        assert_eq!(
            workflow_line(&steps).as_deref(),
            Some("RouterAgent → MathAgent · MathAgent")
        );
    }

    #[test]
    fn test_render_shows_pending_marker() {
        let messages = vec![Message::user_pending("hello there", "user-1", None)];
        let rendered = render(&messages, 60, 10);
        assert!(rendered.contains("hello there"));
        assert!(rendered.contains("sending"));
    }

    #[test]
    fn test_render_shows_failure_notice() {
        let messages = vec![Message::failure_notice(Some("conv-1".into()))];
        let rendered = render(&messages, 80, 10);
        assert!(rendered.contains("failed"));
        // The notice text wraps; check its lead-in survived.
        assert!(rendered.contains("Sorry, something went wrong"));
    }

    #[test]
    fn test_render_shows_workflow_summary() {
        let response = ChatResponse {
            response: "4".into(),
            source_agent_response: None,
            agent_workflow: vec![convo_client::AgentWorkflowStep {
                agent: "RouterAgent".into(),
                decision: Some("MathAgent".into()),
                execution_time: Some(0.2),
            }],
            conversation_id: "conv-1".into(),
            timestamp: chrono::Utc::now(),
        };
        let messages = vec![Message::from_response(&response)];
        let rendered = render(&messages, 60, 10);
        assert!(rendered.contains("RouterAgent → MathAgent"));
    }

    #[test]
    fn test_render_empty_timeline_placeholder() {
        let rendered = render(&[], 40, 6);
        assert!(rendered.contains("No messages yet"));
    }
}

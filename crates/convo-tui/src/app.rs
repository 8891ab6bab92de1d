//! Application state and key routing for the conversation surface.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use convo_client::{ChatApi, ConversationController, SessionContext};
use crossterm::event::KeyEvent;
use tokio::sync::mpsc;

use crate::composer::{ComposerState, KeyOutcome};
use crate::event::{key_to_action, Action};
use crate::sidebar::{SidebarEntry, SidebarState};
use crate::theme::Theme;
use crate::transcript::TranscriptState;

/// Which pane receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Composer,
}

/// Top-level application state.
pub struct App {
    pub controller: ConversationController,
    pub composer: ComposerState,
    pub transcript: TranscriptState,
    pub sidebar: SidebarState,
    pub theme: Theme,
    pub focus: Focus,
    pub should_quit: bool,
    api: Arc<dyn ChatApi>,
    /// Set by the timeline hook; consumed on tick to re-pin the transcript.
    follow_request: Arc<AtomicBool>,
    /// Conversation id the sidebar was last synced against.
    synced_conversation: Option<String>,
    sidebar_tx: mpsc::UnboundedSender<Option<Vec<String>>>,
    sidebar_rx: mpsc::UnboundedReceiver<Option<Vec<String>>>,
}

impl App {
    /// Create the app and kick off the initial sidebar refresh. The view
    /// starts on a fresh conversation so the composer accepts input
    /// immediately.
    pub fn new(api: Arc<dyn ChatApi>, session: SessionContext) -> Self {
        let mut controller = ConversationController::new(Arc::clone(&api), session);
        let follow_request = Arc::new(AtomicBool::new(false));
        let hook_flag = Arc::clone(&follow_request);
        controller.set_timeline_hook(Box::new(move |_| {
            hook_flag.store(true, Ordering::Relaxed);
        }));
        controller.start_new_conversation();

        let (sidebar_tx, sidebar_rx) = mpsc::unbounded_channel();

        let mut app = Self {
            controller,
            composer: ComposerState::new(),
            transcript: TranscriptState::new(),
            sidebar: SidebarState::new(),
            theme: Theme::default(),
            focus: Focus::Composer,
            should_quit: false,
            api,
            follow_request,
            synced_conversation: None,
            sidebar_tx,
            sidebar_rx,
        };
        app.refresh_conversations();
        app
    }

    /// Route a key press to the focused pane, falling back to global actions
    /// for keys the composer does not consume.
    pub fn handle_key(&mut self, key: KeyEvent) {
        match self.focus {
            Focus::Composer => {
                let disabled = !self.controller.composer_enabled();
                match self.composer.handle_key(key, disabled) {
                    KeyOutcome::Submitted(message) => {
                        self.controller.send(&message);
                    }
                    KeyOutcome::Consumed => {}
                    KeyOutcome::Ignored => self.handle_action(key_to_action(key)),
                }
            }
            Focus::Sidebar => self.handle_action(key_to_action(key)),
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::NewConversation => {
                self.controller.start_new_conversation();
                self.focus = Focus::Composer;
            }
            Action::RefreshConversations => self.refresh_conversations(),
            Action::FocusNext => {
                self.focus = match self.focus {
                    Focus::Composer => Focus::Sidebar,
                    Focus::Sidebar => Focus::Composer,
                };
            }
            Action::Up => match self.focus {
                Focus::Sidebar => self.sidebar.select_prev(),
                Focus::Composer => self.transcript.scroll_up(),
            },
            Action::Down => match self.focus {
                Focus::Sidebar => self.sidebar.select_next(),
                Focus::Composer => self.transcript.scroll_down(),
            },
            Action::Select => {
                if self.focus == Focus::Sidebar {
                    match self.sidebar.selected() {
                        SidebarEntry::NewConversation => {
                            self.controller.start_new_conversation();
                        }
                        SidebarEntry::Conversation(id) => {
                            self.controller.select_conversation(id);
                        }
                    }
                    self.focus = Focus::Composer;
                }
            }
            Action::None => {}
        }
    }

    /// Per-tick upkeep: apply network settlements, honor the follow request,
    /// drain sidebar refreshes, and resync once a new conversation gets its
    /// server-assigned id.
    pub fn tick(&mut self) {
        self.controller.process_events();

        if self.follow_request.swap(false, Ordering::Relaxed) {
            self.transcript.follow_latest();
        }

        while let Ok(update) = self.sidebar_rx.try_recv() {
            match update {
                Some(conversations) => self.sidebar.set_conversations(conversations),
                None => self.sidebar.finish_loading(),
            }
        }

        let active = self.controller.conversation_id().map(str::to_string);
        if active != self.synced_conversation {
            self.synced_conversation = active.clone();
            if let Some(id) = &active {
                self.sidebar.select_id(id);
            }
            self.refresh_conversations();
        }
    }

    /// Fetch the user's conversation list on a spawned task.
    pub fn refresh_conversations(&mut self) {
        self.sidebar.set_loading();
        let api = Arc::clone(&self.api);
        let user_id = self.controller.session().user_id().to_string();
        let tx = self.sidebar_tx.clone();
        tokio::spawn(async move {
            let update = match api.user_conversations(&user_id).await {
                Ok(list) => Some(list.conversation_ids),
                Err(error) => {
                    tracing::warn!(%error, "failed to refresh conversation list");
                    None
                }
            };
            let _ = tx.send(update);
        });
    }

    /// Id of the conversation currently open, for the sidebar highlight.
    pub fn active_conversation(&self) -> Option<&str> {
        self.controller.conversation_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use convo_client::{
        ApiError, ChatApi, ChatRequest, ChatResponse, ConversationHistory, HealthStatus, Phase,
        UserConversations,
    };
    use crossterm::event::{KeyCode, KeyModifiers};

    struct EchoApi;

    #[async_trait]
    impl ChatApi for EchoApi {
        async fn send_chat(&self, request: ChatRequest) -> Result<ChatResponse, ApiError> {
            Ok(ChatResponse {
                response: format!("echo: {}", request.message),
                source_agent_response: None,
                agent_workflow: Vec::new(),
                conversation_id: request
                    .conversation_id
                    .unwrap_or_else(|| "conv-new".to_string()),
                timestamp: Utc::now(),
            })
        }

        async fn conversation_history(
            &self,
            conversation_id: &str,
        ) -> Result<ConversationHistory, ApiError> {
            Ok(ConversationHistory {
                conversation_id: conversation_id.to_string(),
                messages: Vec::new(),
                message_count: 0,
            })
        }

        async fn user_conversations(&self, user_id: &str) -> Result<UserConversations, ApiError> {
            Ok(UserConversations {
                user_id: user_id.to_string(),
                conversation_ids: vec!["conv-1".to_string()],
                count: 1,
            })
        }

        async fn health(&self) -> Result<HealthStatus, ApiError> {
            Ok(HealthStatus {
                status: "healthy".to_string(),
            })
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[tokio::test]
    async fn test_starts_on_fresh_conversation_with_composer_enabled() {
        let app = App::new(Arc::new(EchoApi), SessionContext::with_user_id("user-1"));
        assert_eq!(app.controller.phase(), Phase::Idle);
        assert_eq!(app.controller.conversation_id(), None);
        assert_eq!(app.focus, Focus::Composer);
    }

    #[tokio::test]
    async fn test_typed_enter_dispatches_send() {
        let mut app = App::new(Arc::new(EchoApi), SessionContext::with_user_id("user-1"));
        for ch in "hi".chars() {
            app.handle_key(key(KeyCode::Char(ch)));
        }
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.controller.phase(), Phase::Sending);
        assert_eq!(app.controller.messages().len(), 1);
        assert!(app.composer.is_empty());
    }

    #[tokio::test]
    async fn test_typing_while_sending_is_dropped() {
        let mut app = App::new(Arc::new(EchoApi), SessionContext::with_user_id("user-1"));
        for ch in "hi".chars() {
            app.handle_key(key(KeyCode::Char(ch)));
        }
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.controller.phase(), Phase::Sending);

        app.handle_key(key(KeyCode::Char('x')));
        assert!(app.composer.is_empty());
        // A second Enter must not start another send.
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.controller.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_ctrl_n_resets_to_fresh_conversation() {
        let mut app = App::new(Arc::new(EchoApi), SessionContext::with_user_id("user-1"));
        app.controller.select_conversation("conv-1");
        app.handle_key(ctrl('n'));
        assert_eq!(app.controller.conversation_id(), None);
        assert!(app.controller.messages().is_empty());
        assert_eq!(app.focus, Focus::Composer);
    }

    #[tokio::test]
    async fn test_tab_toggles_focus_and_enter_selects() {
        let mut app = App::new(Arc::new(EchoApi), SessionContext::with_user_id("user-1"));
        app.sidebar.set_conversations(vec!["conv-1".to_string()]);

        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Sidebar);

        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.controller.conversation_id(), Some("conv-1"));
        assert_eq!(app.controller.phase(), Phase::LoadingHistory);
        assert_eq!(app.focus, Focus::Composer);
    }

    #[tokio::test]
    async fn test_timeline_mutation_repins_transcript_on_tick() {
        let mut app = App::new(Arc::new(EchoApi), SessionContext::with_user_id("user-1"));
        app.transcript.scroll_up();
        assert!(!app.transcript.is_following());

        for ch in "hi".chars() {
            app.handle_key(key(KeyCode::Char(ch)));
        }
        app.handle_key(key(KeyCode::Enter));
        app.tick();
        assert!(app.transcript.is_following());
    }

    #[tokio::test]
    async fn test_send_settlement_adopts_id_and_resyncs_sidebar() {
        let mut app = App::new(Arc::new(EchoApi), SessionContext::with_user_id("user-1"));
        for ch in "hi".chars() {
            app.handle_key(key(KeyCode::Char(ch)));
        }
        app.handle_key(key(KeyCode::Enter));

        let event = app
            .controller
            .next_event()
            .await
            .expect("send settlement should arrive");
        app.controller.apply_event(event);
        app.tick();

        assert_eq!(app.controller.conversation_id(), Some("conv-new"));
        assert_eq!(app.controller.phase(), Phase::Idle);
        assert_eq!(
            app.synced_conversation.as_deref(),
            Some("conv-new")
        );
    }
}

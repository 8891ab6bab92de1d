//! Conversation orchestration controller.
//!
//! [`ConversationController`] owns the message timeline for exactly one
//! conversation at a time. Every read (history) and write (send) against
//! the chat service goes through it, and it guarantees at most one
//! outstanding send per conversation by disabling the composer for the full
//! duration of the send.
//!
//! Network calls run on spawned tasks; their settlements flow back through
//! an unbounded channel and are applied exactly once by
//! [`ConversationController::process_events`] on the host's tick. Each
//! settlement carries the epoch it was issued under; switching conversations
//! bumps the epoch, so a slow response from a previous conversation can
//! never reach the new timeline.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::{ChatApi, ChatRequest, ChatResponse};
use crate::message::Message;
use crate::session::SessionContext;

/// Lifecycle phase of the mounted conversation view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No conversation mounted; composer disabled, no network activity.
    #[default]
    Uninitialized,
    /// History fetch in flight for a newly selected conversation.
    LoadingHistory,
    /// Composer enabled; accepts one send.
    Idle,
    /// A send is outstanding; composer disabled.
    Sending,
}

/// Settlement of a spawned network task.
#[derive(Debug)]
pub enum ControllerEvent {
    /// History fetch succeeded.
    HistoryLoaded {
        epoch: u64,
        messages: Vec<Message>,
    },
    /// History fetch failed; the timeline stays empty.
    HistoryFailed { epoch: u64 },
    /// Send succeeded.
    SendSucceeded {
        epoch: u64,
        response: Box<ChatResponse>,
    },
    /// Send failed (transport or non-success status).
    SendFailed { epoch: u64 },
}

impl ControllerEvent {
    fn epoch(&self) -> u64 {
        match self {
            Self::HistoryLoaded { epoch, .. }
            | Self::HistoryFailed { epoch }
            | Self::SendSucceeded { epoch, .. }
            | Self::SendFailed { epoch } => *epoch,
        }
    }
}

/// Hook invoked after every timeline mutation (e.g. to follow the newest
/// entry). Explicitly registered rather than implicitly subscribed.
pub type TimelineHook = Box<dyn FnMut(&[Message]) + Send>;

/// Owns the timeline and drives the send/receive cycle for one conversation.
pub struct ConversationController {
    api: Arc<dyn ChatApi>,
    session: SessionContext,
    conversation_id: Option<String>,
    messages: Vec<Message>,
    phase: Phase,
    /// Bumped on every conversation switch; settlements from older epochs
    /// are dropped.
    epoch: u64,
    event_tx: mpsc::UnboundedSender<ControllerEvent>,
    event_rx: mpsc::UnboundedReceiver<ControllerEvent>,
    timeline_hook: Option<TimelineHook>,
}

impl ConversationController {
    /// Create a controller in the [`Phase::Uninitialized`] state.
    pub fn new(api: Arc<dyn ChatApi>, session: SessionContext) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            api,
            session,
            conversation_id: None,
            messages: Vec::new(),
            phase: Phase::Uninitialized,
            epoch: 0,
            event_tx,
            event_rx,
            timeline_hook: None,
        }
    }

    /// The session this controller sends as.
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// The active conversation id, if one has been selected or assigned.
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// The timeline, in insertion (chronological display) order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the composer should accept input: true only in [`Phase::Idle`].
    pub fn composer_enabled(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// Register the post-mutation timeline hook, replacing any previous one.
    pub fn set_timeline_hook(&mut self, hook: TimelineHook) {
        self.timeline_hook = Some(hook);
    }

    fn notify_timeline(&mut self) {
        if let Some(hook) = &mut self.timeline_hook {
            hook(&self.messages);
        }
    }

    /// Switch to an existing conversation.
    ///
    /// Clears the timeline immediately, invalidates any in-flight
    /// settlements, and starts a history fetch. Allowed at any time,
    /// including mid-send.
    pub fn select_conversation(&mut self, conversation_id: impl Into<String>) {
        let conversation_id = conversation_id.into();
        self.epoch += 1;
        self.conversation_id = Some(conversation_id.clone());
        self.messages.clear();
        self.notify_timeline();
        self.phase = Phase::LoadingHistory;
        self.spawn_history_fetch(conversation_id);
    }

    /// Start a brand-new conversation with no identifier yet.
    ///
    /// The timeline is empty and the composer is enabled; the first
    /// successful exchange adopts the server-assigned identifier.
    pub fn start_new_conversation(&mut self) {
        self.epoch += 1;
        self.conversation_id = None;
        self.messages.clear();
        self.notify_timeline();
        self.phase = Phase::Idle;
    }

    /// Submit a user message.
    ///
    /// Appends the optimistic `Pending` entry and disables the composer in
    /// the same synchronous step, then dispatches the request. Returns
    /// `false` without side effects when the trimmed text is empty or the
    /// composer is not enabled (no second send can start while one is
    /// outstanding).
    pub fn send(&mut self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty() || !self.composer_enabled() {
            return false;
        }

        self.messages.push(Message::user_pending(
            trimmed,
            self.session.user_id(),
            self.conversation_id.clone(),
        ));
        self.notify_timeline();
        self.phase = Phase::Sending;

        self.spawn_send(trimmed.to_string());
        true
    }

    /// Drain and apply all pending settlements. Called on the host's tick.
    pub fn process_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            self.apply_event(event);
        }
    }

    /// Await the next settlement. Useful for hosts (and tests) that want to
    /// drive the controller event by event instead of polling.
    pub async fn next_event(&mut self) -> Option<ControllerEvent> {
        self.event_rx.recv().await
    }

    /// Apply one settlement. Settlements from a previous epoch are dropped.
    pub fn apply_event(&mut self, event: ControllerEvent) {
        if event.epoch() != self.epoch {
            tracing::debug!(
                event_epoch = event.epoch(),
                active_epoch = self.epoch,
                "dropping stale settlement from a previous conversation"
            );
            return;
        }

        match event {
            ControllerEvent::HistoryLoaded { messages, .. } => {
                self.messages = messages;
                self.phase = Phase::Idle;
                self.notify_timeline();
            }
            ControllerEvent::HistoryFailed { .. } => {
                // Nothing to show yet, so the failure is not surfaced.
                self.messages.clear();
                self.phase = Phase::Idle;
                self.notify_timeline();
            }
            ControllerEvent::SendSucceeded { response, .. } => {
                if self.conversation_id.is_none() {
                    self.conversation_id = Some(response.conversation_id.clone());
                }
                self.messages.push(Message::from_response(&response));
                self.phase = Phase::Idle;
                self.notify_timeline();
            }
            ControllerEvent::SendFailed { .. } => {
                // The optimistic message stays; a trailing notice is
                // appended instead of rolling it back.
                self.messages
                    .push(Message::failure_notice(self.conversation_id.clone()));
                self.phase = Phase::Idle;
                self.notify_timeline();
            }
        }
    }

    fn spawn_history_fetch(&self, conversation_id: String) {
        let api = Arc::clone(&self.api);
        let tx = self.event_tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let event = match api.conversation_history(&conversation_id).await {
                Ok(history) => ControllerEvent::HistoryLoaded {
                    epoch,
                    messages: history
                        .messages
                        .into_iter()
                        .map(Message::from_history)
                        .collect(),
                },
                Err(error) => {
                    tracing::warn!(%error, %conversation_id, "history fetch failed");
                    ControllerEvent::HistoryFailed { epoch }
                }
            };
            // Receiver gone means the controller was dropped.
            let _ = tx.send(event);
        });
    }

    fn spawn_send(&self, message: String) {
        let api = Arc::clone(&self.api);
        let tx = self.event_tx.clone();
        let epoch = self.epoch;
        let request = ChatRequest {
            message,
            user_id: self.session.user_id().to_string(),
            conversation_id: self.conversation_id.clone(),
        };
        tokio::spawn(async move {
            let event = match api.send_chat(request).await {
                Ok(response) => ControllerEvent::SendSucceeded {
                    epoch,
                    response: Box::new(response),
                },
                Err(error) => {
                    tracing::warn!(%error, "chat send failed");
                    ControllerEvent::SendFailed { epoch }
                }
            };
            let _ = tx.send(event);
        });
    }
}

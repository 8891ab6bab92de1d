//! Timeline message model.
//!
//! A [`Message`] is one turn in a conversation. Messages are created in one
//! of three ways: optimistically at send time (`Pending`), from a service
//! response or history entry (`Delivered`), or synthesized locally when a
//! send fails (`Error`). Once appended to a timeline they are never mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{AgentWorkflowStep, ChatResponse, HistoryEntry};

/// Sentinel sender id for service-authored messages.
pub const ASSISTANT_SENDER: &str = "assistant";

/// Fixed user-facing text for a synthetic send-failure message.
///
/// The underlying cause is logged, never surfaced here.
pub const SEND_FAILURE_TEXT: &str =
    "Sorry, something went wrong while processing your message. Please try again.";

/// Delivery state of a timeline message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Optimistic entry, not yet acknowledged by the service.
    Pending,
    /// Normal message (user-authored or received assistant reply).
    Delivered,
    /// Synthetic failure notice.
    Error,
}

/// One step of the routing metadata attached to an assistant reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// Name of the backend agent that handled this step.
    pub agent: String,
    /// Routing decision the agent made, if any (e.g. which agent it chose).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,
}

impl From<AgentWorkflowStep> for WorkflowStep {
    fn from(step: AgentWorkflowStep) -> Self {
        Self {
            agent: step.agent,
            decision: step.decision,
        }
    }
}

/// A single turn in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Content. Never empty after trimming for user-authored messages.
    pub text: String,
    /// The owning user's id, or [`ASSISTANT_SENDER`].
    pub sender_id: String,
    /// Client clock for optimistic entries, server-supplied otherwise.
    pub timestamp: DateTime<Utc>,
    /// `None` only on optimistic entries created before a brand-new
    /// conversation has been assigned an id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// Delivery state.
    pub status: DeliveryStatus,
    /// Routing metadata; empty renders nothing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workflow: Vec<WorkflowStep>,
}

impl Message {
    /// Create an optimistic user message at send time.
    pub fn user_pending(
        text: impl Into<String>,
        sender_id: impl Into<String>,
        conversation_id: Option<String>,
    ) -> Self {
        Self {
            text: text.into(),
            sender_id: sender_id.into(),
            timestamp: Utc::now(),
            conversation_id,
            status: DeliveryStatus::Pending,
            workflow: Vec::new(),
        }
    }

    /// Build the delivered assistant message for a successful chat response.
    pub fn from_response(response: &ChatResponse) -> Self {
        Self {
            text: response.response.clone(),
            sender_id: ASSISTANT_SENDER.into(),
            timestamp: response.timestamp,
            conversation_id: Some(response.conversation_id.clone()),
            status: DeliveryStatus::Delivered,
            workflow: response
                .agent_workflow
                .iter()
                .cloned()
                .map(WorkflowStep::from)
                .collect(),
        }
    }

    /// Build a timeline message from a history entry.
    ///
    /// An entry counts as an assistant turn when it carries agent metadata
    /// or has no `user_id`; the service stamps the requesting user's id on
    /// both sides of an exchange, so metadata presence is checked first.
    pub fn from_history(entry: HistoryEntry) -> Self {
        let assistant = entry.source_agent_response.is_some()
            || !entry.agent_workflow.is_empty()
            || entry.user_id.is_none();
        let sender_id = if assistant {
            ASSISTANT_SENDER.to_string()
        } else {
            entry.user_id.unwrap_or_default()
        };
        Self {
            text: entry.message,
            sender_id,
            timestamp: entry.timestamp,
            conversation_id: entry.conversation_id,
            status: DeliveryStatus::Delivered,
            workflow: entry
                .agent_workflow
                .into_iter()
                .map(WorkflowStep::from)
                .collect(),
        }
    }

    /// Create the synthetic error notice appended after a failed send.
    pub fn failure_notice(conversation_id: Option<String>) -> Self {
        Self {
            text: SEND_FAILURE_TEXT.into(),
            sender_id: ASSISTANT_SENDER.into(),
            timestamp: Utc::now(),
            conversation_id,
            status: DeliveryStatus::Error,
            workflow: Vec::new(),
        }
    }

    /// Whether this message was authored by the service.
    pub fn is_assistant(&self) -> bool {
        self.sender_id == ASSISTANT_SENDER
    }
}

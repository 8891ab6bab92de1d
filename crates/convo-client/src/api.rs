//! Wire contract for the chat service.
//!
//! The service is consumed through four endpoints: `POST /chat`,
//! `GET /conversations/{id}`, `GET /conversations/user/{user_id}`, and
//! `GET /health`. The types here mirror its JSON bodies; [`ChatApi`] is the
//! seam that lets the controller run against an in-memory fake in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body for `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Trimmed user message.
    pub message: String,
    /// The session's user id.
    pub user_id: String,
    /// Active conversation id; `None` asks the service to start a new one.
    pub conversation_id: Option<String>,
}

/// One step of the `agent_workflow` array on a chat response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentWorkflowStep {
    /// Agent name (e.g. "RouterAgent").
    pub agent: String,
    /// Routing decision, present on router steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,
    /// Seconds the step took, if the service reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<f64>,
}

/// Successful response from `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Final user-facing reply text.
    pub response: String,
    /// Raw reply from the selected agent, before personality post-processing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_agent_response: Option<String>,
    /// Ordered routing metadata.
    #[serde(default)]
    pub agent_workflow: Vec<AgentWorkflowStep>,
    /// Conversation the exchange was stored under. For a request with no
    /// conversation id this is the freshly assigned one.
    pub conversation_id: String,
    /// Server-side timestamp of the reply.
    pub timestamp: DateTime<Utc>,
}

/// One stored turn from `GET /conversations/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Message text.
    pub message: String,
    /// When the turn was stored.
    pub timestamp: DateTime<Utc>,
    /// Authoring user id; the service stamps it on both sides of an
    /// exchange, so it cannot distinguish direction on its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// Present only on assistant turns.
    #[serde(default)]
    pub agent_workflow: Vec<AgentWorkflowStep>,
    /// Present only on assistant turns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_agent_response: Option<String>,
}

/// Response from `GET /conversations/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationHistory {
    pub conversation_id: String,
    /// Turns in server-stored (chronological) order.
    pub messages: Vec<HistoryEntry>,
    #[serde(default)]
    pub message_count: usize,
}

/// Response from `GET /conversations/user/{user_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserConversations {
    pub user_id: String,
    pub conversation_ids: Vec<String>,
    #[serde(default)]
    pub count: usize,
}

/// Response from `GET /health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// Errors from talking to the chat service.
///
/// The controller treats every variant the same way (a transport failure is
/// indistinguishable from a logical one), but CLI commands print them.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Connection, DNS, or timeout failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("server returned status {0}")]
    Status(u16),

    /// Body did not match the expected shape.
    #[error("invalid response body: {0}")]
    Decode(#[source] reqwest::Error),
}

/// The chat service seam.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Submit one user message and await the routed reply.
    async fn send_chat(&self, request: ChatRequest) -> Result<ChatResponse, ApiError>;

    /// Fetch the stored history of one conversation.
    async fn conversation_history(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationHistory, ApiError>;

    /// List the conversation ids belonging to a user.
    async fn user_conversations(&self, user_id: &str) -> Result<UserConversations, ApiError>;

    /// Service health probe.
    async fn health(&self) -> Result<HealthStatus, ApiError>;
}

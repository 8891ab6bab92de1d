//! convo-client: Headless client core for the convo chat surface
//!
//! This crate provides everything below the terminal layer:
//! - Wire types and HTTP client for the chat service
//! - Session identity
//! - The timeline message model
//! - The conversation orchestration controller

pub mod api;
pub mod config;
pub mod controller;
pub mod http;
pub mod message;
pub mod session;

// Re-export commonly used types
pub use api::{
    AgentWorkflowStep, ApiError, ChatApi, ChatRequest, ChatResponse, ConversationHistory,
    HealthStatus, HistoryEntry, UserConversations,
};
pub use config::{ClientConfig, ConfigError};
pub use controller::{ControllerEvent, ConversationController, Phase, TimelineHook};
pub use http::HttpChatApi;
pub use message::{
    DeliveryStatus, Message, WorkflowStep, ASSISTANT_SENDER, SEND_FAILURE_TEXT,
};
pub use session::SessionContext;

/// Hard cap on composed message length, in characters.
pub const MAX_MESSAGE_LEN: usize = 1000;

/// Returns the client version.
pub fn client_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

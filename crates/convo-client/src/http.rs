//! HTTP implementation of the chat service seam.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::api::{
    ApiError, ChatApi, ChatRequest, ChatResponse, ConversationHistory, HealthStatus,
    UserConversations,
};
use crate::config::ClientConfig;

/// [`ChatApi`] over HTTP using a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpChatApi {
    client: Client,
    base_url: String,
}

impl HttpChatApi {
    /// Create a client for the given base URL with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from the loaded configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(
            config.server_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.client.get(self.url(path)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        response.json().await.map_err(ApiError::Decode)
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn send_chat(&self, request: ChatRequest) -> Result<ChatResponse, ApiError> {
        tracing::debug!(user_id = %request.user_id, "posting chat message");
        let response = self
            .client
            .post(self.url("/chat"))
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        response.json().await.map_err(ApiError::Decode)
    }

    async fn conversation_history(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationHistory, ApiError> {
        self.get_json(&format!("/conversations/{conversation_id}"))
            .await
    }

    async fn user_conversations(&self, user_id: &str) -> Result<UserConversations, ApiError> {
        self.get_json(&format!("/conversations/user/{user_id}"))
            .await
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get_json("/health").await
    }
}

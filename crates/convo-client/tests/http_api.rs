//! Integration tests for the HTTP chat client against a mock server.

use std::time::Duration;

use convo_client::{ApiError, ChatApi, ChatRequest, HttpChatApi};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api(server: &MockServer) -> HttpChatApi {
    HttpChatApi::new(server.uri(), Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn send_chat_posts_body_and_parses_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({
            "message": "Qual a taxa da maquininha?",
            "user_id": "user-1",
            "conversation_id": null,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Olá!",
            "source_agent_response": "raw",
            "agent_workflow": [
                {"agent": "RouterAgent", "decision": "KnowledgeAgent"}
            ],
            "conversation_id": "conv-9",
            "timestamp": "2024-05-01T12:00:00Z",
        })))
        .mount(&server)
        .await;

    let response = api(&server)
        .send_chat(ChatRequest {
            message: "Qual a taxa da maquininha?".into(),
            user_id: "user-1".into(),
            conversation_id: None,
        })
        .await
        .expect("chat request should succeed");

    assert_eq!(response.response, "Olá!");
    assert_eq!(response.conversation_id, "conv-9");
    assert_eq!(response.agent_workflow.len(), 1);
    assert_eq!(
        response.agent_workflow[0].decision.as_deref(),
        Some("KnowledgeAgent")
    );
}

#[tokio::test]
async fn send_chat_maps_server_error_to_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = api(&server)
        .send_chat(ChatRequest {
            message: "hello".into(),
            user_id: "user-1".into(),
            conversation_id: Some("conv-1".into()),
        })
        .await;

    match result {
        Err(ApiError::Status(500)) => {}
        other => panic!("expected Status(500), got {other:?}"),
    }
}

#[tokio::test]
async fn conversation_history_hits_expected_path() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/conversations/conv-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversation_id": "conv-1",
            "messages": [
                {"message": "hi", "timestamp": "2024-05-01T12:00:00Z", "user_id": "user-1"},
                {"message": "hello!", "timestamp": "2024-05-01T12:00:01Z",
                 "user_id": "user-1", "source_agent_response": "hello!"}
            ],
            "message_count": 2,
        })))
        .mount(&server)
        .await;

    let history = api(&server)
        .conversation_history("conv-1")
        .await
        .expect("history request should succeed");

    assert_eq!(history.conversation_id, "conv-1");
    assert_eq!(history.messages.len(), 2);
    assert_eq!(history.messages[0].message, "hi");
}

#[tokio::test]
async fn user_conversations_lists_ids() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/conversations/user/user-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_id": "user-1",
            "conversation_ids": ["conv-1", "conv-2"],
            "count": 2,
        })))
        .mount(&server)
        .await;

    let conversations = api(&server)
        .user_conversations("user-1")
        .await
        .expect("list request should succeed");

    assert_eq!(conversations.conversation_ids, vec!["conv-1", "conv-2"]);
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = api(&server).health().await;
    assert!(matches!(result, Err(ApiError::Decode(_))));
}

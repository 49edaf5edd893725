use std::time::Duration;

use appointmentBot::clients::http_client;
use appointmentBot::error::SchedulerError;
use appointmentBot::models::transcript::{ChatMessage, ChatRole};
use appointmentBot::service::openai_service::{OpenAIClient, OpenAIService};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service(server: &MockServer) -> OpenAIService {
    OpenAIService::new(
        http_client(Duration::from_secs(5)).unwrap(),
        format!("{}/v1", server.uri()),
        "test-api-key".to_string(),
        "gpt-4o-mini".to_string(),
    )
}

fn transcript() -> Vec<ChatMessage> {
    vec![
        ChatMessage::new(ChatRole::System, "Greet the user."),
        ChatMessage::new(ChatRole::User, "Ada"),
    ]
}

#[tokio::test]
async fn sends_transcript_and_returns_trimmed_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer test-api-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "max_tokens": 300
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "  Hello Ada!\n" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = service(&server).generate(&transcript()).await.unwrap();
    assert_eq!(reply, "Hello Ada!");
}

#[tokio::test]
async fn error_status_is_backend_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Rate limit exceeded"))
        .mount(&server)
        .await;

    match service(&server).generate(&transcript()).await {
        Err(SchedulerError::Backend(msg)) => assert!(msg.contains("429")),
        other => panic!("expected backend error, got {:?}", other),
    }
}

#[tokio::test]
async fn empty_choices_are_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    assert!(matches!(
        service(&server).generate(&transcript()).await,
        Err(SchedulerError::Backend(_))
    ));
}

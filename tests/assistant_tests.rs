// Integration tests for the quote assistant against a mock chat completions endpoint

use pricing_desk::assistant::{ChatBackend, ChatClient, ChatMessage, Conversation, Role};
use pricing_desk::config::AssistantConfig;
use pricing_desk::error::AppError;
use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn assistant_config(base_url: &str) -> AssistantConfig {
    AssistantConfig {
        base_url: base_url.to_string(),
        api_key: "gsk-test-key".to_string(),
        ..AssistantConfig::default()
    }
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1700000000,
        "model": "llama-3.3-70b-versatile",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 120, "completion_tokens": 30, "total_tokens": 150}
    })
}

#[tokio::test]
async fn test_chat_client_sends_model_and_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer gsk-test-key"))
        .and(body_partial_json(json!({
            "model": "llama-3.3-70b-versatile",
            "temperature": 0.1,
            "messages": [{"role": "system", "content": "rules"}, {"role": "user", "content": "hi"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("- STATO: Incluso (Gratuito)")))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChatClient::new(reqwest::Client::new(), &assistant_config(&server.uri()));
    let reply = client
        .complete(vec![ChatMessage::system("rules"), ChatMessage::user("hi")])
        .await
        .unwrap();

    assert_eq!(reply, "- STATO: Incluso (Gratuito)");
}

#[tokio::test]
async fn test_chat_client_keeps_upstream_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let client = ChatClient::new(reqwest::Client::new(), &assistant_config(&server.uri()));
    let result = client.complete(vec![ChatMessage::user("hi")]).await;

    match result {
        Err(AppError::Assistant { status, message }) => {
            assert_eq!(status.map(|s| s.as_u16()), Some(429));
            assert!(message.contains("rate limited"));
        }
        other => panic!("Expected assistant error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_chat_client_rejects_empty_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": null}}]
        })))
        .mount(&server)
        .await;

    let client = ChatClient::new(reqwest::Client::new(), &assistant_config(&server.uri()));
    assert!(matches!(
        client.complete(vec![ChatMessage::user("hi")]).await,
        Err(AppError::Assistant { status: None, .. })
    ));
}

#[tokio::test]
async fn test_conversation_survives_upstream_failure() {
    let failing = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&failing)
        .await;

    let mut conversation = Conversation::new();
    let client = ChatClient::new(reqwest::Client::new(), &assistant_config(&failing.uri()));
    assert!(conversation
        .ask(&client, "rules", "Quote F24 for 10 employees")
        .await
        .is_err());
    assert_eq!(conversation.messages().len(), 1);

    let healthy = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "system", "content": "rules"},
                {"role": "user", "content": "Quote F24 for 10 employees"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("- CALCOLO: 25€ x 10 = 250€")))
        .mount(&healthy)
        .await;

    let client = ChatClient::new(reqwest::Client::new(), &assistant_config(&healthy.uri()));
    let reply = conversation.retry(&client, "rules").await.unwrap();

    assert!(reply.contains("250€"));
    assert_eq!(conversation.messages().len(), 2);
    assert_eq!(conversation.messages()[0].role, Role::User);
    assert_eq!(conversation.messages()[1].role, Role::Assistant);
}

//! Integration tests for DeepseekClient using wiremock

use llm::remote::DeepseekClient;
use llm::{ChatModel, ChatRequest, LlmError, Message, RemoteLlmConfig, ResponseFormat};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_client(mock_server: &MockServer) -> DeepseekClient {
    let config = RemoteLlmConfig::new("test-api-key", mock_server.uri(), "deepseek-chat");
    DeepseekClient::new(config).unwrap()
}

fn create_test_request() -> ChatRequest {
    ChatRequest::new(vec![
        Message::system("Tu es un expert en rédaction web SEO."),
        Message::human("Génère le contenu de la page d'accueil."),
    ])
    .with_temperature(0.7)
    .with_max_tokens(2000)
    .with_response_format(ResponseFormat::JsonObject)
}

#[tokio::test]
async fn test_deepseek_chat_success() {
    let mock_server = MockServer::start().await;

    let response_body = serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 1700000000,
        "model": "deepseek-chat",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": "{\"hero\":{\"title\":\"Plombier à Lyon\"}}" },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 120, "completion_tokens": 40, "total_tokens": 160 }
    });

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer test-api-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "deepseek-chat",
            "response_format": { "type": "json_object" },
            "max_tokens": 2000
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let response = client.chat(create_test_request()).await.unwrap();

    assert!(response.text().contains("Plombier à Lyon"));
    let usage = response.usage.unwrap();
    assert_eq!(usage.input_tokens, 120);
    assert_eq!(usage.total_tokens, 160);
    assert_eq!(response.metadata["finish_reason"], "stop");
}

#[tokio::test]
async fn test_deepseek_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let error = client.chat(create_test_request()).await.unwrap_err();

    assert!(matches!(error, LlmError::AuthenticationError(_)));
    assert!(error.is_auth_error());
}

#[tokio::test]
async fn test_deepseek_rate_limited() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let error = client.chat(create_test_request()).await.unwrap_err();

    assert!(matches!(error, LlmError::RateLimitExceeded(_)));
    assert!(error.is_retryable());
}

#[tokio::test]
async fn test_deepseek_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let error = client.chat(create_test_request()).await.unwrap_err();

    assert!(matches!(error, LlmError::InvalidResponse(_)));
}

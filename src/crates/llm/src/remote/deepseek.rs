//! Deepseek client implementation.
//!
//! DeepSeek exposes an OpenAI-compatible `/v1/chat/completions` endpoint. The pipeline
//! uses `deepseek-chat` with `response_format: {"type": "json_object"}` so that page copy
//! comes back as a parseable document.
//!
//! # Example
//!
//! ```rust,ignore
//! use llm::remote::DeepseekClient;
//! use llm::config::RemoteLlmConfig;
//! use llm::{ChatModel, ChatRequest, Message};
//!
//! let config = RemoteLlmConfig::from_env("DEEPSEEK_API_KEY", "https://api.deepseek.com", "deepseek-chat")?;
//! let client = DeepseekClient::new(config)?;
//! let response = client.chat(ChatRequest::new(vec![Message::human("Bonjour")])).await?;
//! ```

use crate::chat::{ChatModel, ChatRequest, ChatResponse, Message, MessageRole, ResponseFormat, UsageMetadata};
use crate::config::RemoteLlmConfig;
use crate::error::{LlmError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Deepseek API client (OpenAI-compatible).
#[derive(Clone)]
pub struct DeepseekClient {
    config: RemoteLlmConfig,
    client: Client,
}

impl DeepseekClient {
    /// Create a new Deepseek client with the given configuration.
    pub fn new(config: RemoteLlmConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::ConfigError("Deepseek API key is empty".to_string()));
        }

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.config.base_url)
    }

    fn convert_message(msg: &Message) -> DeepseekMessage {
        DeepseekMessage {
            role: match msg.role {
                MessageRole::System => "system".to_string(),
                MessageRole::Human => "user".to_string(),
                MessageRole::Assistant => "assistant".to_string(),
            },
            content: msg.content.clone(),
        }
    }

    fn convert_response(deepseek_resp: DeepseekResponse) -> Result<ChatResponse> {
        let choice = deepseek_resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("Deepseek returned no choices".to_string()))?;

        let usage = deepseek_resp
            .usage
            .as_ref()
            .map(|u| UsageMetadata::new(u.prompt_tokens, u.completion_tokens));

        let mut metadata = HashMap::new();
        metadata.insert(
            "model".to_string(),
            serde_json::Value::String(deepseek_resp.model),
        );
        metadata.insert(
            "finish_reason".to_string(),
            serde_json::Value::String(choice.finish_reason.unwrap_or_default()),
        );

        Ok(ChatResponse {
            message: Message::assistant(choice.message.content),
            usage,
            metadata,
        })
    }
}

#[async_trait]
impl ChatModel for DeepseekClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let url = self.completions_url();

        let req_body = DeepseekRequest {
            model: self.config.model.clone(),
            messages: request.messages.iter().map(Self::convert_message).collect(),
            temperature: request.config.temperature,
            max_tokens: request.config.max_tokens,
            top_p: request.config.top_p,
            response_format: match request.config.response_format {
                ResponseFormat::JsonObject => Some(DeepseekResponseFormat {
                    kind: "json_object".to_string(),
                }),
                ResponseFormat::Text => None,
            },
            stream: false,
        };

        tracing::debug!(model = %self.config.model, messages = req_body.messages.len(), "Calling Deepseek");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&req_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                401 | 403 => LlmError::AuthenticationError(error_text),
                429 => LlmError::RateLimitExceeded(error_text),
                code => LlmError::Api {
                    provider: "deepseek",
                    status: code,
                    message: error_text,
                },
            });
        }

        let deepseek_resp: DeepseekResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Self::convert_response(deepseek_resp)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// Deepseek API types (OpenAI-compatible)
#[derive(Debug, Serialize)]
struct DeepseekRequest {
    model: String,
    messages: Vec<DeepseekMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<DeepseekResponseFormat>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct DeepseekResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct DeepseekMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct DeepseekResponse {
    model: String,
    choices: Vec<DeepseekChoice>,
    usage: Option<DeepseekUsage>,
}

#[derive(Debug, Deserialize)]
struct DeepseekChoice {
    message: DeepseekMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeepseekUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = RemoteLlmConfig::new("test-key", "https://api.deepseek.com", "deepseek-chat");
        let client = DeepseekClient::new(config).unwrap();
        assert_eq!(client.model_name(), "deepseek-chat");
        assert_eq!(client.completions_url(), "https://api.deepseek.com/v1/chat/completions");
    }

    #[test]
    fn test_empty_key_rejected() {
        let config = RemoteLlmConfig::new("  ", "https://api.deepseek.com", "deepseek-chat");
        assert!(matches!(DeepseekClient::new(config), Err(LlmError::ConfigError(_))));
    }

    #[test]
    fn test_json_response_format_serialization() {
        let body = DeepseekRequest {
            model: "deepseek-chat".to_string(),
            messages: vec![DeepseekClient::convert_message(&Message::human("x"))],
            temperature: Some(0.7),
            max_tokens: Some(2000),
            top_p: None,
            response_format: Some(DeepseekResponseFormat {
                kind: "json_object".to_string(),
            }),
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][0]["role"], "user");
        assert!(json.get("top_p").is_none());
    }

    #[test]
    fn test_convert_response_without_choices() {
        let resp = DeepseekResponse {
            model: "deepseek-chat".to_string(),
            choices: vec![],
            usage: None,
        };
        assert!(matches!(
            DeepseekClient::convert_response(resp),
            Err(LlmError::InvalidResponse(_))
        ));
    }
}

//! Chat model abstraction and provider clients.
//!
//! The enrichment stage of the pipeline only needs one thing from a language model:
//! send a system prompt plus a user prompt and get text (usually a JSON document) back.
//! That contract is the [`ChatModel`] trait. [`remote::DeepseekClient`] implements it
//! against DeepSeek's OpenAI-compatible API.
//!
//! # Example
//!
//! ```rust,ignore
//! use llm::{ChatModel, ChatRequest, Message, ResponseFormat};
//! use llm::config::RemoteLlmConfig;
//! use llm::remote::DeepseekClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RemoteLlmConfig::from_env(
//!         "DEEPSEEK_API_KEY",
//!         "https://api.deepseek.com",
//!         "deepseek-chat",
//!     )?;
//!     let client = DeepseekClient::new(config)?;
//!
//!     let request = ChatRequest::new(vec![
//!         Message::system("Tu es un expert en rédaction SEO."),
//!         Message::human("Rédige une accroche pour un plombier à Lyon."),
//!     ])
//!     .with_temperature(0.7)
//!     .with_max_tokens(500)
//!     .with_response_format(ResponseFormat::JsonObject);
//!
//!     let response = client.chat(request).await?;
//!     println!("{}", response.text());
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod config;
pub mod error;

#[cfg(feature = "remote")]
pub mod remote;

// Re-export commonly used types
pub use chat::{
    ChatConfig, ChatModel, ChatRequest, ChatResponse, Message, MessageRole, ResponseFormat,
    UsageMetadata,
};
pub use config::RemoteLlmConfig;
pub use error::{LlmError, Result};

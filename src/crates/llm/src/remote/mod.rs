//! Remote LLM provider implementations.
//!
//! - **Deepseek** - `deepseek-chat` through the OpenAI-compatible completions endpoint

pub mod deepseek;

pub use deepseek::DeepseekClient;

//! Errors from the chat completion clients.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlmError>;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Key rejected by the provider (401/403).
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("API key not found: {0}")]
    ApiKeyNotFound(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Any other non-success status.
    #[error("{provider} API error {status}: {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    /// Body did not decode, or carried no usable choice.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl LlmError {
    /// Transport failures, 429 and 5xx.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::HttpError(_) | LlmError::RateLimitExceeded(_) => true,
            LlmError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            LlmError::AuthenticationError(_) | LlmError::ApiKeyNotFound(_)
        )
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> LlmError {
        LlmError::Api {
            provider: "deepseek",
            status,
            message: "boom".into(),
        }
    }

    #[test]
    fn test_error_classification() {
        assert!(LlmError::RateLimitExceeded("slow down".into()).is_retryable());
        assert!(api(503).is_retryable());
        assert!(!api(400).is_retryable());
        assert!(!LlmError::AuthenticationError("bad key".into()).is_retryable());
        assert!(LlmError::ApiKeyNotFound("DEEPSEEK_API_KEY".into()).is_auth_error());
        assert!(!LlmError::InvalidResponse("empty".into()).is_auth_error());
    }

    #[test]
    fn test_api_error_message() {
        assert_eq!(api(502).to_string(), "deepseek API error 502: boom");
    }
}

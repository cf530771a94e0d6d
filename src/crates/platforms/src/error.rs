//! Error types shared by all platform clients.

use thiserror::Error;

/// Result type for platform calls.
pub type Result<T> = std::result::Result<T, PlatformError>;

/// Errors returned by the platform clients.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform answered with a non-success status.
    #[error("{platform} API error {status}: {message}")]
    Api {
        platform: &'static str,
        status: u16,
        message: String,
    },

    /// Credentials were rejected (401/403).
    #[error("{platform} authentication failed: {message}")]
    Authentication {
        platform: &'static str,
        message: String,
    },

    /// The requested resource does not exist (404).
    #[error("{platform} resource not found: {message}")]
    NotFound {
        platform: &'static str,
        message: String,
    },

    /// Too many requests (429).
    #[error("{platform} rate limit exceeded: {message}")]
    RateLimited {
        platform: &'static str,
        message: String,
    },

    /// The body could not be decoded or lacked an expected field.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Client misconfiguration (missing token, bad base URL).
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PlatformError {
    /// Check if retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            PlatformError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            PlatformError::RateLimited { .. } => true,
            PlatformError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Check if the error is a 404 from the platform.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PlatformError::NotFound { .. })
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            PlatformError::Api { status, .. } => Some(*status),
            PlatformError::Authentication { .. } => Some(401),
            PlatformError::NotFound { .. } => Some(404),
            PlatformError::RateLimited { .. } => Some(429),
            PlatformError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PlatformError {
    fn from(err: serde_json::Error) -> Self {
        PlatformError::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let server = PlatformError::Api {
            platform: "cloudflare",
            status: 503,
            message: "unavailable".into(),
        };
        assert!(server.is_retryable());
        assert_eq!(server.status(), Some(503));

        let client = PlatformError::Api {
            platform: "cloudflare",
            status: 400,
            message: "bad".into(),
        };
        assert!(!client.is_retryable());

        let limited = PlatformError::RateLimited {
            platform: "netlify",
            message: String::new(),
        };
        assert!(limited.is_retryable());

        let auth = PlatformError::Authentication {
            platform: "sanity",
            message: "bad token".into(),
        };
        assert!(!auth.is_retryable());
        assert_eq!(auth.status(), Some(401));
    }

    #[test]
    fn test_not_found_flag() {
        let err = PlatformError::NotFound {
            platform: "cloudflare",
            message: "project".into(),
        };
        assert!(err.is_not_found());
        assert!(err.to_string().contains("cloudflare"));
    }
}

//! Shared request plumbing: client construction and status mapping.

use crate::error::{PlatformError, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// User agent sent with every platform call.
pub const USER_AGENT: &str = concat!("awema-pipeline/", env!("CARGO_PKG_VERSION"));

/// Build a `reqwest` client with the given request timeout.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(PlatformError::from)
}

/// Map a non-success response onto a [`PlatformError`].
///
/// `extract` gets a chance to pull a human readable message out of the body; the raw body
/// is used otherwise.
pub async fn check_status_with(
    platform: &'static str,
    response: Response,
    extract: fn(&str) -> Option<String>,
) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = extract(&body).unwrap_or_else(|| {
        if body.is_empty() {
            status.canonical_reason().unwrap_or("unknown error").to_string()
        } else {
            body
        }
    });

    tracing::debug!(platform, status = status.as_u16(), %message, "Platform call failed");

    Err(match status.as_u16() {
        401 | 403 => PlatformError::Authentication { platform, message },
        404 => PlatformError::NotFound { platform, message },
        429 => PlatformError::RateLimited { platform, message },
        code => PlatformError::Api {
            platform,
            status: code,
            message,
        },
    })
}

/// [`check_status_with`] using the raw body as the message.
pub async fn check_status(platform: &'static str, response: Response) -> Result<Response> {
    check_status_with(platform, response, |_| None).await
}

/// Decode a JSON body, reporting failures as [`PlatformError::InvalidResponse`].
pub async fn parse_json<T: DeserializeOwned>(platform: &'static str, response: Response) -> Result<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| PlatformError::InvalidResponse(format!("{}: {}", platform, e)))
}

/// Strip trailing slashes so paths can be appended with `format!("{}/...")`.
pub fn normalize_base(base: impl Into<String>) -> String {
    base.into().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base() {
        assert_eq!(normalize_base("https://api.netlify.com/api/v1/"), "https://api.netlify.com/api/v1");
        assert_eq!(normalize_base("http://127.0.0.1:8080"), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_build_client() {
        assert!(build_client(Duration::from_secs(5)).is_ok());
    }
}

//! Retry with exponential backoff for platform calls
//!
//! Netlify deploys, Cloudflare uploads and Sanity project creation go through
//! [`retry_with_backoff`]. Errors are classified first so that rejected credentials or
//! missing resources fail fast while timeouts and 5xx answers are retried.

use crate::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Classification of errors for retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// May succeed on retry (rate limits, timeouts, 5xx)
    Transient,

    /// Will not succeed on retry (4xx, invalid auth, bad input)
    Permanent,

    /// Treated as transient
    Unknown,
}

/// Backoff settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    /// Add up to 25% random delay
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 1000,
            max_backoff_ms: 60_000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// No retries at all; used by tests and one-shot CLI calls
    pub fn none() -> Self {
        Self::new(0).with_jitter(false)
    }

    pub fn with_initial_backoff(mut self, ms: u64) -> Self {
        self.initial_backoff_ms = ms;
        self
    }

    pub fn with_max_backoff(mut self, ms: u64) -> Self {
        self.max_backoff_ms = ms;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Backoff delay before retry number `attempt + 1`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let delay_ms =
            (self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(attempt as i32)) as u64;
        let delay_ms = delay_ms.min(self.max_backoff_ms);

        let delay_ms = if self.jitter {
            let jitter_amount = (delay_ms as f64 * 0.25 * rand::random::<f64>()) as u64;
            delay_ms + jitter_amount
        } else {
            delay_ms
        };

        Duration::from_millis(delay_ms)
    }
}

/// Classify an error to decide whether it is worth retrying
pub fn classify_error(error: &PipelineError) -> ErrorClass {
    match error {
        PipelineError::Platform(e) => {
            if e.is_retryable() {
                ErrorClass::Transient
            } else {
                match e {
                    platforms::PlatformError::Authentication { .. }
                    | platforms::PlatformError::NotFound { .. }
                    | platforms::PlatformError::Config(_) => ErrorClass::Permanent,
                    platforms::PlatformError::Api { status, .. } if (400..500).contains(status) => {
                        ErrorClass::Permanent
                    }
                    other => classify_message(&other.to_string()),
                }
            }
        }
        PipelineError::Llm(e) => {
            if e.is_retryable() {
                ErrorClass::Transient
            } else if e.is_auth_error() {
                ErrorClass::Permanent
            } else {
                ErrorClass::Unknown
            }
        }
        PipelineError::Timeout(_) => ErrorClass::Transient,
        PipelineError::Validation(_)
        | PipelineError::NotFound(_)
        | PipelineError::InvalidStateTransition { .. }
        | PipelineError::Config(_) => ErrorClass::Permanent,
        PipelineError::General(msg) | PipelineError::Build(msg) => classify_message(msg),
        _ => ErrorClass::Unknown,
    }
}

fn classify_message(msg: &str) -> ErrorClass {
    let msg_lower = msg.to_lowercase();

    let transient = [
        "rate limit",
        "too many requests",
        "429",
        "timeout",
        "timed out",
        "deadline exceeded",
        "503",
        "service unavailable",
        "502",
        "bad gateway",
        "500",
        "internal server error",
        "connection",
        "network",
        "dns",
    ];
    if transient.iter().any(|needle| msg_lower.contains(needle)) {
        return ErrorClass::Transient;
    }

    let permanent = [
        "401",
        "unauthorized",
        "invalid api key",
        "authentication failed",
        "403",
        "forbidden",
        "access denied",
        "404",
        "not found",
        "400",
        "bad request",
        "invalid request",
    ];
    if permanent.iter().any(|needle| msg_lower.contains(needle)) {
        return ErrorClass::Permanent;
    }

    ErrorClass::Unknown
}

/// Execute `f` until it succeeds, a permanent error occurs or retries run out
pub async fn retry_with_backoff<F, Fut, T>(
    config: &RetryConfig,
    operation_name: &str,
    mut f: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            info!(
                operation = operation_name,
                attempt = attempt,
                max_retries = config.max_retries,
                "Retrying operation"
            );
        }

        match f().await {
            Ok(result) => {
                if attempt > 0 {
                    info!(operation = operation_name, attempt = attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) => {
                let error_class = classify_error(&e);

                debug!(
                    operation = operation_name,
                    attempt = attempt,
                    error = %e,
                    classification = ?error_class,
                    "Operation failed"
                );

                if error_class == ErrorClass::Permanent {
                    error!(operation = operation_name, error = %e, "Permanent error detected, aborting retries");
                    return Err(e);
                }

                last_error = Some(e);

                if attempt < config.max_retries {
                    let delay = config.backoff_delay(attempt);
                    warn!(
                        operation = operation_name,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Transient error, will retry after delay"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    let final_error = last_error.unwrap_or_else(|| {
        PipelineError::General(format!(
            "Operation '{}' failed after {} retries",
            operation_name, config.max_retries
        ))
    });

    error!(
        operation = operation_name,
        max_retries = config.max_retries,
        error = %final_error,
        "All retry attempts exhausted"
    );

    Err(final_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn platform(status: u16) -> PipelineError {
        PipelineError::Platform(platforms::PlatformError::Api {
            platform: "netlify",
            status,
            message: "boom".to_string(),
        })
    }

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.initial_backoff_ms, 1000);
        assert_eq!(config.max_backoff_ms, 60_000);
        assert_eq!(config.backoff_multiplier, 2.0);
        assert!(config.jitter);
    }

    #[test]
    fn test_backoff_delay_exponential_and_capped() {
        let config = RetryConfig::new(10)
            .with_initial_backoff(1000)
            .with_max_backoff(5000)
            .with_jitter(false);

        assert_eq!(config.backoff_delay(0).as_millis(), 1000);
        assert_eq!(config.backoff_delay(1).as_millis(), 2000);
        assert_eq!(config.backoff_delay(2).as_millis(), 4000);
        assert_eq!(config.backoff_delay(5).as_millis(), 5000);
    }

    #[test]
    fn test_jitter_stays_within_quarter() {
        let config = RetryConfig::new(3).with_initial_backoff(1000);
        for _ in 0..20 {
            let ms = config.backoff_delay(0).as_millis();
            assert!((1000..=1250).contains(&ms));
        }
    }

    #[test]
    fn test_classify_platform_errors() {
        assert_eq!(classify_error(&platform(503)), ErrorClass::Transient);
        assert_eq!(classify_error(&platform(422)), ErrorClass::Permanent);

        let auth = PipelineError::Platform(platforms::PlatformError::Authentication {
            platform: "cloudflare",
            message: "bad token".to_string(),
        });
        assert_eq!(classify_error(&auth), ErrorClass::Permanent);

        let limited = PipelineError::Platform(platforms::PlatformError::RateLimited {
            platform: "sanity",
            message: "slow down".to_string(),
        });
        assert_eq!(classify_error(&limited), ErrorClass::Transient);
    }

    #[test]
    fn test_classify_messages() {
        assert_eq!(
            classify_error(&PipelineError::General("Request timed out".to_string())),
            ErrorClass::Transient
        );
        assert_eq!(
            classify_error(&PipelineError::General("403 Forbidden".to_string())),
            ErrorClass::Permanent
        );
        assert_eq!(
            classify_error(&PipelineError::General("Some other error".to_string())),
            ErrorClass::Unknown
        );
        assert_eq!(
            classify_error(&PipelineError::Validation("businessName".to_string())),
            ErrorClass::Permanent
        );
    }

    #[tokio::test]
    async fn test_retry_success_after_transient_errors() {
        let config = RetryConfig::new(3).with_initial_backoff(10).with_jitter(false);
        let attempts = Arc::new(Mutex::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let result = retry_with_backoff(&config, "netlify_deploy", move || {
            let count = Arc::clone(&attempts_clone);
            async move {
                let current = {
                    let mut c = count.lock().unwrap();
                    *c += 1;
                    *c
                };
                if current < 3 {
                    Err(platform(502))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(*attempts.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_retry_abort_on_permanent_error() {
        let config = RetryConfig::new(3).with_initial_backoff(10);
        let attempts = Arc::new(Mutex::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let result: Result<()> = retry_with_backoff(&config, "sanity_create_project", move || {
            let count = Arc::clone(&attempts_clone);
            async move {
                *count.lock().unwrap() += 1;
                Err(platform(401))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(*attempts.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_retry_exhaust_all_attempts() {
        let config = RetryConfig::new(2).with_initial_backoff(10).with_jitter(false);
        let attempts = Arc::new(Mutex::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let result: Result<()> = retry_with_backoff(&config, "cloudflare_upload", move || {
            let count = Arc::clone(&attempts_clone);
            async move {
                *count.lock().unwrap() += 1;
                Err(PipelineError::Timeout("upload".to_string()))
            }
        })
        .await;

        assert!(matches!(result, Err(PipelineError::Timeout(_))));
        assert_eq!(*attempts.lock().unwrap(), 3);
    }
}

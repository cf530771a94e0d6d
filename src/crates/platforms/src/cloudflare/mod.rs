//! Cloudflare v4 API client.
//!
//! Every response comes wrapped in the `{success, errors, messages, result}` envelope;
//! [`CloudflareClient`] unwraps it and surfaces `errors[0].message` on failure.
//!
//! - [`pages`] - Pages projects, deployments and project domains
//! - [`zones`] - zone lookup, DNS records, zone settings and page rules

pub mod pages;
pub mod zones;

pub use pages::{
    DeploymentConfigs, EnvVar, PagesBuildConfig, PagesDeployment, PagesDomain, PagesProject,
    PagesProjectConfig, ProductionDeploymentConfig, UploadFile,
};
pub use zones::{DnsRecord, NewDnsRecord, PageRule, Zone};

use crate::error::{PlatformError, Result};
use crate::http::{build_client, check_status_with, normalize_base};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PLATFORM: &str = "cloudflare";

/// Default v4 API root.
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudflareConfig {
    pub account_id: String,
    pub api_token: String,
    /// Zone used for `*.awema.fr` subdomains.
    pub zone_id: Option<String>,
    pub api_base: String,
    pub timeout: Duration,
}

impl CloudflareConfig {
    pub fn new(account_id: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            api_token: api_token.into(),
            zone_id: None,
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(300),
        }
    }

    pub fn with_zone(mut self, zone_id: impl Into<String>) -> Self {
        self.zone_id = Some(zone_id.into());
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = normalize_base(api_base);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Account id and token are both present.
    pub fn is_complete(&self) -> bool {
        !self.account_id.trim().is_empty() && !self.api_token.trim().is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

fn first_error_message(body: &str) -> Option<String> {
    let envelope: Envelope<serde_json::Value> = serde_json::from_str(body).ok()?;
    envelope.errors.into_iter().next().map(|e| e.message)
}

#[derive(Clone)]
pub struct CloudflareClient {
    config: CloudflareConfig,
    client: Client,
}

impl CloudflareClient {
    pub fn new(config: CloudflareConfig) -> Result<Self> {
        if !config.is_complete() {
            return Err(PlatformError::Config(
                "Configuration Cloudflare manquante (account_id, api_token)".to_string(),
            ));
        }
        let client = build_client(config.timeout)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &CloudflareConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", normalize_base(self.config.api_base.clone()), path)
    }

    fn account_url(&self, path: &str) -> String {
        self.url(&format!("/accounts/{}{}", self.config.account_id, path))
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.config.api_token)
    }

    /// Send a request and check the envelope's `success` flag.
    async fn envelope<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Envelope<T>> {
        let response = self.authed(request).send().await?;
        let response = check_status_with(PLATFORM, response, first_error_message).await?;
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| PlatformError::InvalidResponse(format!("{}: {}", PLATFORM, e)))?;

        if !envelope.success {
            let message = envelope
                .errors
                .into_iter()
                .next()
                .map(|e| e.message)
                .unwrap_or_else(|| "request unsuccessful".to_string());
            return Err(PlatformError::Api {
                platform: PLATFORM,
                status: 200,
                message,
            });
        }
        Ok(envelope)
    }

    /// Send a request and unwrap the envelope's `result`.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.envelope(request)
            .await?
            .result
            .ok_or_else(|| PlatformError::InvalidResponse("cloudflare: missing result".to_string()))
    }

    /// Send a request whose `result` is irrelevant; `null` is accepted.
    async fn send_unit(&self, request: RequestBuilder) -> Result<()> {
        self.envelope::<serde_json::Value>(request).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_config_rejected() {
        let err = CloudflareClient::new(CloudflareConfig::new("", "token")).err().unwrap();
        assert!(matches!(err, PlatformError::Config(_)));
    }

    #[test]
    fn test_first_error_message() {
        let body = r#"{"success":false,"errors":[{"code":8000007,"message":"Project not found"}],"result":null}"#;
        assert_eq!(first_error_message(body).as_deref(), Some("Project not found"));
        assert_eq!(first_error_message("oops"), None);
    }

    #[test]
    fn test_account_url() {
        let client = CloudflareClient::new(
            CloudflareConfig::new("acc", "tok").with_api_base("http://127.0.0.1:1/"),
        )
        .unwrap();
        assert_eq!(
            client.account_url("/pages/projects"),
            "http://127.0.0.1:1/accounts/acc/pages/projects"
        );
    }
}

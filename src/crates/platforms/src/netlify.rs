//! Netlify REST client.
//!
//! Only the handful of calls the mockup stage needs: create a site, push a zipped build
//! to it, list sites for TTL cleanup and delete them.

use crate::error::{PlatformError, Result};
use crate::http::{build_client, check_status, normalize_base, parse_json};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PLATFORM: &str = "netlify";

/// Default public API root.
pub const DEFAULT_API_BASE: &str = "https://api.netlify.com/api/v1";

/// Netlify client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetlifyConfig {
    pub api_token: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl NetlifyConfig {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = normalize_base(api_base);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A Netlify site as returned by `/sites`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetlifySite {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub ssl_url: Option<String>,
    #[serde(default)]
    pub admin_url: Option<String>,
    #[serde(default)]
    pub screenshot_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A deploy created from a zip upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetlifyDeploy {
    pub id: String,
    #[serde(default)]
    pub site_id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub ssl_url: Option<String>,
    #[serde(default)]
    pub deploy_ssl_url: Option<String>,
    #[serde(default)]
    pub screenshot_url: Option<String>,
}

impl NetlifyDeploy {
    /// Best public URL for the deploy.
    pub fn public_url(&self) -> Option<&str> {
        self.ssl_url
            .as_deref()
            .or(self.url.as_deref())
            .or(self.deploy_ssl_url.as_deref())
    }
}

#[derive(Debug, Serialize)]
struct CreateSiteBody<'a> {
    name: &'a str,
    custom_domain: Option<String>,
}

/// Netlify API client.
#[derive(Clone)]
pub struct NetlifyClient {
    config: NetlifyConfig,
    client: Client,
}

impl NetlifyClient {
    pub fn new(config: NetlifyConfig) -> Result<Self> {
        if config.api_token.trim().is_empty() {
            return Err(PlatformError::Config("Netlify API token is empty".to_string()));
        }
        let client = build_client(config.timeout)?;
        let config = NetlifyConfig {
            api_base: normalize_base(config.api_base.clone()),
            ..config
        };
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base, path)
    }

    /// Create an empty site named `name`.
    pub async fn create_site(&self, name: &str) -> Result<NetlifySite> {
        tracing::debug!(site = name, "Creating Netlify site");
        let response = self
            .client
            .post(self.url("/sites"))
            .bearer_auth(&self.config.api_token)
            .json(&CreateSiteBody {
                name,
                custom_domain: None,
            })
            .send()
            .await?;
        let response = check_status(PLATFORM, response).await?;
        parse_json(PLATFORM, response).await
    }

    /// Deploy a zip archive of a built site.
    pub async fn deploy_zip(&self, site_id: &str, archive: Vec<u8>) -> Result<NetlifyDeploy> {
        tracing::debug!(site_id, bytes = archive.len(), "Uploading zip deploy to Netlify");
        let response = self
            .client
            .post(self.url(&format!("/sites/{}/deploys", site_id)))
            .bearer_auth(&self.config.api_token)
            .header(reqwest::header::CONTENT_TYPE, "application/zip")
            .body(archive)
            .send()
            .await?;
        let response = check_status(PLATFORM, response).await?;
        parse_json(PLATFORM, response).await
    }

    /// List all sites on the account.
    pub async fn list_sites(&self) -> Result<Vec<NetlifySite>> {
        let response = self
            .client
            .get(self.url("/sites"))
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;
        let response = check_status(PLATFORM, response).await?;
        parse_json(PLATFORM, response).await
    }

    /// Delete a site. Missing sites are treated as already deleted.
    pub async fn delete_site(&self, site_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/sites/{}", site_id)))
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;
        match check_status(PLATFORM, response).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }
}

//! Sanity management and data API client.
//!
//! Management calls (projects, tokens, webhooks) go to `api.sanity.io` with the
//! management token. Document writes go to the per-project data host
//! `https://{projectId}.api.sanity.io` with the project token.

use crate::error::{PlatformError, Result};
use crate::http::{build_client, check_status, normalize_base, parse_json};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

const PLATFORM: &str = "sanity";
const MANAGEMENT_VERSION: &str = "v2021-06-07";
const QUERY_VERSION: &str = "v2021-10-21";

/// Default management API root.
pub const DEFAULT_API_BASE: &str = "https://api.sanity.io";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanityConfig {
    pub management_token: String,
    pub organization_id: Option<String>,
    pub api_base: String,
    /// Overrides `https://{projectId}.api.sanity.io` for document calls.
    pub data_api_base: Option<String>,
    pub timeout: Duration,
}

impl SanityConfig {
    pub fn new(management_token: impl Into<String>) -> Self {
        Self {
            management_token: management_token.into(),
            organization_id: None,
            api_base: DEFAULT_API_BASE.to_string(),
            data_api_base: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = normalize_base(api_base);
        self
    }

    pub fn with_data_api_base(mut self, data_api_base: impl Into<String>) -> Self {
        self.data_api_base = Some(normalize_base(data_api_base));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanityProject {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub studio_host: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanityToken {
    #[serde(default)]
    pub id: Option<String>,
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdOnly {
    id: String,
}

/// Outcome of a mutate call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResult {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub results: Vec<Value>,
}

#[derive(Clone)]
pub struct SanityClient {
    config: SanityConfig,
    client: Client,
}

impl SanityClient {
    pub fn new(config: SanityConfig) -> Result<Self> {
        if config.management_token.trim().is_empty() {
            return Err(PlatformError::Config("Sanity management token is empty".to_string()));
        }
        let client = build_client(config.timeout)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &SanityConfig {
        &self.config
    }

    fn management_url(&self, path: &str) -> String {
        format!("{}/{}{}", normalize_base(self.config.api_base.clone()), MANAGEMENT_VERSION, path)
    }

    fn data_host(&self, project_id: &str) -> String {
        match &self.config.data_api_base {
            Some(base) => base.clone(),
            None => format!("https://{}.api.sanity.io", project_id),
        }
    }

    /// Create a project under the configured organization.
    pub async fn create_project(&self, display_name: &str, metadata: Value) -> Result<SanityProject> {
        let body = json!({
            "displayName": display_name,
            "organizationId": self.config.organization_id,
            "metadata": metadata,
        });

        let response = self
            .client
            .post(self.management_url("/projects"))
            .bearer_auth(&self.config.management_token)
            .json(&body)
            .send()
            .await?;
        let response = check_status(PLATFORM, response).await?;
        parse_json(PLATFORM, response).await
    }

    pub async fn get_project(&self, project_id: &str) -> Result<SanityProject> {
        let response = self
            .client
            .get(self.management_url(&format!("/projects/{}", project_id)))
            .bearer_auth(&self.config.management_token)
            .send()
            .await?;
        let response = check_status(PLATFORM, response).await?;
        parse_json(PLATFORM, response).await
    }

    pub async fn delete_project(&self, project_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.management_url(&format!("/projects/{}", project_id)))
            .bearer_auth(&self.config.management_token)
            .send()
            .await?;
        check_status(PLATFORM, response).await?;
        Ok(())
    }

    /// Create a robot token with a single permission role (`editor`, `viewer`, ...).
    pub async fn create_token(&self, project_id: &str, label: &str, permission: &str) -> Result<SanityToken> {
        let body = json!({
            "label": label,
            "permissions": [permission],
        });

        let response = self
            .client
            .post(self.management_url(&format!("/projects/{}/tokens", project_id)))
            .bearer_auth(&self.config.management_token)
            .json(&body)
            .send()
            .await?;
        let response = check_status(PLATFORM, response).await?;
        parse_json(PLATFORM, response).await
    }

    /// Register a document webhook and return its id.
    pub async fn create_webhook(&self, project_id: &str, url: &str) -> Result<String> {
        let body = json!({
            "url": url,
            "description": format!("AWEMA Auto Sync - {}", url),
            "httpMethod": "POST",
            "apiVersion": "2023-01-01",
        });

        let response = self
            .client
            .post(self.management_url(&format!("/projects/{}/hooks", project_id)))
            .bearer_auth(&self.config.management_token)
            .json(&body)
            .send()
            .await?;
        let response = check_status(PLATFORM, response).await?;
        let hook: IdOnly = parse_json(PLATFORM, response).await?;
        Ok(hook.id)
    }

    /// Apply a batch of mutations (`createOrReplace`, `patch`, `delete`, ...).
    pub async fn mutate(
        &self,
        project_id: &str,
        dataset: &str,
        token: &str,
        mutations: Vec<Value>,
    ) -> Result<MutationResult> {
        let url = format!(
            "{}/{}/data/mutate/{}",
            self.data_host(project_id),
            MANAGEMENT_VERSION,
            dataset
        );
        tracing::debug!(project_id, dataset, count = mutations.len(), "Sanity mutate");

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "mutations": mutations }))
            .send()
            .await?;
        let response = check_status(PLATFORM, response).await?;
        parse_json(PLATFORM, response).await
    }

    /// Run a GROQ query and return the `result` field.
    pub async fn query(&self, project_id: &str, dataset: &str, token: &str, groq: &str) -> Result<Value> {
        let url = format!(
            "{}/{}/data/query/{}",
            self.data_host(project_id),
            QUERY_VERSION,
            dataset
        );
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&[("query", groq)])
            .send()
            .await?;
        let response = check_status(PLATFORM, response).await?;
        let body: Value = parse_json(PLATFORM, response).await?;
        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let client = SanityClient::new(SanityConfig::new("tok").with_api_base("http://localhost:9999/")).unwrap();
        assert_eq!(client.management_url("/projects"), "http://localhost:9999/v2021-06-07/projects");
        assert_eq!(client.data_host("abc123"), "https://abc123.api.sanity.io");
    }

    #[test]
    fn test_project_deserialization() {
        let project: SanityProject = serde_json::from_value(json!({
            "id": "p1",
            "displayName": "Dupont Plomberie - plombier",
            "organizationId": "org"
        }))
        .unwrap();
        assert_eq!(project.id, "p1");
        assert_eq!(project.display_name.as_deref(), Some("Dupont Plomberie - plombier"));
    }
}

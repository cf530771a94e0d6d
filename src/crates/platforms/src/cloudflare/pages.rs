//! Cloudflare Pages: projects, direct-upload deployments and project domains.

use super::CloudflareClient;
use crate::error::{PlatformError, Result};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvVar {
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesBuildConfig {
    pub build_command: String,
    pub build_output_directory: String,
    pub root_dir: String,
    pub web_analytics_tag: Option<String>,
    pub web_analytics_token: Option<String>,
}

impl Default for PagesBuildConfig {
    fn default() -> Self {
        Self {
            build_command: "npm run build".to_string(),
            build_output_directory: "dist".to_string(),
            root_dir: "/".to_string(),
            web_analytics_tag: None,
            web_analytics_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionDeploymentConfig {
    pub environment_variables: HashMap<String, EnvVar>,
    pub compatibility_date: String,
    pub compatibility_flags: Vec<String>,
    pub fail_open: bool,
    pub always_use_latest_compatibility_date: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfigs {
    pub production: ProductionDeploymentConfig,
}

/// Body of `POST /pages/projects`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesProjectConfig {
    pub name: String,
    pub production_branch: String,
    pub build_config: PagesBuildConfig,
    pub deployment_configs: DeploymentConfigs,
}

impl PagesProjectConfig {
    /// Project on `main`, building `dist` with `nodejs_compat`.
    pub fn new(name: impl Into<String>, env: HashMap<String, String>) -> Self {
        let environment_variables = env
            .into_iter()
            .map(|(k, v)| (k, EnvVar { value: v }))
            .collect();

        Self {
            name: name.into(),
            production_branch: "main".to_string(),
            build_config: PagesBuildConfig::default(),
            deployment_configs: DeploymentConfigs {
                production: ProductionDeploymentConfig {
                    environment_variables,
                    compatibility_date: "2023-10-30".to_string(),
                    compatibility_flags: vec!["nodejs_compat".to_string()],
                    fail_open: true,
                    always_use_latest_compatibility_date: false,
                },
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesProject {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub subdomain: Option<String>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub created_on: Option<String>,
    #[serde(default)]
    pub production_branch: Option<String>,
    #[serde(default)]
    pub latest_deployment: Option<PagesDeployment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentStage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub started_on: Option<String>,
    #[serde(default)]
    pub ended_on: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesDeployment {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub created_on: Option<String>,
    #[serde(default)]
    pub modified_on: Option<String>,
    #[serde(default)]
    pub latest_stage: Option<DeploymentStage>,
    #[serde(default)]
    pub stages: Vec<DeploymentStage>,
}

impl PagesDeployment {
    /// `latest_stage.status`, or `unknown`.
    pub fn stage_status(&self) -> &str {
        self.latest_stage
            .as_ref()
            .map(|s| s.status.as_str())
            .unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesDomain {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_on: Option<String>,
}

/// One file of a direct upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub path: String,
    pub content: Vec<u8>,
    pub mime: String,
}

impl UploadFile {
    pub fn new(path: impl Into<String>, content: Vec<u8>) -> Self {
        let path = path.into();
        let mime = mime_type(&path).to_string();
        Self { path, content, mime }
    }
}

/// MIME type from the file extension.
pub fn mime_type(path: &str) -> &'static str {
    let ext = path
        .rsplit('.')
        .next()
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "html" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "txt" => "text/plain",
        "md" => "text/markdown",
        _ => "application/octet-stream",
    }
}

impl CloudflareClient {
    pub async fn get_project(&self, name: &str) -> Result<PagesProject> {
        self.send(self.client.get(self.account_url(&format!("/pages/projects/{}", name))))
            .await
    }

    pub async fn create_project(&self, config: &PagesProjectConfig) -> Result<PagesProject> {
        self.send(self.client.post(self.account_url("/pages/projects")).json(config))
            .await
    }

    /// Existing project, or a new one created from `config`.
    pub async fn ensure_project(&self, config: &PagesProjectConfig) -> Result<PagesProject> {
        match self.get_project(&config.name).await {
            Ok(project) => {
                tracing::debug!(project = %config.name, "Pages project already exists");
                Ok(project)
            }
            Err(e) if e.is_not_found() => self.create_project(config).await,
            Err(e) => Err(e),
        }
    }

    pub async fn list_projects(&self) -> Result<Vec<PagesProject>> {
        self.send(self.client.get(self.account_url("/pages/projects")))
            .await
    }

    pub async fn delete_project(&self, name: &str) -> Result<()> {
        self.send_unit(self.client.delete(self.account_url(&format!("/pages/projects/{}", name))))
            .await
    }

    /// Direct upload: one multipart `files` part per file.
    pub async fn upload_deployment(&self, project: &str, files: Vec<UploadFile>) -> Result<PagesDeployment> {
        if files.is_empty() {
            return Err(PlatformError::Config("no files to upload".to_string()));
        }

        let mut form = Form::new();
        for file in files {
            let part = Part::bytes(file.content)
                .file_name(file.path)
                .mime_str(&file.mime)?;
            form = form.part("files", part);
        }

        self.send(
            self.client
                .post(self.account_url(&format!("/pages/projects/{}/deployments", project)))
                .multipart(form),
        )
        .await
    }

    pub async fn get_deployment(&self, project: &str, deployment_id: &str) -> Result<PagesDeployment> {
        self.send(self.client.get(self.account_url(&format!(
            "/pages/projects/{}/deployments/{}",
            project, deployment_id
        ))))
        .await
    }

    pub async fn list_deployments(&self, project: &str, per_page: u32) -> Result<Vec<PagesDeployment>> {
        self.send(
            self.client
                .get(self.account_url(&format!("/pages/projects/{}/deployments", project)))
                .query(&[("per_page", per_page)]),
        )
        .await
    }

    pub async fn purge_build_cache(&self, project: &str) -> Result<()> {
        self.send_unit(
            self.client
                .post(self.account_url(&format!("/pages/projects/{}/purge_build_cache", project))),
        )
        .await
    }

    pub async fn add_project_domain(&self, project: &str, domain: &str) -> Result<PagesDomain> {
        self.send(
            self.client
                .post(self.account_url(&format!("/pages/projects/{}/domains", project)))
                .json(&json!({ "name": domain })),
        )
        .await
    }

    pub async fn remove_project_domain(&self, project: &str, domain: &str) -> Result<()> {
        self.send_unit(
            self.client
                .delete(self.account_url(&format!("/pages/projects/{}/domains/{}", project, domain))),
        )
        .await
    }

    pub async fn list_project_domains(&self, project: &str) -> Result<Vec<PagesDomain>> {
        self.send(
            self.client
                .get(self.account_url(&format!("/pages/projects/{}/domains", project))),
        )
        .await
    }

    /// Raw `result` of an arbitrary account-scoped GET.
    pub async fn account_get(&self, path: &str) -> Result<Value> {
        self.send(self.client.get(self.account_url(path))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type("index.html"), "text/html");
        assert_eq!(mime_type("assets/app.JS"), "application/javascript");
        assert_eq!(mime_type("images/photo.jpeg"), "image/jpeg");
        assert_eq!(mime_type("fonts/inter.woff2"), "application/octet-stream");
        assert_eq!(mime_type("LICENSE"), "application/octet-stream");
    }

    #[test]
    fn test_project_config_shape() {
        let mut env = HashMap::new();
        env.insert("NODE_ENV".to_string(), "production".to_string());
        let config = PagesProjectConfig::new("dupont-plomberie-123456", env);
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(json["production_branch"], "main");
        assert_eq!(json["build_config"]["build_output_directory"], "dist");
        assert_eq!(
            json["deployment_configs"]["production"]["environment_variables"]["NODE_ENV"]["value"],
            "production"
        );
        assert_eq!(
            json["deployment_configs"]["production"]["compatibility_flags"][0],
            "nodejs_compat"
        );
    }

    #[test]
    fn test_stage_status_default() {
        let deployment: PagesDeployment = serde_json::from_value(json!({ "id": "d1" })).unwrap();
        assert_eq!(deployment.stage_status(), "unknown");
    }
}

//! Cloudflare Pages deployment of a built site.

use crate::config::CloudflareSettings;
use crate::domain::Workflow;
use crate::retry::{retry_with_backoff, RetryConfig};
use crate::{PipelineError, Result};
use chrono::{DateTime, Utc};
use platforms::cloudflare::{NewDnsRecord, PagesDeployment, PagesProject, PagesProjectConfig, UploadFile};
use platforms::CloudflareClient;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use walkdir::WalkDir;

const DEFAULT_PRIMARY: &str = "#0066CC";
const DEFAULT_SECONDARY: &str = "#00AA00";
const SANITY_API_VERSION: &str = "2023-05-03";

/// Directories never uploaded
const SKIPPED_DIRS: [&str; 4] = ["node_modules", ".git", ".astro", ".github"];

/// Business data the deployment needs, as posted by the dashboard or taken from a
/// workflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteInfo {
    pub workflow_id: Option<String>,
    pub business_name: String,
    pub business_type: String,
    #[serde(alias = "telephone")]
    pub phone: String,
    pub email: String,
    #[serde(alias = "adresse")]
    pub address: String,
    #[serde(alias = "ville")]
    pub city: String,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    #[serde(alias = "domain")]
    pub custom_domain: Option<String>,
}

impl SiteInfo {
    pub fn from_workflow(workflow: &Workflow) -> Self {
        let client = &workflow.client;
        Self {
            workflow_id: Some(workflow.id.clone()),
            business_name: client.business_name.clone(),
            business_type: client.business_type.clone(),
            phone: client.telephone.clone(),
            email: client.email.clone(),
            address: client.adresse.clone(),
            city: client.ville.clone(),
            primary_color: client.primary_color().map(str::to_string),
            secondary_color: client.secondary_color().map(str::to_string),
            custom_domain: client.custom_domain().map(str::to_string),
        }
    }
}

/// Sanity project the site reads from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SanityDeployConfig {
    pub project_id: String,
    pub dataset: Option<String>,
    pub api_version: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub site: SiteInfo,
    /// Directory whose files are uploaded as the site root
    pub output_dir: PathBuf,
    pub sanity: Option<SanityDeployConfig>,
}

/// Result of the HEAD request made right after deploying
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    /// `healthy`, `unhealthy` or `error`
    pub status: String,
    pub status_code: Option<u16>,
    pub response_time_ms: u64,
    pub ssl: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    pub success: bool,
    pub project_id: Option<String>,
    pub project_name: String,
    pub deployment_id: Option<String>,
    pub url: Option<String>,
    pub custom_domain: Option<String>,
    /// Upload duration
    pub build_time_ms: u64,
    pub deploy_time_ms: u64,
    pub files_uploaded: usize,
    pub performance: Option<HealthSnapshot>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeploymentResult {
    pub fn failed(project_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            project_id: None,
            project_name: project_name.into(),
            deployment_id: None,
            url: None,
            custom_domain: None,
            build_time_ms: 0,
            deploy_time_ms: 0,
            files_uploaded: 0,
            performance: None,
            created_at: Utc::now(),
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSummary {
    pub id: String,
    pub stage: String,
    pub url: Option<String>,
    pub created_on: Option<String>,
}

/// Metrics computed from the latest deployments of a project
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentAnalytics {
    pub project_name: String,
    pub period: String,
    pub total_deployments: usize,
    pub successful_deployments: usize,
    pub failed_deployments: usize,
    /// Percentage
    pub success_rate: f64,
    /// Seconds, over successful deployments
    pub average_build_time: u64,
    pub last_deployment: Option<DeploymentSummary>,
    pub recent_deployments: Vec<DeploymentSummary>,
}

struct DomainOutcome {
    url: String,
    custom_domain: Option<String>,
}

/// `{slug}-{last 6 digits of the millisecond timestamp}`
pub fn project_name(business_name: &str, now_ms: i64) -> String {
    let mut slug = utils::slugify(business_name, 51);
    if slug.is_empty() {
        slug = "site".to_string();
    }
    let ts = now_ms.to_string();
    let suffix = &ts[ts.len().saturating_sub(6)..];
    format!("{}-{}", slug, suffix)
}

/// Build-time variables of the Pages project
pub fn environment_variables(site: &SiteInfo, sanity: Option<&SanityDeployConfig>) -> HashMap<String, String> {
    let mut env = HashMap::new();
    if let Some(sanity) = sanity {
        env.insert("SANITY_PROJECT_ID".to_string(), sanity.project_id.clone());
        env.insert(
            "SANITY_DATASET".to_string(),
            sanity.dataset.clone().unwrap_or_else(|| "production".to_string()),
        );
        env.insert(
            "SANITY_API_VERSION".to_string(),
            sanity
                .api_version
                .clone()
                .unwrap_or_else(|| SANITY_API_VERSION.to_string()),
        );
    }
    env.insert("PUBLIC_BUSINESS_NAME".to_string(), site.business_name.clone());
    env.insert("PUBLIC_BUSINESS_TYPE".to_string(), site.business_type.clone());
    env.insert("PUBLIC_BUSINESS_PHONE".to_string(), site.phone.clone());
    env.insert("PUBLIC_BUSINESS_EMAIL".to_string(), site.email.clone());
    env.insert("PUBLIC_BUSINESS_ADDRESS".to_string(), site.address.clone());
    env.insert("PUBLIC_BUSINESS_CITY".to_string(), site.city.clone());
    env.insert(
        "PUBLIC_PRIMARY_COLOR".to_string(),
        site.primary_color.clone().unwrap_or_else(|| DEFAULT_PRIMARY.to_string()),
    );
    env.insert(
        "PUBLIC_SECONDARY_COLOR".to_string(),
        site.secondary_color.clone().unwrap_or_else(|| DEFAULT_SECONDARY.to_string()),
    );
    env.insert("NODE_ENV".to_string(), "production".to_string());
    env
}

/// Every uploadable file under `root`, keyed by its `/`-separated relative path
pub async fn collect_files(root: &Path) -> Result<Vec<UploadFile>> {
    if !root.is_dir() {
        return Err(PipelineError::NotFound(format!(
            "dossier à déployer introuvable: {}",
            root.display()
        )));
    }

    let mut paths = Vec::new();
    let walker = WalkDir::new(root).min_depth(1).into_iter().filter_entry(|e| {
        !(e.file_type().is_dir()
            && e.file_name()
                .to_str()
                .map(|name| SKIPPED_DIRS.contains(&name))
                .unwrap_or(false))
    });
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| PipelineError::General(e.to_string()))?
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        paths.push((relative, entry.into_path()));
    }
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for (relative, path) in paths {
        let content = tokio::fs::read(&path).await?;
        files.push(UploadFile::new(relative, content));
    }
    Ok(files)
}

pub struct CloudflareDeployer {
    client: CloudflareClient,
    http: reqwest::Client,
    retry: RetryConfig,
    subdomain_root: String,
}

impl CloudflareDeployer {
    /// Fails with a configuration error when the account id or token is missing
    pub fn new(settings: &CloudflareSettings, retry: RetryConfig) -> Result<Self> {
        let client = CloudflareClient::new(settings.client_config())?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| PipelineError::Platform(e.into()))?;
        Ok(Self {
            client,
            http,
            retry,
            subdomain_root: settings.subdomain_root.clone(),
        })
    }

    pub fn client(&self) -> &CloudflareClient {
        &self.client
    }

    /// Create the Pages project if needed, upload the files, attach a domain and
    /// health-check the result
    pub async fn deploy(&self, request: &DeploymentRequest) -> Result<DeploymentResult> {
        let started = Instant::now();
        let site = &request.site;
        if site.business_name.trim().is_empty() {
            return Err(PipelineError::Validation("businessName requis".to_string()));
        }

        let name = project_name(&site.business_name, Utc::now().timestamp_millis());
        info!(
            workflow_id = ?site.workflow_id,
            project = %name,
            output = %request.output_dir.display(),
            "Deploying to Cloudflare Pages"
        );

        let env = environment_variables(site, request.sanity.as_ref());
        let config = PagesProjectConfig::new(&name, env);
        let client = &self.client;
        let project = retry_with_backoff(&self.retry, "cloudflare_ensure_project", || async {
            Ok(client.ensure_project(&config).await?)
        })
        .await?;

        let files = collect_files(&request.output_dir).await?;
        let files_uploaded = files.len();
        let upload_started = Instant::now();
        let project_ref = project.name.as_str();
        let deployment = retry_with_backoff(&self.retry, "cloudflare_upload", || {
            let files = files.clone();
            async move { Ok(client.upload_deployment(project_ref, files).await?) }
        })
        .await?;
        let build_time_ms = upload_started.elapsed().as_millis() as u64;

        let domain = self.configure_domain(&project, site).await;
        let performance = self.health_check(&domain.url).await;

        let result = DeploymentResult {
            success: true,
            project_id: project.id.clone(),
            project_name: project.name.clone(),
            deployment_id: Some(deployment.id.clone()),
            url: Some(domain.url),
            custom_domain: domain.custom_domain,
            build_time_ms,
            deploy_time_ms: started.elapsed().as_millis() as u64,
            files_uploaded,
            performance: Some(performance),
            created_at: Utc::now(),
            error: None,
        };
        info!(
            project = %result.project_name,
            deployment_id = ?result.deployment_id,
            url = ?result.url,
            files = files_uploaded,
            "Cloudflare deployment finished"
        );
        Ok(result)
    }

    /// Custom domain, else a subdomain when a zone is configured, else `pages.dev`
    async fn configure_domain(&self, project: &PagesProject, site: &SiteInfo) -> DomainOutcome {
        let default_url = format!("https://{}.pages.dev", project.name);

        if let Some(domain) = site.custom_domain.as_deref().filter(|d| !d.trim().is_empty()) {
            match self.client.add_project_domain(&project.name, domain).await {
                Ok(_) => {
                    return DomainOutcome {
                        url: format!("https://{}", domain),
                        custom_domain: Some(domain.to_string()),
                    }
                }
                Err(e) => warn!(domain = %domain, error = %e, "Custom domain failed, falling back"),
            }
        }

        if let Some(zone_id) = self.client.config().zone_id.clone() {
            let subdomain = format!(
                "{}.{}",
                utils::slugify(&site.business_name, 50),
                self.subdomain_root
            );
            let record = NewDnsRecord::cname(&subdomain, format!("{}.pages.dev", project.name));
            let created = async {
                self.client.create_dns_record(&zone_id, &record).await?;
                self.client.add_project_domain(&project.name, &subdomain).await?;
                Ok::<_, platforms::PlatformError>(())
            };
            match created.await {
                Ok(()) => {
                    return DomainOutcome {
                        url: format!("https://{}", subdomain),
                        custom_domain: Some(subdomain),
                    }
                }
                Err(e) => warn!(subdomain = %subdomain, error = %e, "Subdomain failed, using pages.dev"),
            }
        }

        DomainOutcome {
            url: default_url,
            custom_domain: None,
        }
    }

    async fn health_check(&self, url: &str) -> HealthSnapshot {
        let started = Instant::now();
        match self.http.head(url).send().await {
            Ok(response) => HealthSnapshot {
                status: if response.status().is_success() {
                    "healthy".to_string()
                } else {
                    "unhealthy".to_string()
                },
                status_code: Some(response.status().as_u16()),
                response_time_ms: started.elapsed().as_millis() as u64,
                ssl: url.starts_with("https://"),
                error: None,
            },
            Err(e) => HealthSnapshot {
                status: "error".to_string(),
                status_code: None,
                response_time_ms: started.elapsed().as_millis() as u64,
                ssl: url.starts_with("https://"),
                error: Some(e.to_string()),
            },
        }
    }

    pub async fn deployment_status(&self, project: &str, deployment_id: &str) -> Result<PagesDeployment> {
        Ok(self.client.get_deployment(project, deployment_id).await?)
    }

    pub async fn project(&self, project: &str) -> Result<PagesProject> {
        Ok(self.client.get_project(project).await?)
    }

    pub async fn list_projects(&self) -> Result<Vec<PagesProject>> {
        Ok(self.client.list_projects().await?)
    }

    pub async fn purge_cache(&self, project: &str) -> Result<()> {
        info!(project = %project, "Purging Pages build cache");
        Ok(self.client.purge_build_cache(project).await?)
    }

    pub async fn delete_project(&self, project: &str) -> Result<()> {
        info!(project = %project, "Deleting Pages project");
        Ok(self.client.delete_project(project).await?)
    }

    /// Success rate and build times over the last 20 deployments
    pub async fn deployment_analytics(&self, project: &str, period: &str) -> Result<DeploymentAnalytics> {
        self.client.get_project(project).await?;
        let deployments = self.client.list_deployments(project, 20).await?;
        Ok(analytics_from(project, period, &deployments))
    }
}

fn summary(deployment: &PagesDeployment) -> DeploymentSummary {
    DeploymentSummary {
        id: deployment.id.clone(),
        stage: deployment.stage_status().to_string(),
        url: deployment.url.clone(),
        created_on: deployment.created_on.clone(),
    }
}

fn analytics_from(project: &str, period: &str, deployments: &[PagesDeployment]) -> DeploymentAnalytics {
    let successful: Vec<&PagesDeployment> = deployments
        .iter()
        .filter(|d| d.stage_status() == "success")
        .collect();
    let failed = deployments
        .iter()
        .filter(|d| d.stage_status() == "failure")
        .count();

    let build_times: Vec<i64> = successful
        .iter()
        .filter_map(|d| {
            let start = DateTime::parse_from_rfc3339(d.created_on.as_deref()?).ok()?;
            let end = DateTime::parse_from_rfc3339(d.modified_on.as_deref()?).ok()?;
            Some((end - start).num_milliseconds())
        })
        .collect();
    let average_build_time = if build_times.is_empty() {
        0
    } else {
        (build_times.iter().sum::<i64>() / build_times.len() as i64 / 1000).max(0) as u64
    };
    let success_rate = if deployments.is_empty() {
        0.0
    } else {
        (successful.len() as f64 / deployments.len() as f64 * 1000.0).round() / 10.0
    };

    DeploymentAnalytics {
        project_name: project.to_string(),
        period: period.to_string(),
        total_deployments: deployments.len(),
        successful_deployments: successful.len(),
        failed_deployments: failed,
        success_rate,
        average_build_time,
        last_deployment: deployments.first().map(summary),
        recent_deployments: deployments.iter().take(10).map(summary).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(server: &MockServer, zone: Option<&str>) -> CloudflareSettings {
        CloudflareSettings {
            account_id: "acc".to_string(),
            api_token: "token".to_string(),
            zone_id: zone.map(str::to_string),
            api_base: server.uri(),
            ..Default::default()
        }
    }

    fn ok(result: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "success": true, "errors": [], "result": result }))
    }

    #[test]
    fn test_project_name() {
        assert_eq!(project_name("Plomberie Dupont & Fils", 1_700_000_123_456), "plomberie-dupont-fils-123456");
        assert_eq!(project_name("!!!", 42), "site-42");
    }

    #[test]
    fn test_environment_defaults() {
        let site = SiteInfo {
            business_name: "Dupont".to_string(),
            ..Default::default()
        };
        let env = environment_variables(
            &site,
            Some(&SanityDeployConfig {
                project_id: "abc".to_string(),
                ..Default::default()
            }),
        );
        assert_eq!(env["SANITY_DATASET"], "production");
        assert_eq!(env["SANITY_API_VERSION"], "2023-05-03");
        assert_eq!(env["PUBLIC_PRIMARY_COLOR"], "#0066CC");
        assert_eq!(env["PUBLIC_SECONDARY_COLOR"], "#00AA00");
        assert_eq!(env["NODE_ENV"], "production");
        assert!(!environment_variables(&site, None).contains_key("SANITY_PROJECT_ID"));
    }

    #[tokio::test]
    async fn test_collect_files_skips_node_modules() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        std::fs::create_dir_all(dir.path().join("node_modules/astro")).unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>x</h1>").unwrap();
        std::fs::write(dir.path().join("assets/app.css"), "body{}").unwrap();
        std::fs::write(dir.path().join("node_modules/astro/index.js"), "").unwrap();

        let files = collect_files(dir.path()).await.unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(names, vec!["assets/app.css", "index.html"]);
        assert_eq!(files[0].mime, "text/css");

        let missing = collect_files(&dir.path().join("nope")).await.unwrap_err();
        assert!(matches!(missing, PipelineError::NotFound(_)));
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let err = CloudflareDeployer::new(&CloudflareSettings::default(), RetryConfig::none()).err().unwrap();
        assert!(matches!(err, PipelineError::Platform(platforms::PlatformError::Config(_))));
    }

    #[tokio::test]
    async fn test_deploy_without_domain_uses_pages_dev() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(wiremock::matchers::path_regex(r"^/accounts/acc/pages/projects/[a-z0-9-]+$"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "success": false, "errors": [{"code": 8000007, "message": "not found"}], "result": null
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/accounts/acc/pages/projects"))
            .respond_with(ok(json!({ "id": "p1", "name": "dupont-123456" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/accounts/acc/pages/projects/dupont-123456/deployments"))
            .respond_with(ok(json!({ "id": "dep-1", "url": "https://abc.dupont-123456.pages.dev" })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>Dupont</h1>").unwrap();

        let deployer = CloudflareDeployer::new(&settings(&server, None), RetryConfig::none()).unwrap();
        let result = deployer
            .deploy(&DeploymentRequest {
                site: SiteInfo {
                    business_name: "Dupont".to_string(),
                    ..Default::default()
                },
                output_dir: dir.path().to_path_buf(),
                sanity: None,
            })
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.project_id.as_deref(), Some("p1"));
        assert_eq!(result.deployment_id.as_deref(), Some("dep-1"));
        assert_eq!(result.url.as_deref(), Some("https://dupont-123456.pages.dev"));
        assert_eq!(result.custom_domain, None);
        assert_eq!(result.files_uploaded, 1);
        assert!(result.performance.is_some());
    }

    #[tokio::test]
    async fn test_deploy_with_zone_creates_subdomain() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(wiremock::matchers::path_regex(r"^/accounts/acc/pages/projects/[a-z0-9-]+$"))
            .respond_with(ok(json!({ "id": "p2", "name": "martin-elec-000001" })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/accounts/acc/pages/projects/martin-elec-000001/deployments"))
            .respond_with(ok(json!({ "id": "dep-2" })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/zones/zone-1/dns_records"))
            .respond_with(ok(json!({
                "id": "rec-1", "type": "CNAME", "name": "martin-elec.awema.fr",
                "content": "martin-elec-000001.pages.dev"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/accounts/acc/pages/projects/martin-elec-000001/domains"))
            .respond_with(ok(json!({ "name": "martin-elec.awema.fr", "status": "pending" })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "ok").unwrap();

        let deployer = CloudflareDeployer::new(&settings(&server, Some("zone-1")), RetryConfig::none()).unwrap();
        let result = deployer
            .deploy(&DeploymentRequest {
                site: SiteInfo {
                    business_name: "Martin Élec".to_string(),
                    ..Default::default()
                },
                output_dir: dir.path().to_path_buf(),
                sanity: None,
            })
            .await
            .unwrap();

        assert_eq!(result.custom_domain.as_deref(), Some("martin-elec.awema.fr"));
        assert_eq!(result.url.as_deref(), Some("https://martin-elec.awema.fr"));
    }

    #[test]
    fn test_analytics_from_deployments() {
        let deployments: Vec<PagesDeployment> = serde_json::from_value(json!([
            {
                "id": "d3",
                "created_on": "2024-05-01T10:00:00Z",
                "modified_on": "2024-05-01T10:01:00Z",
                "latest_stage": { "name": "deploy", "status": "success" }
            },
            {
                "id": "d2",
                "created_on": "2024-04-30T10:00:00Z",
                "modified_on": "2024-04-30T10:00:30Z",
                "latest_stage": { "name": "deploy", "status": "success" }
            },
            { "id": "d1", "latest_stage": { "name": "build", "status": "failure" } }
        ]))
        .unwrap();

        let analytics = analytics_from("dupont", "7d", &deployments);
        assert_eq!(analytics.total_deployments, 3);
        assert_eq!(analytics.successful_deployments, 2);
        assert_eq!(analytics.failed_deployments, 1);
        assert_eq!(analytics.success_rate, 66.7);
        assert_eq!(analytics.average_build_time, 45);
        assert_eq!(analytics.last_deployment.unwrap().id, "d3");
    }

    #[tokio::test]
    async fn test_purge_cache_posts_to_project() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts/acc/pages/projects/plomberie-dupont-123456/purge_build_cache"))
            .respond_with(ok(json!(null)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/accounts/acc/pages/projects/absent/purge_build_cache"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "success": false,
                "errors": [{ "code": 8000007, "message": "Project not found" }],
                "result": null
            })))
            .mount(&server)
            .await;

        let deployer = CloudflareDeployer::new(&settings(&server, None), RetryConfig::none()).unwrap();
        deployer.purge_cache("plomberie-dupont-123456").await.unwrap();
        assert!(deployer.purge_cache("absent").await.is_err());
    }
}

//! Mockup generation: render, build, zip and deploy each template on Netlify.

use super::archive::{copy_dir_all, files_with_extensions, zip_directory};
use super::builder::SiteBuilder;
use super::template::{
    basic_package_json, replacements, select_templates, MockupTemplate, BASIC_INDEX_HTML,
    BASIC_STYLESHEET,
};
use crate::catalog::colors_for_business;
use crate::config::MockupSettings;
use crate::domain::{ClientFormData, Mockup, MockupStatus};
use crate::patterns;
use crate::retry::{retry_with_backoff, RetryConfig};
use crate::{PipelineError, Result};
use chrono::{Duration as ChronoDuration, Utc};
use futures::future::join_all;
use platforms::NetlifyClient;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use utils::text::{slugify, to_base36};

/// Prefix of every Netlify site created for a mockup
pub const SITE_PREFIX: &str = "mockup-";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockupGenerationResult {
    pub success: bool,
    pub mockups: Vec<Mockup>,
    /// Seconds
    pub total_time: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

pub struct MockupGenerator {
    netlify: Option<NetlifyClient>,
    builder: Arc<dyn SiteBuilder>,
    settings: MockupSettings,
    work_dir: PathBuf,
    retry: RetryConfig,
}

impl MockupGenerator {
    pub fn new(
        netlify: Option<NetlifyClient>,
        builder: Arc<dyn SiteBuilder>,
        settings: MockupSettings,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            netlify,
            builder,
            settings,
            work_dir: work_dir.into(),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Build and deploy up to `max_mockups` templates concurrently
    ///
    /// A failing template yields a mockup in `error` state; the run succeeds when at
    /// least one mockup is ready.
    pub async fn generate(&self, workflow_id: &str, form: &ClientFormData) -> MockupGenerationResult {
        let started = Instant::now();
        let templates = select_templates(
            &form.business_type,
            &form.selected_templates,
            self.settings.max_mockups,
        );

        info!(
            workflow_id = %workflow_id,
            business = %form.business_name,
            templates = ?templates.iter().map(|t| t.name).collect::<Vec<_>>(),
            "Generating mockups"
        );

        let builds = templates.iter().map(|template| async move {
            let result = self.generate_single(form, template).await;
            (*template, result)
        });

        let mut mockups = Vec::new();
        let mut errors = Vec::new();
        for (template, result) in join_all(builds).await {
            match result {
                Ok(mockup) => {
                    info!(template = template.name, url = %mockup.netlify_url, "Mockup deployed");
                    mockups.push(mockup);
                }
                Err(e) => {
                    let message = format!("Erreur génération {}: {}", template.name, e);
                    error!(workflow_id = %workflow_id, template = template.name, error = %e, "Mockup failed");
                    mockups.push(Mockup {
                        template_name: template.name.to_string(),
                        netlify_url: String::new(),
                        preview_image: None,
                        deployment_id: None,
                        site_id: None,
                        build_status: MockupStatus::Error,
                        build_time_ms: 0,
                        error: Some(message.clone()),
                        created_at: Utc::now(),
                    });
                    errors.push(message);
                }
            }
        }

        let ready = mockups.iter().filter(|m| m.is_ready()).count();
        let total_time = started.elapsed().as_secs();
        info!(
            workflow_id = %workflow_id,
            ready = ready,
            total = mockups.len(),
            total_time_secs = total_time,
            "Mockup generation finished"
        );

        MockupGenerationResult {
            success: ready > 0,
            mockups,
            total_time,
            errors,
        }
    }

    async fn generate_single(&self, form: &ClientFormData, template: &MockupTemplate) -> Result<Mockup> {
        let netlify = self.netlify.as_ref().ok_or_else(|| {
            PipelineError::Config("NETLIFY_API_TOKEN manquant: déploiement des maquettes impossible".to_string())
        })?;

        let stamp = to_base36(Utc::now().timestamp_millis().max(0) as u64);
        let mockup_id = format!("{}-{}", template.name, stamp);
        let build_dir = self.work_dir.join("mockups").join(&mockup_id);

        let result = self
            .render_build_deploy(netlify, form, template, &build_dir, &stamp)
            .await;

        if let Err(e) = tokio::fs::remove_dir_all(&build_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(dir = %build_dir.display(), error = %e, "Failed to clean build directory");
            }
        }
        let _ = tokio::fs::remove_dir_all(build_dir.with_extension("out")).await;

        result
    }

    async fn render_build_deploy(
        &self,
        netlify: &NetlifyClient,
        form: &ClientFormData,
        template: &MockupTemplate,
        build_dir: &Path,
        stamp: &str,
    ) -> Result<Mockup> {
        let started = Instant::now();

        self.copy_template_base(template, build_dir).await?;
        inject_content(form, build_dir).await?;
        apply_business_colors(form, build_dir).await?;

        let output = self.builder.build(build_dir, template).await?;
        if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
            return Err(PipelineError::Build(format!(
                "Répertoire de sortie {} introuvable après build",
                template.output_directory
            )));
        }
        let build_time_ms = started.elapsed().as_millis() as u64;

        let archive = {
            let output = output.clone();
            tokio::task::spawn_blocking(move || zip_directory(&output))
                .await
                .map_err(|e| PipelineError::General(format!("zip task failed: {}", e)))??
        };

        let site_name = format!(
            "{}{}-{}-{}",
            SITE_PREFIX,
            slugify(&form.business_name, 24),
            template.name,
            stamp
        );

        let name = site_name.as_str();
        let site = retry_with_backoff(&self.retry, "netlify_create_site", move || async move {
            Ok(netlify.create_site(name).await?)
        })
        .await?;

        let (site_id, zip) = (site.id.as_str(), &archive);
        let deploy = retry_with_backoff(&self.retry, "netlify_deploy_zip", move || {
            let archive = zip.clone();
            async move { Ok(netlify.deploy_zip(site_id, archive).await?) }
        })
        .await?;

        let url = deploy
            .public_url()
            .map(str::to_string)
            .or_else(|| site.ssl_url.clone())
            .or_else(|| site.url.clone())
            .ok_or_else(|| PipelineError::General("Netlify n'a renvoyé aucune URL".to_string()))?;

        Ok(Mockup {
            template_name: template.name.to_string(),
            preview_image: Some(format!("{}/screenshot.png", url.trim_end_matches('/'))),
            netlify_url: url,
            deployment_id: Some(deploy.id),
            site_id: Some(site.id),
            build_status: MockupStatus::Ready,
            build_time_ms,
            error: None,
            created_at: Utc::now(),
        })
    }

    async fn copy_template_base(&self, template: &MockupTemplate, build_dir: &Path) -> Result<()> {
        let source = self.settings.templates_dir.join(template.base_directory);

        if tokio::fs::try_exists(&source).await.unwrap_or(false) {
            let dst = build_dir.to_path_buf();
            tokio::task::spawn_blocking(move || copy_dir_all(&source, &dst))
                .await
                .map_err(|e| PipelineError::General(format!("copy task failed: {}", e)))??;
            return Ok(());
        }

        warn!(template = template.name, "Template directory missing, using the basic template");
        tokio::fs::create_dir_all(build_dir).await?;
        tokio::fs::write(build_dir.join("index.html"), BASIC_INDEX_HTML).await?;
        tokio::fs::write(build_dir.join("styles.css"), BASIC_STYLESHEET).await?;
        let package = serde_json::to_vec_pretty(&basic_package_json(template))?;
        tokio::fs::write(build_dir.join("package.json"), package).await?;
        Ok(())
    }

    /// Delete mockup sites older than `ttl`, returning how many were removed
    pub async fn cleanup_expired_deployments(&self, ttl: Duration) -> Result<usize> {
        let Some(netlify) = self.netlify.as_ref() else {
            return Ok(0);
        };

        let ttl = ChronoDuration::from_std(ttl)
            .map_err(|e| PipelineError::Validation(format!("invalid ttl: {}", e)))?;
        let cutoff = Utc::now() - ttl;

        let mut removed = 0;
        for site in netlify.list_sites().await? {
            let expired = site.name.starts_with(SITE_PREFIX)
                && site.created_at.map(|at| at < cutoff).unwrap_or(false);
            if !expired {
                continue;
            }
            match netlify.delete_site(&site.id).await {
                Ok(()) => {
                    removed += 1;
                    info!(site = %site.name, "Deleted expired mockup site");
                }
                Err(e) => warn!(site = %site.name, error = %e, "Failed to delete expired mockup site"),
            }
        }
        Ok(removed)
    }

    /// Sweep expired mockup sites every `every`, first run immediately.
    /// Nothing is spawned without Netlify credentials or with a zero period.
    pub fn spawn_cleanup_sweep(self: &Arc<Self>, ttl: Duration, every: Duration) -> Option<JoinHandle<()>> {
        if self.netlify.is_none() || every.is_zero() {
            return None;
        }
        let generator = Arc::clone(self);
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match generator.cleanup_expired_deployments(ttl).await {
                    Ok(0) => debug!("No expired mockup site"),
                    Ok(removed) => info!(removed, "Expired mockup sites removed"),
                    Err(e) => warn!(error = %e, "Mockup cleanup sweep failed"),
                }
            }
        }))
    }
}

async fn inject_content(form: &ClientFormData, build_dir: &Path) -> Result<()> {
    let pairs = replacements(form);
    for path in files_with_extensions(build_dir, &["html"])? {
        let mut content = tokio::fs::read_to_string(&path).await?;
        for (placeholder, value) in &pairs {
            content = content.replace(placeholder, value);
        }
        tokio::fs::write(&path, content).await?;
    }
    Ok(())
}

async fn apply_business_colors(form: &ClientFormData, build_dir: &Path) -> Result<()> {
    let defaults = colors_for_business(&form.business_type);
    let colors = [
        (
            r"--primary-color:\s*[^;]+",
            "--primary-color",
            form.primary_color().unwrap_or(defaults.primary),
        ),
        (
            r"--secondary-color:\s*[^;]+",
            "--secondary-color",
            form.secondary_color().unwrap_or(defaults.secondary),
        ),
        (
            r"--accent-color:\s*[^;]+",
            "--accent-color",
            form.accent_color().unwrap_or(defaults.accent),
        ),
    ];

    for path in files_with_extensions(build_dir, &["css", "html"])? {
        let mut content = tokio::fs::read_to_string(&path).await?;
        for (pattern, var, value) in &colors {
            let re = patterns::regex(*pattern)?;
            content = re
                .replace_all(&content, format!("{}: {}", var, value).as_str())
                .into_owned();
        }
        tokio::fs::write(&path, content).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mockups::builder::CopyBuilder;
    use tempfile::TempDir;

    fn form() -> ClientFormData {
        ClientFormData {
            business_name: "Plomberie Dupont".to_string(),
            business_type: "plombier".to_string(),
            email: "contact@dupont.fr".to_string(),
            telephone: "0601020304".to_string(),
            ville: "Lyon".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_inject_and_colors() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("index.html"), BASIC_INDEX_HTML).await.unwrap();
        tokio::fs::write(tmp.path().join("styles.css"), BASIC_STYLESHEET).await.unwrap();

        inject_content(&form(), tmp.path()).await.unwrap();
        apply_business_colors(&form(), tmp.path()).await.unwrap();

        let html = std::fs::read_to_string(tmp.path().join("index.html")).unwrap();
        assert!(html.contains("Plomberie Dupont - Votre plombier de confiance"));
        assert!(html.contains("tel:0601020304"));
        assert!(!html.contains("{{"));

        let css = std::fs::read_to_string(tmp.path().join("styles.css")).unwrap();
        assert!(css.contains("--primary-color: #2563eb"));
        assert!(css.contains("--accent-color: #3b82f6"));
    }

    #[tokio::test]
    async fn test_without_netlify_every_mockup_fails() {
        let tmp = TempDir::new().unwrap();
        let generator = MockupGenerator::new(
            None,
            Arc::new(CopyBuilder),
            MockupSettings {
                templates_dir: tmp.path().join("templates"),
                ..Default::default()
            },
            tmp.path(),
        );

        let result = generator.generate("workflow-1", &form()).await;
        assert!(!result.success);
        assert_eq!(result.mockups.len(), 3);
        assert_eq!(result.errors.len(), 3);
        assert!(result.mockups.iter().all(|m| m.build_status == MockupStatus::Error));
    }

    fn netlify_generator(server: &wiremock::MockServer, tmp: &TempDir) -> MockupGenerator {
        let netlify = NetlifyClient::new(platforms::NetlifyConfig::new("token").with_api_base(server.uri())).unwrap();
        MockupGenerator::new(
            Some(netlify),
            Arc::new(CopyBuilder),
            MockupSettings::default(),
            tmp.path(),
        )
    }

    async fn mount_sites(server: &wiremock::MockServer) {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, ResponseTemplate};

        let old = (Utc::now() - ChronoDuration::days(10)).to_rfc3339();
        let fresh = Utc::now().to_rfc3339();
        Mock::given(method("GET"))
            .and(path("/sites"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "id": "s-old", "name": "mockup-classique-plomberie-k3j2", "created_at": old },
                { "id": "s-new", "name": "mockup-moderne-plomberie-k3j3", "created_at": fresh },
                { "id": "s-client", "name": "plomberie-dupont", "created_at": old },
            ])))
            .mount(server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/sites/s-old"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1..)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_cleanup_deletes_only_expired_mockups() {
        let server = wiremock::MockServer::start().await;
        mount_sites(&server).await;
        let tmp = TempDir::new().unwrap();
        let generator = netlify_generator(&server, &tmp);

        let removed = generator
            .cleanup_expired_deployments(MockupSettings::default().ttl())
            .await
            .unwrap();
        assert_eq!(removed, 1);
    }

    #[tokio::test]
    async fn test_cleanup_sweep_runs_on_schedule() {
        let server = wiremock::MockServer::start().await;
        mount_sites(&server).await;
        let tmp = TempDir::new().unwrap();
        let generator = Arc::new(netlify_generator(&server, &tmp));

        let sweep = generator
            .spawn_cleanup_sweep(Duration::from_secs(72 * 3600), Duration::from_secs(3600))
            .unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let requests = server.received_requests().await.unwrap_or_default();
                if requests.iter().any(|r| r.method.as_str() == "DELETE") {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .unwrap();
        sweep.abort();

        let offline = Arc::new(MockupGenerator::new(
            None,
            Arc::new(CopyBuilder),
            MockupSettings::default(),
            tmp.path(),
        ));
        assert!(offline.spawn_cleanup_sweep(Duration::from_secs(1), Duration::from_secs(1)).is_none());
    }
}

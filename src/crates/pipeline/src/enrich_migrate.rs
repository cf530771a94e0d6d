//! Production content step: enrich, map, convert to Astro and count CMS documents.
//!
//! Each stage is reported twice: as a [`WorkflowEvent`](crate::domain::WorkflowEvent) on
//! the bus and as an [`EnrichmentStatus`] kept per workflow for polling clients.

use crate::astro::{AstroConversionRequest, AstroConverter, AstroProject};
use crate::catalog::{normalize_business_type, schemas_for_business, supported_business_types};
use crate::domain::{ClientFormData, EventBus, EventKind};
use crate::enrichment::{ContentEnricher, ContentPreview, EnrichedContent, EnrichmentRequest, PreviewRequest};
use crate::mapper::{BusinessInfo, ContentMapper, MappingRequest};
use crate::mockups::template::{find_template, replacements, BASIC_INDEX_HTML};
use crate::sanity::{CleanupReport, SanityCredentials};
use crate::{PipelineError, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Pages pushed as CMS documents besides services and SEO entries
const PAGE_KEYS: &[&str] = &["home", "services", "about", "contact", "legal"];

const BASE_DURATION_MS: f64 = 30_000.0;

pub const NEXT_STEPS: &[&str] = &[
    "Build du projet Astro",
    "Déploiement sur Cloudflare Pages",
    "Configuration du domaine",
    "Tests de performance",
    "Envoi des accès au client",
    "Formation à l'interface Sanity",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnrichAndMigrateRequest {
    pub workflow_id: String,
    pub selected_template: String,
    #[serde(alias = "formData")]
    pub form: ClientFormData,
    /// Site domain; defaults to the form's domain, then a platform subdomain
    pub domain: Option<String>,
    pub sanity: Option<SanityCredentials>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanityMigrationSummary {
    pub content_migrated: bool,
    pub documents_created: usize,
    pub schemas_generated: Vec<String>,
}

/// Milliseconds, except `word_count`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentPerformance {
    pub enrichment_duration: u64,
    pub conversion_duration: u64,
    pub total_duration: u64,
    pub word_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentResult {
    pub success: bool,
    pub workflow_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enriched_content: Option<EnrichedContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub astro_project: Option<AstroProject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sanity_integration: Option<SanityMigrationSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<EnrichmentPerformance>,
    pub next_steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EnrichmentResult {
    fn failed(workflow_id: &str, error: String) -> Self {
        Self {
            success: false,
            workflow_id: workflow_id.to_string(),
            enriched_content: None,
            astro_project: None,
            sanity_integration: None,
            performance: None,
            next_steps: Vec::new(),
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentStatus {
    pub status: String,
    pub progress: u8,
    pub step: String,
    pub details: Option<Value>,
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl EnrichmentStatus {
    fn unknown() -> Self {
        Self {
            status: "unknown".to_string(),
            progress: 0,
            step: "Non démarré".to_string(),
            details: None,
            error: None,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub success: bool,
    pub preview: ContentPreview,
    /// Milliseconds
    pub estimated_duration: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentStats {
    pub total_enrichments: usize,
    pub success_rate: f64,
    pub recent_enrichments: Vec<Value>,
}

/// Progress and label of a stage event
fn stage(kind: EventKind) -> (u8, &'static str) {
    match kind {
        EventKind::EnrichmentStarted => (10, "Initialisation de l'enrichissement"),
        EventKind::ContentGenerationStarted => (25, "Génération du contenu avec DeepSeek AI"),
        EventKind::ContentMappingStarted => (50, "Mapping du contenu sur le template"),
        EventKind::AstroConversionStarted => (70, "Conversion vers Astro + Sanity"),
        EventKind::SanityContentMigrationStarted => (85, "Migration du contenu vers Sanity CMS"),
        EventKind::EnrichmentCompleted => (100, "Enrichissement terminé avec succès"),
        EventKind::EnrichmentFailed => (0, "Échec de l'enrichissement"),
        _ => (0, "Non démarré"),
    }
}

fn duration_multiplier(business_type: &str) -> f64 {
    match normalize_business_type(business_type).as_str() {
        "electricien" => 1.2,
        "jardinier" => 1.1,
        "menuisier" => 1.3,
        "chauffagiste" => 1.4,
        _ => 1.0,
    }
}

/// Milliseconds: 30 s scaled by trade and by the number of `service*` form keys
pub fn estimate_enrichment_duration(form: &ClientFormData) -> u64 {
    let service_keys = form.extra.keys().filter(|k| k.starts_with("service")).count()
        + usize::from(!form.services.is_empty());
    let estimate = BASE_DURATION_MS * duration_multiplier(&form.business_type) * (1.0 + 0.1 * service_keys as f64);
    estimate.round() as u64
}

/// Reasons a request cannot be enriched, empty when valid
pub fn validate_request(request: &EnrichAndMigrateRequest) -> Vec<String> {
    let form = &request.form;
    let mut errors = Vec::new();
    let missing = |value: &str| value.trim().is_empty();

    if missing(&request.workflow_id) {
        errors.push("WorkflowId manquant".to_string());
    }
    if missing(&request.selected_template) {
        errors.push("Template sélectionné manquant".to_string());
    }
    if missing(&form.business_name) {
        errors.push("Nom entreprise manquant".to_string());
    }
    if missing(&form.business_type) {
        errors.push("Type métier manquant".to_string());
    } else if !supported_business_types()
        .iter()
        .any(|t| *t == normalize_business_type(&form.business_type))
    {
        errors.push(format!("Type de métier non supporté: {}", form.business_type));
    }
    if missing(&form.ville) {
        errors.push("Ville manquante".to_string());
    }
    if missing(&form.telephone) {
        errors.push("Téléphone manquant".to_string());
    }
    if missing(&form.email) {
        errors.push("Email manquant".to_string());
    }
    errors
}

pub struct EnrichAndMigrate {
    enricher: Arc<ContentEnricher>,
    mapper: Arc<ContentMapper>,
    converter: Arc<AstroConverter>,
    events: EventBus,
    templates_dir: Option<PathBuf>,
    subdomain_root: String,
    statuses: DashMap<String, EnrichmentStatus>,
    requests: DashMap<String, EnrichAndMigrateRequest>,
}

impl EnrichAndMigrate {
    pub fn new(
        enricher: Arc<ContentEnricher>,
        mapper: Arc<ContentMapper>,
        converter: Arc<AstroConverter>,
        events: EventBus,
    ) -> Self {
        Self {
            enricher,
            mapper,
            converter,
            events,
            templates_dir: None,
            subdomain_root: "awema.fr".to_string(),
            statuses: DashMap::new(),
            requests: DashMap::new(),
        }
    }

    /// Read template HTML from `{dir}/{template}/index.html` when present
    pub fn with_templates_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.templates_dir = Some(dir.into());
        self
    }

    pub fn with_subdomain_root(mut self, root: impl Into<String>) -> Self {
        self.subdomain_root = root.into();
        self
    }

    pub fn converter(&self) -> &AstroConverter {
        &self.converter
    }

    /// Run the whole content step for a workflow
    ///
    /// Failures are reported in the result and in the status; no stage error escapes.
    pub async fn enrich_and_migrate(&self, request: EnrichAndMigrateRequest) -> EnrichmentResult {
        let workflow_id = request.workflow_id.clone();
        if !workflow_id.is_empty() {
            self.requests.insert(workflow_id.clone(), request.clone());
        }

        info!(
            workflow_id = %workflow_id,
            template = %request.selected_template,
            business_type = %request.form.business_type,
            "Starting enrichment"
        );
        self.record(
            &workflow_id,
            EventKind::EnrichmentStarted,
            Some(json!({
                "template": request.selected_template,
                "businessType": request.form.business_type,
            })),
            None,
        );

        match self.run(&request).await {
            Ok(result) => {
                self.record(
                    &workflow_id,
                    EventKind::EnrichmentCompleted,
                    Some(json!({
                        "performance": result.performance,
                        "documentsCreated": result.sanity_integration.as_ref().map(|s| s.documents_created),
                    })),
                    None,
                );
                info!(
                    workflow_id = %workflow_id,
                    word_count = result.performance.as_ref().map(|p| p.word_count).unwrap_or_default(),
                    "Enrichment complete"
                );
                result
            }
            Err(e) => {
                let message = e.to_string();
                error!(workflow_id = %workflow_id, error = %message, "Enrichment failed");
                self.record(&workflow_id, EventKind::EnrichmentFailed, None, Some(message.clone()));
                EnrichmentResult::failed(&workflow_id, message)
            }
        }
    }

    async fn run(&self, request: &EnrichAndMigrateRequest) -> Result<EnrichmentResult> {
        let started = Instant::now();
        let errors = validate_request(request);
        if !errors.is_empty() {
            return Err(PipelineError::Validation(format!("Données invalides: {}", errors.join(", "))));
        }

        let workflow_id = request.workflow_id.as_str();
        let form = &request.form;
        let template_html = self.template_html(&request.selected_template, form).await;

        self.record(workflow_id, EventKind::ContentGenerationStarted, None, None);
        let enrichment_started = Instant::now();
        let mut enrichment = EnrichmentRequest::from_form(form);
        enrichment.workflow_id = Some(workflow_id.to_string());
        enrichment.template = Some(request.selected_template.clone());
        let content = self.enricher.enrich(&enrichment).await?;
        let enrichment_duration = enrichment_started.elapsed().as_millis() as u64;

        self.record(workflow_id, EventKind::ContentMappingStarted, None, None);
        let business = BusinessInfo::from_form(form, self.site_domain(request));
        let mapped = self.mapper.map_content(&MappingRequest {
            workflow_id: Some(workflow_id),
            template_html: &template_html,
            content: &content,
            form,
            business: business.clone(),
        })?;
        for warning in &mapped.mapping_report.warnings {
            debug!(workflow_id = %workflow_id, warning = %warning, "Mapping warning");
        }

        self.record(workflow_id, EventKind::AstroConversionStarted, None, None);
        let conversion_started = Instant::now();
        let project = self
            .converter
            .convert(&AstroConversionRequest {
                workflow_id,
                business: &business,
                form,
                content: &content,
                mapped: Some(&mapped),
                sanity: request.sanity.as_ref(),
            })
            .await?;
        let conversion_duration = conversion_started.elapsed().as_millis() as u64;

        self.record(workflow_id, EventKind::SanityContentMigrationStarted, None, None);
        let migration = sanity_summary(&content, &form.business_type);

        Ok(EnrichmentResult {
            success: true,
            workflow_id: workflow_id.to_string(),
            performance: Some(EnrichmentPerformance {
                enrichment_duration,
                conversion_duration,
                total_duration: started.elapsed().as_millis() as u64,
                word_count: content.total_word_count,
            }),
            enriched_content: Some(content),
            astro_project: Some(project),
            sanity_integration: Some(migration),
            next_steps: NEXT_STEPS.iter().map(|s| s.to_string()).collect(),
            error: None,
        })
    }

    fn site_domain(&self, request: &EnrichAndMigrateRequest) -> String {
        request
            .domain
            .clone()
            .filter(|d| !d.trim().is_empty())
            .or_else(|| request.form.custom_domain().map(str::to_string))
            .unwrap_or_else(|| {
                format!(
                    "{}.{}",
                    utils::slugify(&request.form.business_name, 50),
                    self.subdomain_root
                )
            })
    }

    /// The mockup page the client picked, with its placeholders filled
    async fn template_html(&self, template: &str, form: &ClientFormData) -> String {
        let mut html = None;
        match (find_template(template), &self.templates_dir) {
            (Some(found), Some(dir)) => {
                let path = dir.join(found.base_directory).join("index.html");
                match tokio::fs::read_to_string(&path).await {
                    Ok(text) => html = Some(text),
                    Err(e) => debug!(path = %path.display(), error = %e, "Template page unavailable"),
                }
            }
            (None, _) => warn!(template = %template, "Unknown template, using the basic page"),
            _ => {}
        }

        replacements(form)
            .into_iter()
            .fold(html.unwrap_or_else(|| BASIC_INDEX_HTML.to_string()), |page, (placeholder, value)| {
                page.replace(placeholder, &value)
            })
    }

    fn record(&self, workflow_id: &str, kind: EventKind, details: Option<Value>, error: Option<String>) {
        let (progress, step) = stage(kind);
        if !workflow_id.is_empty() {
            self.statuses.insert(
                workflow_id.to_string(),
                EnrichmentStatus {
                    status: kind.as_str().to_string(),
                    progress,
                    step: step.to_string(),
                    details: details.clone(),
                    error: error.clone(),
                    updated_at: Utc::now(),
                },
            );
        }
        self.events.emit(
            workflow_id,
            kind,
            json!({
                "progress": progress,
                "step": step,
                "details": details,
                "error": error,
            }),
        );
    }

    pub fn enrichment_status(&self, workflow_id: &str) -> EnrichmentStatus {
        self.statuses
            .get(workflow_id)
            .map(|s| s.clone())
            .unwrap_or_else(EnrichmentStatus::unknown)
    }

    /// Rerun with the request recorded for the workflow
    pub async fn retry_enrichment(&self, workflow_id: &str) -> Result<EnrichmentResult> {
        let request = self
            .requests
            .get(workflow_id)
            .map(|r| r.clone())
            .ok_or_else(|| PipelineError::NotFound("Données de workflow non trouvées pour retry".to_string()))?;

        info!(workflow_id = %workflow_id, "Retrying enrichment");
        self.statuses.remove(workflow_id);
        Ok(self.enrich_and_migrate(request).await)
    }

    pub async fn generate_content_preview(&self, form: &ClientFormData, workflow_id: Option<&str>) -> PreviewResponse {
        let mut request = PreviewRequest::from_form(form);
        request.workflow_id = workflow_id.map(str::to_string);
        let preview = self.enricher.generate_preview(&request).await;
        PreviewResponse {
            success: true,
            preview,
            estimated_duration: estimate_enrichment_duration(form),
        }
    }

    /// Forget the workflow's status and caches and delete its Astro project
    pub async fn cleanup_enrichment_resources(&self, workflow_id: &str) -> CleanupReport {
        let mut report = CleanupReport::default();

        self.statuses.remove(workflow_id);
        self.requests.remove(workflow_id);
        report.cleaned.push("status_cache".to_string());

        match self.converter.cleanup(workflow_id).await {
            Ok(true) => report.cleaned.push("astro_temp_files".to_string()),
            Ok(false) => {}
            Err(e) => report.errors.push(format!("Astro: {}", e)),
        }

        let cleared = self.enricher.clear_cache(workflow_id);
        if self.mapper.cleanup(workflow_id) || cleared > 0 {
            report.cleaned.push("deepseek_cache".to_string());
        }

        report.success = report.errors.is_empty();
        info!(workflow_id = %workflow_id, cleaned = ?report.cleaned, "Enrichment resources cleaned");
        report
    }

    pub fn enrichment_stats(&self) -> EnrichmentStats {
        let mut entries: Vec<(String, EnrichmentStatus)> = self
            .statuses
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        let total = entries.len();
        let completed = entries
            .iter()
            .filter(|(_, s)| s.status == EventKind::EnrichmentCompleted.as_str())
            .count();

        entries.sort_by(|a, b| b.1.updated_at.cmp(&a.1.updated_at));
        let recent = entries
            .into_iter()
            .take(10)
            .map(|(id, status)| {
                json!({
                    "workflowId": id,
                    "status": status.status,
                    "progress": status.progress,
                    "updatedAt": status.updated_at,
                })
            })
            .collect();

        EnrichmentStats {
            total_enrichments: total,
            success_rate: if total == 0 { 0.0 } else { completed as f64 / total as f64 },
            recent_enrichments: recent,
        }
    }
}

fn sanity_summary(content: &EnrichedContent, business_type: &str) -> SanityMigrationSummary {
    SanityMigrationSummary {
        content_migrated: true,
        documents_created: PAGE_KEYS.len() + content.pages.services.len() + content.seo.meta_descriptions.len(),
        schemas_generated: schemas_for_business(business_type)
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnrichmentSettings;
    use tempfile::TempDir;

    fn form(business_type: &str) -> ClientFormData {
        serde_json::from_value(json!({
            "businessName": "Plomberie Martin",
            "businessType": business_type,
            "email": "martin@example.fr",
            "telephone": "0611223344",
            "ville": "Lyon",
            "codePostal": "69003",
        }))
        .unwrap()
    }

    fn service(tmp: &TempDir) -> (EnrichAndMigrate, EventBus) {
        let events = EventBus::new(64);
        let service = EnrichAndMigrate::new(
            Arc::new(ContentEnricher::new(None, EnrichmentSettings::default())),
            Arc::new(ContentMapper::new()),
            Arc::new(AstroConverter::new(tmp.path().join("astro"))),
            events.clone(),
        );
        (service, events)
    }

    fn request(business_type: &str) -> EnrichAndMigrateRequest {
        EnrichAndMigrateRequest {
            workflow_id: "workflow-42".to_string(),
            selected_template: "classique".to_string(),
            form: form(business_type),
            domain: None,
            sanity: None,
        }
    }

    #[test]
    fn test_duration_estimate() {
        assert_eq!(estimate_enrichment_duration(&form("plombier")), 30_000);
        assert_eq!(estimate_enrichment_duration(&form("chauffagiste")), 42_000);

        let mut with_services = form("menuisier");
        with_services.extra.insert("service1".to_string(), json!("Escaliers"));
        with_services.extra.insert("service2".to_string(), json!("Placards"));
        // 30000 * 1.3 * 1.2
        assert_eq!(estimate_enrichment_duration(&with_services), 46_800);
    }

    #[test]
    fn test_validation_lists_every_problem() {
        let mut bad = request("astronaute");
        bad.workflow_id.clear();
        bad.form.telephone.clear();

        let errors = validate_request(&bad);
        assert!(errors.contains(&"WorkflowId manquant".to_string()));
        assert!(errors.contains(&"Téléphone manquant".to_string()));
        assert!(errors.contains(&"Type de métier non supporté: astronaute".to_string()));
        assert!(validate_request(&request("plombier")).is_empty());
    }

    #[tokio::test]
    async fn test_full_run_with_fallback_content() {
        let tmp = TempDir::new().unwrap();
        let (service, events) = service(&tmp);
        let mut rx = events.subscribe();

        let result = service.enrich_and_migrate(request("plombier")).await;
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.next_steps.len(), 6);

        let content = result.enriched_content.as_ref().unwrap();
        let migration = result.sanity_integration.as_ref().unwrap();
        assert_eq!(
            migration.documents_created,
            5 + content.pages.services.len() + content.seo.meta_descriptions.len()
        );
        assert!(!migration.schemas_generated.is_empty());

        let project = result.astro_project.as_ref().unwrap();
        assert!(project.project_path.join("package.json").is_file());

        let status = service.enrichment_status("workflow-42");
        assert_eq!(status.status, "enrichment_completed");
        assert_eq!(status.progress, 100);

        let mut progress = Vec::new();
        while let Ok(event) = rx.try_recv() {
            progress.push(event.data["progress"].as_u64().unwrap());
        }
        assert_eq!(progress, vec![10, 25, 50, 70, 85, 100]);
    }

    #[tokio::test]
    async fn test_invalid_request_marks_failure() {
        let tmp = TempDir::new().unwrap();
        let (service, _events) = service(&tmp);
        let mut bad = request("plombier");
        bad.selected_template.clear();

        let result = service.enrich_and_migrate(bad).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("Template sélectionné manquant"));

        let status = service.enrichment_status("workflow-42");
        assert_eq!(status.status, "enrichment_failed");
        assert_eq!(status.progress, 0);
        assert_eq!(status.step, "Échec de l'enrichissement");
    }

    #[tokio::test]
    async fn test_retry_needs_a_previous_run() {
        let tmp = TempDir::new().unwrap();
        let (service, _events) = service(&tmp);

        let err = service.retry_enrichment("workflow-42").await.unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));

        service.enrich_and_migrate(request("plombier")).await;
        let retried = service.retry_enrichment("workflow-42").await.unwrap();
        assert!(retried.success);
    }

    #[tokio::test]
    async fn test_status_stats_and_cleanup() {
        let tmp = TempDir::new().unwrap();
        let (service, _events) = service(&tmp);
        assert_eq!(service.enrichment_status("workflow-42").status, "unknown");

        service.enrich_and_migrate(request("plombier")).await;
        let mut failing = request("plombier");
        failing.workflow_id = "workflow-43".to_string();
        failing.form.email.clear();
        service.enrich_and_migrate(failing).await;

        let stats = service.enrichment_stats();
        assert_eq!(stats.total_enrichments, 2);
        assert!((stats.success_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(stats.recent_enrichments.len(), 2);

        let report = service.cleanup_enrichment_resources("workflow-42").await;
        assert!(report.success);
        assert!(report.cleaned.contains(&"astro_temp_files".to_string()));
        assert!(!tmp.path().join("astro").join("astro-project-workflow-42").exists());
        assert_eq!(service.enrichment_status("workflow-42").status, "unknown");
    }

    #[tokio::test]
    async fn test_preview_carries_duration_estimate() {
        let tmp = TempDir::new().unwrap();
        let (service, _events) = service(&tmp);

        let response = service
            .generate_content_preview(&form("electricien"), Some("workflow-42"))
            .await;
        assert!(response.success);
        assert_eq!(response.estimated_duration, 36_000);
        assert!(response.preview.services_count >= 3);
    }
}

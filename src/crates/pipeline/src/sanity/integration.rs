//! CMS provisioning step run after the client picked a template.

use super::migration::{ContentCounts, MigrationOptions, SanityDataMigration};
use super::setup::{ProjectBrief, SanityProjectSetup, SanitySetup};
use crate::catalog::{business_config, features_for_business, schemas_for_business};
use crate::domain::{SanityIntegrationState, SanityStage, Workflow, WorkflowUpdate};
use crate::store::WorkflowStore;
use crate::{PipelineError, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const NEXT_STEPS: &[&str] = &[
    "Configurer le projet Astro avec les credentials Sanity",
    "Déployer sur Cloudflare Pages",
    "Configurer le domaine personnalisé",
    "Tester la synchronisation contenu",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicCredentials {
    pub project_id: String,
    pub dataset: String,
    pub studio_url: String,
    pub cdn_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanityIntegrationResult {
    pub success: bool,
    pub project_id: String,
    pub credentials: Option<PublicCredentials>,
    pub content: ContentCounts,
    pub next_steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Full project record for the following pipeline stages
    #[serde(skip)]
    pub setup: Option<SanityProjectSetup>,
}

impl SanityIntegrationResult {
    fn failed(error: String) -> Self {
        Self {
            success: false,
            project_id: String::new(),
            credentials: None,
            content: ContentCounts::default(),
            next_steps: Vec::new(),
            error: Some(error),
            setup: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationStatus {
    pub status: String,
    pub progress: u8,
    pub details: Option<Value>,
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub success: bool,
    pub cleaned: Vec<String>,
    pub errors: Vec<String>,
}

/// Replacement documents per content type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentUpdates {
    pub services: Option<Vec<Value>>,
    pub testimonials: Option<Vec<Value>>,
    pub projects: Option<Vec<Value>>,
    pub settings: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReport {
    pub success: bool,
    pub updated: Vec<String>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AstroHandoff {
    pub sanity_config: Value,
    pub content_structure: Value,
    pub build_instructions: Value,
    pub deployment_vars: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationStats {
    pub total_integrations: usize,
    pub success_rate: f64,
    pub recent_integrations: Vec<Value>,
}

pub struct WorkflowSanityIntegration {
    store: Arc<dyn WorkflowStore>,
    setup: Arc<SanitySetup>,
    migration: Arc<SanityDataMigration>,
    subdomain_root: String,
    statuses: DashMap<String, IntegrationStatus>,
}

impl WorkflowSanityIntegration {
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        setup: Arc<SanitySetup>,
        migration: Arc<SanityDataMigration>,
        subdomain_root: impl Into<String>,
    ) -> Self {
        Self {
            store,
            setup,
            migration,
            subdomain_root: subdomain_root.into(),
            statuses: DashMap::new(),
        }
    }

    pub fn setup(&self) -> &SanitySetup {
        &self.setup
    }

    pub fn migration(&self) -> &SanityDataMigration {
        &self.migration
    }

    async fn load_workflow(&self, workflow_id: &str) -> Result<Workflow> {
        self.store
            .get(workflow_id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("Workflow non trouvé: {}", workflow_id)))
    }

    /// Provision and fill the CMS for the chosen template
    ///
    /// Failures are reported in the result and recorded on the workflow; only a
    /// missing workflow is an error.
    pub async fn integrate_after_template_choice(
        &self,
        workflow_id: &str,
        template: &str,
        options: MigrationOptions,
    ) -> Result<SanityIntegrationResult> {
        let workflow = self.load_workflow(workflow_id).await?;
        info!(workflow_id = %workflow_id, template = %template, "Starting Sanity integration");

        self.record_stage(workflow_id, SanityStage::SanitySetupStarted, template, None, None)
            .await;

        match self.run(&workflow, template, options).await {
            Ok(result) => {
                self.record_stage(
                    workflow_id,
                    SanityStage::SanityReadyForAstro,
                    template,
                    result.setup.as_ref(),
                    None,
                )
                .await;
                if let Some(mut status) = self.statuses.get_mut(workflow_id) {
                    status.details = Some(json!({
                        "projectId": result.project_id,
                        "content": result.content,
                    }));
                }
                info!(workflow_id = %workflow_id, project_id = %result.project_id, "Sanity integration complete");
                Ok(result)
            }
            Err(e) => {
                let message = e.to_string();
                error!(workflow_id = %workflow_id, error = %message, "Sanity integration failed");
                self.record_stage(
                    workflow_id,
                    SanityStage::SanitySetupFailed,
                    template,
                    None,
                    Some(message.clone()),
                )
                .await;
                Ok(SanityIntegrationResult::failed(message))
            }
        }
    }

    async fn run(&self, workflow: &Workflow, template: &str, options: MigrationOptions) -> Result<SanityIntegrationResult> {
        let brief = ProjectBrief::from_workflow(workflow, template, &self.subdomain_root);
        let errors = validate_brief(&brief);
        if !errors.is_empty() {
            return Err(PipelineError::Validation(format!("Données invalides: {}", errors.join(", "))));
        }

        let setup = self.setup.setup_project(&brief).await?;
        let migrated = self.migration.migrate(&setup.credentials, &brief, options).await?;

        self.store
            .update(
                &workflow.id,
                WorkflowUpdate {
                    sanity_project_id: Some(setup.credentials.project_id.clone()),
                    ..Default::default()
                },
            )
            .await?;

        let credentials = &setup.credentials;
        Ok(SanityIntegrationResult {
            success: true,
            project_id: credentials.project_id.clone(),
            credentials: Some(PublicCredentials {
                project_id: credentials.project_id.clone(),
                dataset: credentials.dataset.clone(),
                studio_url: credentials.studio_url.clone(),
                cdn_url: credentials.cdn_url.clone(),
            }),
            content: migrated.counts(),
            next_steps: NEXT_STEPS.iter().map(|s| s.to_string()).collect(),
            error: None,
            setup: Some(setup),
        })
    }

    async fn record_stage(
        &self,
        workflow_id: &str,
        stage: SanityStage,
        template: &str,
        setup: Option<&SanityProjectSetup>,
        error: Option<String>,
    ) {
        let (status, progress) = match stage {
            SanityStage::SanitySetupStarted => ("sanity_setup_started", 10),
            SanityStage::SanityReadyForAstro => ("sanity_ready_for_astro", 100),
            SanityStage::SanitySetupFailed => ("sanity_setup_failed", 0),
        };
        let now = Utc::now();
        self.statuses.insert(
            workflow_id.to_string(),
            IntegrationStatus {
                status: status.to_string(),
                progress,
                details: None,
                error: error.clone(),
                updated_at: now,
            },
        );

        let state = SanityIntegrationState {
            stage,
            project_id: setup.map(|s| s.credentials.project_id.clone()),
            studio_url: setup.map(|s| s.credentials.studio_url.clone()),
            template: Some(template.to_string()),
            error,
            updated_at: now,
        };
        let update = WorkflowUpdate {
            sanity_integration: Some(state),
            ..Default::default()
        };
        if let Err(e) = self.store.update(workflow_id, update).await {
            warn!(workflow_id = %workflow_id, error = %e, "Could not record Sanity stage");
        }
    }

    pub async fn integration_status(&self, workflow_id: &str) -> Result<IntegrationStatus> {
        if let Some(status) = self.statuses.get(workflow_id) {
            return Ok(status.clone());
        }

        let workflow = self.load_workflow(workflow_id).await?;
        Ok(match workflow.sanity_integration {
            Some(state) => {
                let (status, progress) = match state.stage {
                    SanityStage::SanitySetupStarted => ("sanity_setup_started", 10),
                    SanityStage::SanityReadyForAstro => ("sanity_ready_for_astro", 100),
                    SanityStage::SanitySetupFailed => ("sanity_setup_failed", 0),
                };
                IntegrationStatus {
                    status: status.to_string(),
                    progress,
                    details: state.project_id.map(|id| json!({ "projectId": id })),
                    error: state.error,
                    updated_at: state.updated_at,
                }
            }
            None => IntegrationStatus {
                status: "unknown".to_string(),
                progress: 0,
                details: None,
                error: None,
                updated_at: workflow.updated_at,
            },
        })
    }

    /// Run the integration again with the template recorded on the workflow
    pub async fn retry_integration(&self, workflow_id: &str) -> Result<SanityIntegrationResult> {
        let workflow = self.load_workflow(workflow_id).await?;
        let template = workflow
            .sanity_integration
            .as_ref()
            .and_then(|s| s.template.clone())
            .or_else(|| workflow.selected_template.clone())
            .ok_or_else(|| PipelineError::Validation("Aucun template sélectionné pour ce workflow".to_string()))?;

        info!(workflow_id = %workflow_id, template = %template, "Retrying Sanity integration");
        self.integrate_after_template_choice(workflow_id, &template, MigrationOptions::default())
            .await
    }

    /// Delete the workflow's CMS project and local records
    pub async fn cleanup_workflow_sanity(&self, workflow_id: &str) -> CleanupReport {
        let mut report = CleanupReport::default();

        let project_id = match self.store.get(workflow_id).await {
            Ok(workflow) => workflow.and_then(|w| w.sanity_project_id),
            Err(e) => {
                report.errors.push(e.to_string());
                None
            }
        };

        if let Some(project_id) = project_id {
            let simulated = match self.setup.load_project(&project_id).await {
                Ok(Some(project)) => project.credentials.simulated,
                _ => true,
            };
            if let (Some(client), false) = (self.setup.client(), simulated) {
                match client.delete_project(&project_id).await {
                    Ok(()) => report.cleaned.push(format!("Projet Sanity {}", project_id)),
                    Err(e) => report.errors.push(format!("Projet Sanity {}: {}", project_id, e)),
                }
            }
            match self.setup.remove_project(&project_id).await {
                Ok(true) => report.cleaned.push(format!("Configuration {}", project_id)),
                Ok(false) => {}
                Err(e) => report.errors.push(e.to_string()),
            }
        }

        self.statuses.remove(workflow_id);
        report.cleaned.push("Cache local".to_string());
        report.success = report.errors.is_empty();
        info!(workflow_id = %workflow_id, cleaned = report.cleaned.len(), "Sanity resources cleaned");
        report
    }

    /// Replace content documents after the client changed their data
    pub async fn update_sanity_content(&self, workflow_id: &str, updates: ContentUpdates) -> Result<UpdateReport> {
        let project = self.project_for(workflow_id).await?;
        let credentials = &project.credentials;
        let mut report = UpdateReport::default();

        let batches: Vec<(&str, Vec<Value>)> = [
            ("services", "service", updates.services),
            ("testimonials", "testimonial", updates.testimonials),
            ("projects", "project", updates.projects),
            ("settings", "settings", updates.settings.map(|s| vec![s])),
        ]
        .into_iter()
        .filter_map(|(name, doc_type, docs)| docs.map(|d| (name, prepare_documents(doc_type, d))))
        .collect();

        for (name, documents) in batches {
            let (_, errors) = self.migration.write(credentials, documents).await;
            if errors.is_empty() {
                report.updated.push(name.to_string());
            } else {
                report.errors.extend(errors.into_iter().map(|e| format!("{}: {}", name, e)));
            }
        }

        self.setup.touch_project(&credentials.project_id).await?;
        report.success = report.errors.is_empty();
        Ok(report)
    }

    async fn project_for(&self, workflow_id: &str) -> Result<SanityProjectSetup> {
        let workflow = self.load_workflow(workflow_id).await?;
        let project_id = workflow
            .sanity_project_id
            .ok_or_else(|| PipelineError::NotFound("Credentials Sanity non trouvés".to_string()))?;
        self.setup
            .load_project(&project_id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("Projet Sanity non trouvé: {}", project_id)))
    }

    /// Everything the Astro stage needs to wire the site to its CMS
    pub async fn generate_astro_handoff(&self, workflow_id: &str) -> Result<AstroHandoff> {
        let project = self.project_for(workflow_id).await?;
        let brief = &project.brief;
        let credentials = &project.credentials;
        let counts = self
            .migration
            .load_summary(&credentials.project_id)
            .await?
            .map(|s| s.counts)
            .unwrap_or_default();

        let deployment_vars = BTreeMap::from([
            ("SANITY_PROJECT_ID".to_string(), credentials.project_id.clone()),
            ("SANITY_DATASET".to_string(), credentials.dataset.clone()),
            ("SANITY_API_VERSION".to_string(), credentials.api_version.clone()),
            ("BUSINESS_NAME".to_string(), brief.business_name.clone()),
            ("BUSINESS_TYPE".to_string(), brief.business_type.clone()),
            ("DOMAIN".to_string(), brief.domain.clone()),
        ]);

        Ok(AstroHandoff {
            sanity_config: json!({
                "projectId": credentials.project_id,
                "dataset": credentials.dataset,
                "apiVersion": credentials.api_version,
                "studioUrl": credentials.studio_url,
            }),
            content_structure: json!({
                "schemas": schemas_for_business(&brief.business_type),
                "services": counts.services_count,
                "testimonials": counts.testimonials_count,
                "projects": counts.projects_count,
                "pages": counts.pages_count,
            }),
            build_instructions: json!({
                "businessType": brief.business_type,
                "template": brief.selected_template,
                "colors": brief.colors,
                "features": features_for_business(&brief.business_type),
            }),
            deployment_vars,
        })
    }

    pub fn integration_stats(&self) -> IntegrationStats {
        let mut statuses: Vec<(String, IntegrationStatus)> = self
            .statuses
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        let total = statuses.len();
        let ready = statuses.iter().filter(|(_, s)| s.status.contains("ready")).count();
        statuses.sort_by(|a, b| b.1.updated_at.cmp(&a.1.updated_at));

        IntegrationStats {
            total_integrations: total,
            success_rate: if total == 0 { 0.0 } else { ready as f64 / total as f64 },
            recent_integrations: statuses
                .into_iter()
                .take(10)
                .map(|(id, s)| json!({ "workflowId": id, "status": s.status, "updatedAt": s.updated_at }))
                .collect(),
        }
    }
}

fn validate_brief(brief: &ProjectBrief) -> Vec<String> {
    let mut errors = Vec::new();
    if brief.client_id.is_empty() {
        errors.push("ClientId manquant".to_string());
    }
    if brief.selected_template.trim().is_empty() {
        errors.push("Template sélectionné manquant".to_string());
    }
    if brief.business_name.trim().is_empty() {
        errors.push("Nom entreprise manquant".to_string());
    }
    if brief.business_type.trim().is_empty() {
        errors.push("Type métier manquant".to_string());
    } else if business_config(&brief.business_type).is_none() {
        errors.push(format!("Type de métier non supporté: {}", brief.business_type));
    }
    if brief.domain.trim().is_empty() {
        errors.push("Domaine manquant".to_string());
    }
    errors
}

/// Give each document a `_type` and a stable `_id` when missing
fn prepare_documents(doc_type: &str, documents: Vec<Value>) -> Vec<Value> {
    documents
        .into_iter()
        .enumerate()
        .map(|(i, mut doc)| {
            if let Some(obj) = doc.as_object_mut() {
                obj.entry("_type").or_insert_with(|| json!(doc_type));
                obj.entry("_id").or_insert_with(|| json!(format!("{}-{}", doc_type, i + 1)));
            }
            doc
        })
        .collect()
}

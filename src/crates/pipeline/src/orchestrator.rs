//! Workflow orchestrator
//!
//! Drives a workflow from the intake form to the production site:
//!
//! ```text
//! form_received → preparing → mockups_ready → sending → sent
//!     → chosen → enriching → deploying → deployed
//! ```
//!
//! Long stages run on background tasks; every transition is persisted in the
//! [`WorkflowStore`] and announced on the [`EventBus`].

use crate::astro::AstroBuild;
use crate::deploy::{CloudflareDeployer, DeploymentRequest, DeploymentResult, SanityDeployConfig, SiteInfo};
use crate::domain::{
    ClientFormData, EventBus, EventKind, Workflow, WorkflowEvent, WorkflowResult, WorkflowStatus, WorkflowUpdate,
};
use crate::email::{EmailNotifier, EmailSendResult, MockupEmailRequest};
use crate::enrich_migrate::{EnrichAndMigrate, EnrichAndMigrateRequest};
use crate::mockups::MockupGenerator;
use crate::sanity::{MigrationOptions, SanityCredentials, WorkflowSanityIntegration};
use crate::store::WorkflowStore;
use crate::{PipelineError, Result};
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Workflows listed by [`WorkflowOrchestrator::dashboard`]
const DASHBOARD_LIMIT: usize = 100;

/// Services the orchestrator calls into, one per stage
pub struct PipelineStages {
    pub mockups: Arc<MockupGenerator>,
    pub email: Arc<EmailNotifier>,
    pub sanity: Arc<WorkflowSanityIntegration>,
    pub enrichment: Arc<EnrichAndMigrate>,
    pub astro_build: Arc<AstroBuild>,
    /// `None` when Cloudflare credentials are missing; production then fails at deploy
    pub deployer: Option<Arc<CloudflareDeployer>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub workflows: Vec<WorkflowResult>,
}

pub struct WorkflowOrchestrator {
    store: Arc<dyn WorkflowStore>,
    events: EventBus,
    stages: PipelineStages,
    public_url: String,
    /// Workflows with a production task running
    in_production: DashMap<String, ()>,
}

impl WorkflowOrchestrator {
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        events: EventBus,
        stages: PipelineStages,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            events,
            stages,
            public_url: public_url.into().trim_end_matches('/').to_string(),
            in_production: DashMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn WorkflowStore> {
        &self.store
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn stages(&self) -> &PipelineStages {
        &self.stages
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    /// Link the proposal email points the client to
    pub fn selection_url(&self, workflow_id: &str) -> String {
        format!("{}/client-selection/{}", self.public_url, workflow_id)
    }

    async fn load(&self, workflow_id: &str) -> Result<Workflow> {
        self.store
            .get(workflow_id)
            .await?
            .ok_or_else(|| PipelineError::NotFound("Workflow non trouvé".to_string()))
    }

    /// Record the failure on the workflow and announce it
    async fn fail(&self, workflow_id: &str, step: &str, err: &PipelineError) {
        let message = err.to_string();
        error!(workflow_id = %workflow_id, step = %step, error = %message, "Workflow step failed");
        if let Err(e) = self.store.update(workflow_id, WorkflowUpdate::failed(&message)).await {
            warn!(workflow_id = %workflow_id, error = %e, "Could not record workflow failure");
        }
        self.events.emit(
            workflow_id,
            EventKind::WorkflowError,
            json!({ "step": step, "error": message }),
        );
    }

    /// Store a new workflow and start building its mockups in the background
    pub async fn initialize_workflow(self: &Arc<Self>, form: ClientFormData) -> Result<WorkflowResult> {
        form.ensure_valid()?;
        let workflow = self.store.create(Workflow::new(form)).await?;
        info!(
            workflow_id = %workflow.id,
            business = %workflow.client.business_name,
            business_type = %workflow.client.business_type,
            "Workflow initialized"
        );
        self.events.emit(
            &workflow.id,
            EventKind::WorkflowInitialized,
            json!({
                "businessName": workflow.client.business_name,
                "businessType": workflow.client.business_type,
                "email": workflow.client.email,
            }),
        );

        let orchestrator = Arc::clone(self);
        let workflow_id = workflow.id.clone();
        tokio::spawn(async move {
            if let Err(e) = orchestrator.generate_mockups(&workflow_id).await {
                warn!(workflow_id = %workflow_id, error = %e, "Mockup stage ended with an error");
            }
        });

        Ok(WorkflowResult::from(&workflow))
    }

    /// Build the mockups, then send the proposal email
    pub async fn generate_mockups(&self, workflow_id: &str) -> Result<()> {
        let workflow = self.store.update_status(workflow_id, WorkflowStatus::Preparing).await?;
        self.events.emit(
            workflow_id,
            EventKind::MockupsGenerationStarted,
            json!({ "templates": workflow.client.selected_templates }),
        );

        let generated = self.stages.mockups.generate(workflow_id, &workflow.client).await;
        if !generated.success {
            let message = if generated.errors.is_empty() {
                "Aucune maquette générée".to_string()
            } else {
                generated.errors.join("; ")
            };
            let update = WorkflowUpdate {
                mockups: Some(generated.mockups),
                ..WorkflowUpdate::failed(&message)
            };
            self.store.update(workflow_id, update).await?;
            self.events.emit(
                workflow_id,
                EventKind::WorkflowError,
                json!({ "step": "mockups", "error": message }),
            );
            return Err(PipelineError::General(message));
        }

        let ready = generated.mockups.iter().filter(|m| m.is_ready()).count();
        let update = WorkflowUpdate {
            mockups: Some(generated.mockups),
            error: Some(None),
            ..WorkflowUpdate::status(WorkflowStatus::MockupsReady)
        };
        self.store.update(workflow_id, update).await?;
        self.events.emit(
            workflow_id,
            EventKind::MockupsGenerationCompleted,
            json!({ "mockups": ready, "totalTime": generated.total_time }),
        );

        self.send_proposal_email(workflow_id).await.map(|_| ())
    }

    /// Email the ready mockups; a failed send rolls the workflow back to `mockups_ready`
    pub async fn send_proposal_email(&self, workflow_id: &str) -> Result<EmailSendResult> {
        let workflow = self.store.update_status(workflow_id, WorkflowStatus::Sending).await?;
        self.events.emit(
            workflow_id,
            EventKind::EmailSending,
            json!({ "to": workflow.client.email }),
        );

        let request = MockupEmailRequest::from_workflow(&workflow);
        match self.stages.email.send_mockups_email(&request).await {
            Ok(sent) => {
                self.store.update_status(workflow_id, WorkflowStatus::Sent).await?;
                let selection_url = self.selection_url(workflow_id);
                info!(
                    workflow_id = %workflow_id,
                    tracking_id = %sent.tracking_id,
                    selection_url = %selection_url,
                    "Proposal email sent"
                );
                self.events.emit(
                    workflow_id,
                    EventKind::EmailSent,
                    json!({
                        "trackingId": sent.tracking_id,
                        "selectionUrl": selection_url,
                        "mockups": request.mockups.len(),
                    }),
                );
                Ok(sent)
            }
            Err(e) => {
                let message = e.to_string();
                error!(workflow_id = %workflow_id, error = %message, "Proposal email failed");
                let update = WorkflowUpdate {
                    error: Some(Some(message.clone())),
                    ..WorkflowUpdate::status(WorkflowStatus::MockupsReady)
                };
                if let Err(store_err) = self.store.update(workflow_id, update).await {
                    warn!(workflow_id = %workflow_id, error = %store_err, "Could not roll back email status");
                }
                self.events.emit(
                    workflow_id,
                    EventKind::WorkflowError,
                    json!({ "step": "email", "error": message }),
                );
                Err(e)
            }
        }
    }

    /// Record the client's template and start production in the background
    pub async fn handle_client_selection(self: &Arc<Self>, workflow_id: &str, template: &str) -> Result<WorkflowResult> {
        let template = template.trim();
        if template.is_empty() {
            return Err(PipelineError::Validation("Template requis".to_string()));
        }
        if !self.claim_production(workflow_id) {
            return Err(PipelineError::Validation("Production déjà en cours pour ce workflow".to_string()));
        }
        match self.record_selection(workflow_id, template).await {
            Ok(workflow) => {
                info!(workflow_id = %workflow_id, template = %template, "Client selected a template");
                self.events.emit(
                    workflow_id,
                    EventKind::ClientSelectionMade,
                    json!({ "template": template }),
                );
                self.spawn_production(workflow_id);
                Ok(WorkflowResult::from(&workflow))
            }
            Err(e) => {
                self.in_production.remove(workflow_id);
                Err(e)
            }
        }
    }

    /// A template is chosen once; a failed production goes through [`retry_workflow`](Self::retry_workflow)
    async fn record_selection(&self, workflow_id: &str, template: &str) -> Result<Workflow> {
        let workflow = self.load(workflow_id).await?;
        let already_chosen = workflow.status.is_past_selection()
            || (workflow.status == WorkflowStatus::Error && workflow.selected_template.is_some());
        if already_chosen {
            warn!(workflow_id = %workflow_id, status = %workflow.status, "Template already selected");
            return Err(PipelineError::InvalidStateTransition {
                from: workflow.status.to_string(),
                to: WorkflowStatus::Chosen.to_string(),
            });
        }
        if !workflow.mockups.is_empty() && !workflow.mockups.iter().any(|m| m.template_name == template) {
            warn!(workflow_id = %workflow_id, template = %template, "Selected template was not among the mockups");
        }

        let update = WorkflowUpdate {
            selected_template: Some(template.to_string()),
            error: Some(None),
            ..WorkflowUpdate::status(WorkflowStatus::Chosen)
        };
        self.store.update(workflow_id, update).await
    }

    /// Reserve the production slot of `workflow_id`; false when a production task holds it
    fn claim_production(&self, workflow_id: &str) -> bool {
        match self.in_production.entry(workflow_id.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(());
                true
            }
        }
    }

    pub fn is_in_production(&self, workflow_id: &str) -> bool {
        self.in_production.contains_key(workflow_id)
    }

    /// Runs production on a slot already claimed, and frees it when done
    fn spawn_production(self: &Arc<Self>, workflow_id: &str) {
        let orchestrator = Arc::clone(self);
        let workflow_id = workflow_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = orchestrator.start_production_phase(&workflow_id).await {
                warn!(workflow_id = %workflow_id, error = %e, "Production stage ended with an error");
            }
            orchestrator.in_production.remove(&workflow_id);
        });
    }

    /// CMS, content, build and deployment for a chosen template
    ///
    /// Any failure moves the workflow to `error` with a `workflow.error` event.
    pub async fn start_production_phase(&self, workflow_id: &str) -> Result<DeploymentResult> {
        match self.run_production(workflow_id).await {
            Ok(result) => Ok(result),
            Err(e) => {
                self.fail(workflow_id, "production", &e).await;
                Err(e)
            }
        }
    }

    async fn run_production(&self, workflow_id: &str) -> Result<DeploymentResult> {
        let workflow = self.store.update_status(workflow_id, WorkflowStatus::Enriching).await?;
        let template = workflow
            .selected_template
            .clone()
            .ok_or_else(|| PipelineError::Validation("Aucun template sélectionné pour ce workflow".to_string()))?;
        info!(workflow_id = %workflow_id, template = %template, "Starting production phase");

        let sanity = self
            .stages
            .sanity
            .integrate_after_template_choice(workflow_id, &template, MigrationOptions::default())
            .await?;
        if !sanity.success {
            return Err(PipelineError::General(format!(
                "Configuration Sanity échouée: {}",
                sanity.error.unwrap_or_default()
            )));
        }
        let credentials: Option<SanityCredentials> = sanity.setup.map(|s| s.credentials);
        self.events.emit(
            workflow_id,
            EventKind::SanitySetupCompleted,
            json!({ "projectId": sanity.project_id }),
        );

        let enriched = self
            .stages
            .enrichment
            .enrich_and_migrate(EnrichAndMigrateRequest {
                workflow_id: workflow_id.to_string(),
                selected_template: template.clone(),
                form: workflow.client.clone(),
                domain: None,
                sanity: credentials.clone(),
            })
            .await;
        let project = match (enriched.success, enriched.astro_project) {
            (true, Some(project)) => project,
            _ => {
                return Err(PipelineError::General(format!(
                    "Enrichissement échoué: {}",
                    enriched.error.unwrap_or_default()
                )))
            }
        };
        self.events.emit(
            workflow_id,
            EventKind::EnrichmentFinished,
            json!({ "performance": enriched.performance }),
        );

        let workflow = self.store.update_status(workflow_id, WorkflowStatus::Deploying).await?;
        let deployer = self.stages.deployer.as_ref().ok_or_else(|| {
            PipelineError::Config("Configuration Cloudflare manquante (CLOUDFLARE_ACCOUNT_ID, CLOUDFLARE_API_TOKEN)".to_string())
        })?;
        let build = self.stages.astro_build.build(&project).await?;
        let deployment = deployer
            .deploy(&DeploymentRequest {
                site: SiteInfo::from_workflow(&workflow),
                output_dir: build.output_dir,
                sanity: credentials.as_ref().map(|c| SanityDeployConfig {
                    project_id: c.project_id.clone(),
                    dataset: Some(c.dataset.clone()),
                    api_version: Some(c.api_version.clone()),
                }),
            })
            .await?;

        let final_url = deployment
            .url
            .clone()
            .unwrap_or_else(|| format!("https://{}.pages.dev", deployment.project_name));
        let update = WorkflowUpdate {
            final_url: Some(final_url.clone()),
            deployment_id: deployment.deployment_id.clone(),
            completed_at: Some(Utc::now()),
            ..WorkflowUpdate::status(WorkflowStatus::Deployed)
        };
        let workflow = self.store.update(workflow_id, update).await?;

        let total_time = (Utc::now() - workflow.created_at).num_milliseconds();
        let cms_url = workflow.cms_url();
        info!(
            workflow_id = %workflow_id,
            url = %final_url,
            total_time_ms = total_time,
            "Workflow deployed"
        );
        self.events.emit(
            workflow_id,
            EventKind::WorkflowCompleted,
            json!({
                "productionUrl": final_url,
                "cmsUrl": cms_url,
                "totalTime": total_time,
            }),
        );

        self.send_completion_email(&workflow, &final_url).await;
        Ok(deployment)
    }

    async fn send_completion_email(&self, workflow: &Workflow, production_url: &str) {
        let client_name = workflow
            .client
            .extra_str("contactName")
            .unwrap_or(&workflow.client.business_name);
        let cms_url = workflow.cms_url();
        match self
            .stages
            .email
            .send_completion_email(&workflow.client.email, client_name, production_url, cms_url.as_deref())
            .await
        {
            Ok(_) => self.events.emit(
                &workflow.id,
                EventKind::CompletionEmailSent,
                json!({ "to": workflow.client.email }),
            ),
            Err(e) => warn!(workflow_id = %workflow.id, error = %e, "Completion email not sent"),
        }
    }

    pub async fn workflow_status(&self, workflow_id: &str) -> Result<WorkflowResult> {
        let workflow = self.load(workflow_id).await?;
        Ok(WorkflowResult::from(&workflow))
    }

    pub async fn all_workflows(&self) -> Result<Vec<WorkflowResult>> {
        Ok(self.store.list().await?.iter().map(WorkflowResult::from).collect())
    }

    pub async fn dashboard(&self) -> Result<Dashboard> {
        let workflows = self.store.list().await?;
        let by_status = self
            .store
            .count_by_status()
            .await?
            .into_iter()
            .map(|(status, count)| (status.to_string(), count))
            .collect();
        Ok(Dashboard {
            total: workflows.len(),
            by_status,
            workflows: workflows.iter().take(DASHBOARD_LIMIT).map(WorkflowResult::from).collect(),
        })
    }

    /// Resume a stalled workflow from the stage its status points at
    ///
    /// A failed workflow with a chosen template goes back to production; otherwise it
    /// regenerates its mockups.
    pub async fn retry_workflow(self: &Arc<Self>, workflow_id: &str) -> Result<WorkflowResult> {
        let workflow = self.load(workflow_id).await?;
        info!(workflow_id = %workflow_id, status = %workflow.status, "Retrying workflow");

        let restarts_production = matches!(workflow.status, WorkflowStatus::Chosen)
            || (workflow.status == WorkflowStatus::Error && workflow.selected_template.is_some());
        if restarts_production && !self.claim_production(workflow_id) {
            return Err(PipelineError::Validation("Production déjà en cours pour ce workflow".to_string()));
        }

        match workflow.status {
            WorkflowStatus::Error if workflow.selected_template.is_some() => {
                let update = WorkflowUpdate {
                    error: Some(None),
                    ..WorkflowUpdate::status(WorkflowStatus::Chosen)
                };
                if let Err(e) = self.store.update(workflow_id, update).await {
                    self.in_production.remove(workflow_id);
                    return Err(e);
                }
                self.spawn_production(workflow_id);
            }
            WorkflowStatus::Error => {
                let orchestrator = Arc::clone(self);
                let id = workflow_id.to_string();
                tokio::spawn(async move {
                    if let Err(e) = orchestrator.generate_mockups(&id).await {
                        warn!(workflow_id = %id, error = %e, "Mockup retry ended with an error");
                    }
                });
            }
            WorkflowStatus::MockupsReady => {
                let orchestrator = Arc::clone(self);
                let id = workflow_id.to_string();
                tokio::spawn(async move {
                    if let Err(e) = orchestrator.send_proposal_email(&id).await {
                        warn!(workflow_id = %id, error = %e, "Email retry ended with an error");
                    }
                });
            }
            WorkflowStatus::Chosen => self.spawn_production(workflow_id),
            other => {
                return Err(PipelineError::Validation(format!(
                    "Aucune reprise possible depuis le statut {}",
                    other
                )))
            }
        }

        self.workflow_status(workflow_id).await
    }
}

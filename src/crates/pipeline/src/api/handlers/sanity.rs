//! Sanity CMS integration endpoints

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::deployment::troubleshooting;
use crate::api::{
    error::{ApiError, ApiResult},
    middleware::{require, require_query},
    response,
    routes::AppState,
};
use crate::sanity::integration::PublicCredentials;
use crate::sanity::{ContentUpdates, MigrationOptions, ProjectSummary, SanityProjectSetup};

const INTEGRATION_TROUBLESHOOTING: [&str; 3] = [
    "Vérifier SANITY_MANAGEMENT_TOKEN et SANITY_ORGANIZATION_ID",
    "Contrôler le quota de projets de l'organisation Sanity",
    "Relancer l'intégration avec l'action retry",
];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntegrationRequest {
    pub workflow_id: Option<String>,
    pub selected_template: Option<String>,
    pub options: MigrationOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntegrationQuery {
    pub workflow_id: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntegrationAction {
    pub workflow_id: Option<String>,
    pub action: Option<String>,
    pub updates: Option<ContentUpdates>,
}

/// A stored project without its write token
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    pub project_id: String,
    pub business_name: String,
    pub business_type: String,
    pub selected_template: String,
    pub domain: String,
    pub credentials: PublicCredentials,
    pub schemas: Vec<String>,
    pub webhooks: Vec<String>,
    pub status: String,
    pub simulated: bool,
    pub created_at: chrono::DateTime<Utc>,
    pub last_sync: Option<chrono::DateTime<Utc>>,
}

impl From<SanityProjectSetup> for ProjectView {
    fn from(setup: SanityProjectSetup) -> Self {
        let credentials = setup.credentials;
        Self {
            project_id: credentials.project_id.clone(),
            business_name: setup.brief.business_name,
            business_type: setup.brief.business_type,
            selected_template: setup.brief.selected_template,
            domain: setup.brief.domain,
            simulated: credentials.simulated,
            credentials: PublicCredentials {
                project_id: credentials.project_id,
                dataset: credentials.dataset,
                studio_url: credentials.studio_url,
                cdn_url: credentials.cdn_url,
            },
            schemas: setup.schemas,
            webhooks: setup.webhooks,
            status: setup.status,
            created_at: setup.created_at,
            last_sync: setup.last_sync,
        }
    }
}

#[derive(Debug, Serialize)]
struct ProjectList {
    projects: Vec<ProjectSummary>,
    total: usize,
}

/// Provision the CMS for the template the client picked
///
/// POST /api/workflow/sanity-integration
pub async fn integrate_sanity(
    State(app_state): State<AppState>,
    Json(req): Json<IntegrationRequest>,
) -> ApiResult<impl IntoResponse> {
    const MISSING: &str = "Données requises manquantes: workflowId, selectedTemplate";
    let workflow_id = require(req.workflow_id.as_deref(), MISSING)?;
    let template = require(req.selected_template.as_deref(), MISSING)?;
    let sanity = &app_state.services.sanity;

    let result = sanity
        .integrate_after_template_choice(workflow_id, template, req.options)
        .await?;
    if !result.success {
        return Err(ApiError::Upstream {
            message: format!(
                "Échec de l'intégration Sanity: {}",
                result.error.as_deref().unwrap_or("erreur inconnue")
            ),
            troubleshooting: troubleshooting(&INTEGRATION_TROUBLESHOOTING),
        });
    }

    let handoff = match sanity.generate_astro_handoff(workflow_id).await {
        Ok(handoff) => Some(handoff),
        Err(e) => {
            tracing::warn!(workflow_id = %workflow_id, error = %e, "Astro handoff unavailable");
            None
        }
    };
    let ready = handoff.is_some();
    let studio_url = result.credentials.as_ref().map(|c| c.studio_url.clone());
    let status_endpoint = format!("/api/sanity/projects/{}", result.project_id);

    Ok(response::created(json!({
        "workflowId": workflow_id,
        "integration": result,
        "handoff": {
            "astro": handoff,
            "readyForNextStep": ready,
        },
        "monitoring": {
            "sanityStudioUrl": studio_url,
            "statusEndpoint": status_endpoint,
        },
        "integratedAt": Utc::now(),
    })))
}

/// Integration status, Astro handoff (`action=handoff`) or overall stats (`action=stats`)
///
/// GET /api/workflow/sanity-integration?workflowId=
pub async fn sanity_integration_status(
    State(app_state): State<AppState>,
    Query(query): Query<IntegrationQuery>,
) -> ApiResult<axum::response::Response> {
    let sanity = &app_state.services.sanity;
    if query.action.as_deref() == Some("stats") {
        return Ok(response::ok(sanity.integration_stats()).into_response());
    }

    let workflow_id = require_query(&query.workflow_id, "WorkflowId requis")?;
    match query.action.as_deref() {
        Some("handoff") => {
            let handoff = sanity.generate_astro_handoff(&workflow_id).await?;
            Ok(response::ok(json!({
                "workflowId": workflow_id,
                "handoff": handoff,
                "generatedAt": Utc::now(),
            }))
            .into_response())
        }
        _ => {
            let status = sanity.integration_status(&workflow_id).await?;
            Ok(response::ok(json!({
                "workflowId": workflow_id,
                "status": status,
                "checkedAt": Utc::now(),
            }))
            .into_response())
        }
    }
}

/// `retry`, `update-content` or `cleanup` on a workflow's integration
///
/// PUT /api/workflow/sanity-integration
pub async fn update_sanity_integration(
    State(app_state): State<AppState>,
    Json(req): Json<IntegrationAction>,
) -> ApiResult<axum::response::Response> {
    const MISSING: &str = "WorkflowId et action requis";
    let workflow_id = require(req.workflow_id.as_deref(), MISSING)?;
    let action = require(req.action.as_deref(), MISSING)?;
    let sanity = &app_state.services.sanity;

    let reply = match action {
        "retry" => {
            let result = sanity.retry_integration(workflow_id).await?;
            response::outcome(result.success, json!({ "action": action, "workflowId": workflow_id, "result": result }))
                .into_response()
        }
        "update-content" => {
            let updates = req
                .updates
                .ok_or_else(|| ApiError::BadRequest("Données de mise à jour requises".to_string()))?;
            let result = sanity.update_sanity_content(workflow_id, updates).await?;
            response::outcome(result.success, json!({ "action": action, "workflowId": workflow_id, "result": result }))
                .into_response()
        }
        "cleanup" => {
            let result = sanity.cleanup_workflow_sanity(workflow_id).await;
            response::outcome(result.success, json!({ "action": action, "workflowId": workflow_id, "result": result }))
                .into_response()
        }
        other => return Err(ApiError::BadRequest(format!("Action inconnue: {}", other))),
    };
    Ok(reply)
}

/// GET /api/sanity/projects
pub async fn list_sanity_projects(State(app_state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let projects = app_state.services.sanity.setup().list_projects().await?;
    let total = projects.len();
    Ok(response::ok(ProjectList { projects, total }))
}

/// GET /api/sanity/projects/:id
pub async fn get_sanity_project(
    State(app_state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let setup = app_state.services.sanity.setup();
    let project = setup
        .load_project(&project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Projet Sanity non trouvé: {}", project_id)))?;
    let status = setup.project_status(&project_id).await;

    Ok(response::ok(json!({
        "project": ProjectView::from(project),
        "status": status,
    })))
}

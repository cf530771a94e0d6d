//! Enrichment endpoints
//!
//! `start` returns as soon as the request is validated; progress is polled through
//! `status` or followed on the workflow event stream.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::api::{
    error::{ApiError, ApiResult},
    middleware::require_query,
    response,
    routes::AppState,
};
use crate::domain::{ClientFormData, EventKind};
use crate::enrich_migrate::{estimate_enrichment_duration, validate_request, EnrichAndMigrateRequest};

const START_NEXT_STEPS: [&str; 4] = [
    "Génération du contenu enrichi avec DeepSeek AI",
    "Mapping du contenu sur le template sélectionné",
    "Conversion vers projet Astro + Sanity",
    "Préparation pour déploiement Cloudflare Pages",
];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkflowQuery {
    pub workflow_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreviewRequest {
    pub workflow_id: Option<String>,
    #[serde(alias = "businessInfo")]
    pub form_data: ClientFormData,
}

fn preview_errors(form: &ClientFormData) -> Vec<String> {
    let mut errors = Vec::new();
    if form.business_name.trim().is_empty() {
        errors.push("Nom de l'entreprise requis".to_string());
    }
    if form.business_type.trim().is_empty() {
        errors.push("Type d'activité requis".to_string());
    }
    if form.ville.trim().is_empty() {
        errors.push("Ville requise".to_string());
    }
    errors
}

/// POST /api/enrichment/start
pub async fn start_enrichment(
    State(app_state): State<AppState>,
    Json(req): Json<EnrichAndMigrateRequest>,
) -> ApiResult<impl IntoResponse> {
    let errors = validate_request(&req);
    if !errors.is_empty() {
        return Err(ApiError::InvalidData {
            message: "Données invalides".to_string(),
            details: errors,
        });
    }

    let workflow_id = req.workflow_id.clone();
    let estimated_duration = estimate_enrichment_duration(&req.form);
    let enrichment = app_state.services.enrichment.clone();
    tokio::spawn(async move {
        let result = enrichment.enrich_and_migrate(req).await;
        if !result.success {
            tracing::warn!(workflow_id = %result.workflow_id, error = ?result.error, "Background enrichment failed");
        }
    });

    Ok(response::accepted(json!({
        "message": "Enrichissement démarré avec succès",
        "workflowId": workflow_id,
        "status": EventKind::EnrichmentStarted.as_str(),
        "estimatedDuration": estimated_duration,
        "nextSteps": START_NEXT_STEPS,
        "statusEndpoint": format!("/api/enrichment/status?workflowId={}", workflow_id),
    })))
}

/// GET /api/enrichment/status
pub async fn enrichment_status(
    State(app_state): State<AppState>,
    Query(query): Query<WorkflowQuery>,
) -> ApiResult<impl IntoResponse> {
    let workflow_id = require_query(&query.workflow_id, "WorkflowId requis")?;
    let status = app_state.services.enrichment.enrichment_status(&workflow_id);
    Ok(response::ok(json!({
        "workflowId": workflow_id,
        "status": status,
    })))
}

/// POST /api/enrichment/preview
pub async fn preview_enrichment(
    State(app_state): State<AppState>,
    Json(req): Json<PreviewRequest>,
) -> ApiResult<impl IntoResponse> {
    let errors = preview_errors(&req.form_data);
    if !errors.is_empty() {
        return Err(ApiError::InvalidData {
            message: "Données invalides pour aperçu".to_string(),
            details: errors,
        });
    }

    let preview = app_state
        .services
        .enrichment
        .generate_content_preview(&req.form_data, req.workflow_id.as_deref())
        .await;
    Ok(response::ok(preview))
}

/// Rerun a failed enrichment with its recorded request
///
/// POST /api/enrichment/retry, with `workflowId` in the body or the query
pub async fn retry_enrichment(
    State(app_state): State<AppState>,
    Query(query): Query<WorkflowQuery>,
    body: Option<Json<WorkflowQuery>>,
) -> ApiResult<impl IntoResponse> {
    let from_body = body.and_then(|Json(b)| b.workflow_id);
    let workflow_id = require_query(&from_body.or(query.workflow_id), "workflowId est requis")?;
    let enrichment = &app_state.services.enrichment;

    let current = enrichment.enrichment_status(&workflow_id);
    if current.status == EventKind::EnrichmentCompleted.as_str() {
        return Err(ApiError::Conflict(
            "L'enrichissement est déjà terminé avec succès".to_string(),
        ));
    }
    if current.status != EventKind::EnrichmentFailed.as_str() && current.status != "unknown" {
        return Err(ApiError::Conflict(
            "L'enrichissement ne peut être relancé que s'il a échoué".to_string(),
        ));
    }

    let result = enrichment.retry_enrichment(&workflow_id).await?;
    Ok(response::outcome(result.success, result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_request_accepts_business_info() {
        let req: PreviewRequest = serde_json::from_value(json!({
            "workflowId": "wf-1",
            "businessInfo": { "businessName": "Leroy", "businessType": "plombier", "ville": "Lyon" }
        }))
        .unwrap();
        assert!(preview_errors(&req.form_data).is_empty());
        assert_eq!(req.workflow_id.as_deref(), Some("wf-1"));
    }

    #[test]
    fn test_preview_errors_list_missing_fields() {
        let errors = preview_errors(&ClientFormData::default());
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&"Ville requise".to_string()));
    }
}

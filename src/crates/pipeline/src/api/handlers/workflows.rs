//! Workflow intake, client selection and progress endpoints

use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::Stream;
use serde::Deserialize;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};

use crate::api::{
    error::{ApiError, ApiResult},
    middleware::require,
    response,
    routes::AppState,
};
use crate::domain::ClientFormData;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRequest {
    #[serde(alias = "selectedTemplate", alias = "templateId")]
    pub template: Option<String>,
}

/// Register a client form and start mockup generation
///
/// POST /api/workflows
pub async fn create_workflow(
    State(app_state): State<AppState>,
    Json(form): Json<ClientFormData>,
) -> ApiResult<impl IntoResponse> {
    let missing = form.validate();
    if !missing.is_empty() {
        return Err(ApiError::InvalidData {
            message: "Données du formulaire incomplètes".to_string(),
            details: missing.into_iter().map(|field| format!("{} requis", field)).collect(),
        });
    }

    let result = app_state.services.orchestrator.initialize_workflow(form).await?;
    tracing::info!(workflow_id = %result.workflow_id, "Workflow created");
    Ok(response::created(result))
}

/// GET /api/workflows
pub async fn list_workflows(State(app_state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let dashboard = app_state.services.orchestrator.dashboard().await?;
    Ok(response::ok(dashboard))
}

/// GET /api/workflows/:id
pub async fn get_workflow(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let status = app_state.services.orchestrator.workflow_status(&id).await?;
    Ok(response::ok(status))
}

/// Record the template the client picked and start production
///
/// POST /api/workflows/:id/selection
pub async fn select_template(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SelectionRequest>,
) -> ApiResult<impl IntoResponse> {
    let template = require(req.template.as_deref(), "Template requis")?;
    let result = app_state
        .services
        .orchestrator
        .handle_client_selection(&id, template)
        .await?;
    Ok(response::accepted(result))
}

/// POST /api/workflows/:id/retry
pub async fn retry_workflow(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let result = app_state.services.orchestrator.retry_workflow(&id).await?;
    Ok(response::accepted(result))
}

/// Server-sent events for one workflow
///
/// GET /api/workflows/:id/events
pub async fn workflow_events(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let orchestrator = &app_state.services.orchestrator;
    orchestrator.workflow_status(&id).await?;

    let receiver = orchestrator.subscribe();
    let stream = BroadcastStream::new(receiver).filter_map(move |item| {
        // Lagged receivers skip the missed events
        let event = item.ok()?;
        if event.workflow_id != id {
            return None;
        }
        Event::default()
            .event(event.kind.as_str())
            .id(event.id.to_string())
            .json_data(&event)
            .ok()
            .map(Ok)
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

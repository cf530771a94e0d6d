//! Post-deployment monitoring endpoints

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::api::{
    error::ApiResult,
    middleware::{require, require_query},
    response,
    routes::AppState,
};
use crate::deploy::MonitoringConfig;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitoringQuery {
    pub url: Option<String>,
    pub deployment_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StartMonitoringRequest {
    pub deployment_id: Option<String>,
    pub url: Option<String>,
    pub config: Option<MonitoringConfig>,
}

/// One full monitoring report
///
/// GET /api/deployment/status?url=&deploymentId=
pub async fn run_monitoring(
    State(app_state): State<AppState>,
    Query(query): Query<MonitoringQuery>,
) -> ApiResult<impl IntoResponse> {
    let url = require_query(&query.url, "URL requise")?;
    let deployment_id = query
        .deployment_id
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| format!("check-{}", chrono::Utc::now().timestamp_millis()));

    let monitor = &app_state.services.monitor;
    let mut config = monitor.default_config().clone();
    config.continuous_monitoring = false;

    let report = monitor.monitor(&deployment_id, &url, Some(config)).await?;
    Ok(response::ok(report))
}

/// Report now, then keep checking on the configured interval
///
/// POST /api/deployment/status
pub async fn start_monitoring(
    State(app_state): State<AppState>,
    Json(req): Json<StartMonitoringRequest>,
) -> ApiResult<impl IntoResponse> {
    let deployment_id = require(req.deployment_id.as_deref(), "deploymentId requis")?;
    let url = require(req.url.as_deref(), "URL requise")?;

    let monitor = &app_state.services.monitor;
    let mut config = req.config.unwrap_or_else(|| monitor.default_config().clone());
    config.continuous_monitoring = true;

    let report = monitor.monitor(deployment_id, url, Some(config)).await?;
    Ok(response::ok(report))
}

/// DELETE /api/deployment/status?deploymentId=
pub async fn stop_monitoring(
    State(app_state): State<AppState>,
    Query(query): Query<MonitoringQuery>,
) -> ApiResult<impl IntoResponse> {
    let deployment_id = require_query(&query.deployment_id, "deploymentId requis")?;
    let stopped = app_state.services.monitor.stop_monitoring(&deployment_id);

    let message = if stopped {
        format!("Monitoring arrêté pour {}", deployment_id)
    } else {
        format!("Aucun monitoring actif pour {}", deployment_id)
    };
    Ok(response::ok(json!({
        "deploymentId": deployment_id,
        "stopped": stopped,
        "message": message,
        "activeMonitors": app_state.services.monitor.active_monitors(),
    })))
}

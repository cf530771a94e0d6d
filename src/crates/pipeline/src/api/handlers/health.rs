//! Health check endpoint

use axum::{extract::State, response::IntoResponse};
use serde::Serialize;

use crate::api::{response, routes::AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub platforms: PlatformStatus,
    pub active_monitors: usize,
}

/// Which platforms have credentials
#[derive(Debug, Serialize)]
pub struct PlatformStatus {
    pub netlify: bool,
    pub sanity: bool,
    pub deepseek: bool,
    pub email: bool,
    pub cloudflare: bool,
}

/// GET /health
pub async fn health(State(app_state): State<AppState>) -> impl IntoResponse {
    let services = &app_state.services;
    let config = &services.config;
    response::ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        platforms: PlatformStatus {
            netlify: config.netlify.is_configured(),
            sanity: config.sanity.is_configured(),
            deepseek: config.deepseek.is_configured(),
            email: services.email.is_configured(),
            cloudflare: services.deployer.is_some(),
        },
        active_monitors: services.monitor.active_monitors().len(),
    })
}

//! API route definitions

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::api::{handlers, middleware::cors_layer};
use crate::services::PipelineServices;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub services: PipelineServices,
}

/// Build the complete API router
pub fn create_router(services: PipelineServices) -> Router {
    let cors = cors_layer(&services.config.server.cors_origins);
    let app_state = AppState { services };

    Router::new()
        .route("/health", get(handlers::health))
        // Intake, selection and dashboard
        .route(
            "/api/workflows",
            post(handlers::create_workflow).get(handlers::list_workflows),
        )
        .route("/api/workflows/:id", get(handlers::get_workflow))
        .route("/api/workflows/:id/selection", post(handlers::select_template))
        .route("/api/workflows/:id/retry", post(handlers::retry_workflow))
        .route("/api/workflows/:id/events", get(handlers::workflow_events))
        // Deployment
        .route(
            "/api/deployment/cloudflare",
            post(handlers::deploy_site)
                .get(handlers::deployment_status)
                .delete(handlers::delete_deployment),
        )
        .route(
            "/api/deployment/domain",
            post(handlers::configure_domain)
                .get(handlers::check_domain)
                .delete(handlers::remove_domain),
        )
        .route(
            "/api/deployment/status",
            get(handlers::run_monitoring)
                .post(handlers::start_monitoring)
                .delete(handlers::stop_monitoring),
        )
        .route("/api/deployment/cache", post(handlers::purge_deployment_cache))
        .route("/api/deployment/analytics", get(handlers::deployment_analytics))
        // Enrichment
        .route("/api/enrichment/start", post(handlers::start_enrichment))
        .route("/api/enrichment/status", get(handlers::enrichment_status))
        .route("/api/enrichment/preview", post(handlers::preview_enrichment))
        .route("/api/enrichment/retry", post(handlers::retry_enrichment))
        // Emails
        .route("/api/emails/send-mockups", post(handlers::send_mockups))
        .route("/api/emails/track/open/:tracking_id", get(handlers::track_open))
        .route("/api/emails/track/click/:tracking_id", get(handlers::track_click))
        .route("/api/emails/analytics", get(handlers::email_analytics))
        // Sanity
        .route(
            "/api/workflow/sanity-integration",
            post(handlers::integrate_sanity)
                .get(handlers::sanity_integration_status)
                .put(handlers::update_sanity_integration),
        )
        .route("/api/sanity/projects", get(handlers::list_sanity_projects))
        .route("/api/sanity/projects/:id", get(handlers::get_sanity_project))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use pipeline::api::create_router;
use pipeline::config::PipelineConfig;
use pipeline::email::TrackingRecord;
use pipeline::services::PipelineServices;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

async fn setup() -> (TempDir, PipelineServices, Router) {
    let tmp = TempDir::new().unwrap();
    let mut config = PipelineConfig::default();
    config.storage.data_dir = tmp.path().join("data");
    config.storage.temp_dir = tmp.path().join("tmp");
    config.mockups.templates_dir = tmp.path().join("templates");

    let services = PipelineServices::build(config).await.unwrap();
    let router = create_router(services.clone());
    (tmp, services, router)
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, _, bytes) = send_raw(router, method, uri, body).await;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn send_raw(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, bytes.to_vec())
}

fn plombier_form() -> Value {
    json!({
        "businessName": "Plomberie Leroy",
        "businessType": "plombier",
        "email": "contact@plomberie-leroy.fr",
        "telephone": "04 78 00 00 00",
        "ville": "Lyon",
        "services": ["Dépannage", "Installation sanitaire"]
    })
}

fn tracking_record(tracking_id: &str) -> TrackingRecord {
    TrackingRecord {
        tracking_id: tracking_id.to_string(),
        workflow_id: "wf-track".to_string(),
        client_email: "jean@leroy.fr".to_string(),
        client_name: "Jean Leroy".to_string(),
        business_name: "Plomberie Leroy".to_string(),
        message_id: None,
        sent_at: Utc::now(),
        opened_at: None,
        clicked_at: None,
        open_count: 0,
        click_count: 0,
        follow_up_sent_at: None,
    }
}

#[tokio::test]
async fn test_health_reports_platforms() {
    let (_tmp, _services, router) = setup().await;

    let (status, body) = send(&router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["platforms"]["cloudflare"], false);
}

#[tokio::test]
async fn test_intake_rejects_incomplete_form() {
    let (_tmp, _services, router) = setup().await;

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/workflows",
        Some(json!({ "businessName": "Leroy" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "INVALID_DATA");
    assert!(!body["details"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_intake_creates_workflow() {
    let (_tmp, _services, router) = setup().await;

    let (status, body) = send(&router, Method::POST, "/api/workflows", Some(plombier_form())).await;
    assert_eq!(status, StatusCode::CREATED);
    let workflow_id = body["data"]["workflowId"].as_str().unwrap().to_string();

    let (status, body) = send(&router, Method::GET, &format!("/api/workflows/{}", workflow_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["workflowId"], workflow_id.as_str());

    let (status, body) = send(&router, Method::GET, "/api/workflows", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn test_unknown_workflow_is_404() {
    let (_tmp, _services, router) = setup().await;

    let (status, body) = send(&router, Method::GET, "/api/workflows/wf-missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = send(&router, Method::GET, "/api/workflows/wf-missing/events", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_selection_requires_template() {
    let (_tmp, _services, router) = setup().await;

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/workflows/wf-1/selection",
        Some(json!({ "template": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Template requis");
}

#[tokio::test]
async fn test_domain_validation_and_missing_cloudflare() {
    let (_tmp, _services, router) = setup().await;

    let (status, body) = send(&router, Method::POST, "/api/deployment/domain", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Nom du projet requis");

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/deployment/domain",
        Some(json!({ "projectName": "plomberie-leroy-123456" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Domaine requis pour un domaine personnalisé");

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/deployment/domain",
        Some(json!({ "projectName": "plomberie-leroy-123456", "type": "subdomain" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Nom de l'entreprise requis pour un sous-domaine");

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/deployment/domain",
        Some(json!({ "projectName": "plomberie-leroy-123456", "domain": "plomberie-leroy.fr" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "CONFIGURATION_ERROR");
    assert_eq!(body["message"], "Configuration Cloudflare manquante");
    assert_eq!(body["troubleshooting"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_deployment_routes_without_cloudflare() {
    let (_tmp, _services, router) = setup().await;

    let (status, body) = send(&router, Method::GET, "/api/deployment/analytics", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Nom du projet requis");

    let (status, body) = send(&router, Method::GET, "/api/deployment/cloudflare", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "CONFIGURATION_ERROR");

    let (status, body) = send(&router, Method::POST, "/api/deployment/cloudflare", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Données workflow et projet Astro requises");

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/deployment/cache",
        Some(json!({ "projectName": "plomberie-leroy-42" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "CONFIGURATION_ERROR");
}

#[tokio::test]
async fn test_purge_deployment_cache() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts/acc-1/pages/projects/plomberie-leroy-42/purge_build_cache"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "errors": [], "result": null })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let mut config = PipelineConfig::default();
    config.storage.data_dir = tmp.path().join("data");
    config.storage.temp_dir = tmp.path().join("tmp");
    config.mockups.templates_dir = tmp.path().join("templates");
    config.cloudflare.account_id = "acc-1".to_string();
    config.cloudflare.api_token = "token".to_string();
    config.cloudflare.api_base = server.uri();
    let router = create_router(PipelineServices::build(config).await.unwrap());

    let (status, body) = send(&router, Method::POST, "/api/deployment/cache", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Nom du projet requis");

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/deployment/cache",
        Some(json!({ "projectName": "plomberie-leroy-42" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["projectName"], "plomberie-leroy-42");
}

#[tokio::test]
async fn test_enrichment_start_and_status() {
    let (_tmp, _services, router) = setup().await;

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/enrichment/start",
        Some(json!({ "workflowId": "", "selectedTemplate": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Données invalides");
    assert!(!body["details"].as_array().unwrap().is_empty());

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/enrichment/start",
        Some(json!({
            "workflowId": "wf-enrich",
            "selectedTemplate": "artisan-pro",
            "formData": plombier_form()
        })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["data"]["status"], "enrichment_started");
    assert!(body["data"]["estimatedDuration"].as_u64().unwrap() > 0);
    assert_eq!(body["data"]["statusEndpoint"], "/api/enrichment/status?workflowId=wf-enrich");

    let (status, body) = send(&router, Method::GET, "/api/enrichment/status?workflowId=wf-enrich", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["workflowId"], "wf-enrich");

    let (status, _) = send(&router, Method::GET, "/api/enrichment/status", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_enrichment_retry_without_history() {
    let (_tmp, _services, router) = setup().await;

    let (status, _) = send(&router, Method::POST, "/api/enrichment/retry", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/enrichment/retry",
        Some(json!({ "workflowId": "wf-never-started" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_enrichment_preview() {
    let (_tmp, _services, router) = setup().await;

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/enrichment/preview",
        Some(json!({ "businessInfo": { "businessName": "Leroy" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"].as_array().unwrap().len(), 2);

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/enrichment/preview",
        Some(json!({ "formData": plombier_form() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["success"], true);
    assert!(body["data"]["estimatedDuration"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_send_mockups_validation() {
    let (_tmp, _services, router) = setup().await;
    let workflow = json!({
        "clientId": "client-1",
        "clientName": "Jean Leroy",
        "clientEmail": "jean@leroy.fr",
        "businessName": "Plomberie Leroy",
        "metier": "plombier",
        "ville": "Lyon",
        "requestId": "wf-1"
    });
    let mockup = json!({ "id": "m", "name": "Artisan", "url": "https://m.netlify.app", "description": "d" });

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/emails/send-mockups",
        Some(json!({ "workflow": workflow, "mockups": [mockup, mockup] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Exactement 3 mockups sont requis");

    // No provider key configured
    let (status, body) = send(
        &router,
        Method::POST,
        "/api/emails/send-mockups",
        Some(json!({ "workflow": workflow, "mockups": [mockup, mockup, mockup] })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "CONFIGURATION_ERROR");
}

#[tokio::test]
async fn test_open_pixel_and_click_redirect() {
    let (_tmp, services, router) = setup().await;
    services
        .email
        .tracking()
        .insert(tracking_record("abc123"))
        .await
        .unwrap();

    let (status, headers, bytes) = send_raw(&router, Method::GET, "/api/emails/track/open/abc123", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/gif");
    assert!(bytes.starts_with(b"GIF89a"));

    let (status, headers, _) = send_raw(
        &router,
        Method::GET,
        "/api/emails/track/click/abc123?url=https%3A%2F%2Fawema.fr%2Fclient-selection%2Fwf-track",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(headers[header::LOCATION], "https://awema.fr/client-selection/wf-track");

    let record = services.email.tracking().get("abc123").unwrap();
    assert_eq!(record.open_count, 1);
    assert_eq!(record.click_count, 1);
    assert!(record.engaged());

    let (status, body) = send(&router, Method::GET, "/api/emails/analytics?workflowId=wf-track", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["sent"], 1);
    assert_eq!(body["data"]["clicked"], 1);

    let (status, _) = send(&router, Method::GET, "/api/emails/analytics?trackingId=nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_click_rejects_non_http_target() {
    let (_tmp, _services, router) = setup().await;

    let (status, _) = send(&router, Method::GET, "/api/emails/track/click/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &router,
        Method::GET,
        "/api/emails/track/click/abc?url=javascript%3Aalert(1)",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sanity_routes() {
    let (_tmp, _services, router) = setup().await;

    let (status, body) = send(&router, Method::GET, "/api/sanity/projects", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 0);

    let (status, _) = send(&router, Method::GET, "/api/sanity/projects/unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&router, Method::POST, "/api/workflow/sanity-integration", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, _) = send(
        &router,
        Method::POST,
        "/api/workflow/sanity-integration",
        Some(json!({ "workflowId": "wf-missing", "selectedTemplate": "artisan-pro" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &router,
        Method::GET,
        "/api/workflow/sanity-integration?action=stats",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalIntegrations"], 0);

    let (status, body) = send(
        &router,
        Method::PUT,
        "/api/workflow/sanity-integration",
        Some(json!({ "workflowId": "wf-1", "action": "explode" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Action inconnue: explode");
}

#[tokio::test]
async fn test_stop_monitoring() {
    let (_tmp, _services, router) = setup().await;

    let (status, _) = send(&router, Method::DELETE, "/api/deployment/status", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&router, Method::DELETE, "/api/deployment/status?deploymentId=dep-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stopped"], false);
}

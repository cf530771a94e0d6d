//! Integration tests for the Cloudflare client using wiremock

use platforms::cloudflare::{NewDnsRecord, PagesProjectConfig, UploadFile};
use platforms::{CloudflareClient, CloudflareConfig, PlatformError};
use serde_json::json;
use std::collections::HashMap;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_client(mock_server: &MockServer) -> CloudflareClient {
    let config = CloudflareConfig::new("acc-1", "cf-token").with_api_base(mock_server.uri());
    CloudflareClient::new(config).unwrap()
}

fn envelope(result: serde_json::Value) -> serde_json::Value {
    json!({ "success": true, "errors": [], "messages": [], "result": result })
}

#[tokio::test]
async fn test_ensure_project_creates_when_missing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/accounts/acc-1/pages/projects/dupont-123456"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false,
            "errors": [{ "code": 8000007, "message": "Project not found" }],
            "result": null
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/accounts/acc-1/pages/projects"))
        .and(header("Authorization", "Bearer cf-token"))
        .and(body_partial_json(json!({
            "name": "dupont-123456",
            "production_branch": "main"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "name": "dupont-123456",
            "subdomain": "dupont-123456.pages.dev",
            "domains": ["dupont-123456.pages.dev"]
        }))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let config = PagesProjectConfig::new("dupont-123456", HashMap::new());
    let project = client.ensure_project(&config).await.unwrap();

    assert_eq!(project.name, "dupont-123456");
    assert_eq!(project.subdomain.as_deref(), Some("dupont-123456.pages.dev"));
}

#[tokio::test]
async fn test_error_message_from_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/accounts/acc-1/pages/projects/ghost"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "errors": [{ "code": 8000000, "message": "Invalid project name" }],
            "result": null
        })))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let error = client.get_project("ghost").await.unwrap_err();

    match error {
        PlatformError::Api { status, message, .. } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid project name");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_upload_deployment_multipart() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/accounts/acc-1/pages/projects/dupont-123456/deployments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "id": "dep-42",
            "url": "https://dep-42.dupont-123456.pages.dev",
            "latest_stage": { "name": "deploy", "status": "success" }
        }))))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let files = vec![
        UploadFile::new("index.html", b"<html></html>".to_vec()),
        UploadFile::new("assets/site.css", b"body{}".to_vec()),
    ];
    let deployment = client.upload_deployment("dupont-123456", files).await.unwrap();

    assert_eq!(deployment.id, "dep-42");
    assert_eq!(deployment.stage_status(), "success");

    let requests = mock_server.received_requests().await.unwrap();
    let content_type = requests[0].headers.get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data"));
}

#[tokio::test]
async fn test_upload_without_files_is_rejected() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server);

    let error = client.upload_deployment("dupont", vec![]).await.unwrap_err();
    assert!(matches!(error, PlatformError::Config(_)));
}

#[tokio::test]
async fn test_find_zone_and_create_record() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/zones"))
        .and(query_param("name", "dupont-plomberie.fr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([
            { "id": "zone-1", "name": "dupont-plomberie.fr", "status": "active" }
        ]))))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/zones/zone-1/dns_records"))
        .and(body_partial_json(json!({ "type": "CNAME", "content": "dupont-123456.pages.dev" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "id": "rec-1",
            "type": "CNAME",
            "name": "www.dupont-plomberie.fr",
            "content": "dupont-123456.pages.dev",
            "ttl": 1,
            "proxied": true,
            "created_on": "2024-03-01T10:00:00Z"
        }))))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let zone = client.find_zone("dupont-plomberie.fr").await.unwrap().unwrap();
    assert_eq!(zone.id, "zone-1");

    let record = client
        .create_dns_record(
            &zone.id,
            &NewDnsRecord::cname("www.dupont-plomberie.fr", "dupont-123456.pages.dev"),
        )
        .await
        .unwrap();
    assert_eq!(record.id, "rec-1");
    assert!(record.proxied);
}

#[tokio::test]
async fn test_unsuccessful_envelope_with_ok_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/zones/zone-1/settings/ssl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "errors": [{ "code": 1016, "message": "SSL setting not allowed on plan" }],
            "result": null
        })))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let error = client
        .patch_zone_setting("zone-1", "ssl", json!("strict"))
        .await
        .unwrap_err();

    assert!(error.to_string().contains("SSL setting not allowed"));
}

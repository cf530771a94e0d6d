//! Integration tests for the Netlify, Sanity, email and DNS-over-HTTPS clients

use platforms::{
    DohResolver, EmailClient, EmailProvider, NetlifyClient, NetlifyConfig, OutgoingEmail,
    PlatformError, SanityClient, SanityConfig,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_netlify_create_and_deploy() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sites"))
        .and(header("Authorization", "Bearer nf-token"))
        .and(body_partial_json(json!({ "name": "mockup-moderne-1" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "site-1",
            "name": "mockup-moderne-1",
            "ssl_url": "https://mockup-moderne-1.netlify.app"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/sites/site-1/deploys"))
        .and(header("Content-Type", "application/zip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "deploy-1",
            "site_id": "site-1",
            "state": "uploaded",
            "ssl_url": "https://mockup-moderne-1.netlify.app"
        })))
        .mount(&mock_server)
        .await;

    let client = NetlifyClient::new(NetlifyConfig::new("nf-token").with_api_base(mock_server.uri())).unwrap();
    let site = client.create_site("mockup-moderne-1").await.unwrap();
    let deploy = client.deploy_zip(&site.id, vec![0x50, 0x4b, 0x03, 0x04]).await.unwrap();

    assert_eq!(deploy.id, "deploy-1");
    assert_eq!(deploy.public_url(), Some("https://mockup-moderne-1.netlify.app"));
}

#[tokio::test]
async fn test_netlify_delete_missing_site_is_ok() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/sites/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = NetlifyClient::new(NetlifyConfig::new("nf-token").with_api_base(mock_server.uri())).unwrap();
    assert!(client.delete_site("gone").await.is_ok());
}

#[tokio::test]
async fn test_sanity_project_token_webhook() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2021-06-07/projects"))
        .and(body_partial_json(json!({
            "displayName": "Dupont Plomberie - plombier",
            "organizationId": "org-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "abc123",
            "displayName": "Dupont Plomberie - plombier"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v2021-06-07/projects/abc123/tokens"))
        .and(body_partial_json(json!({ "permissions": ["editor"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "tok-1",
            "key": "sk-live-123",
            "label": "awema-auto-token"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v2021-06-07/projects/abc123/hooks"))
        .and(body_partial_json(json!({ "httpMethod": "POST", "apiVersion": "2023-01-01" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "hook-1" })))
        .mount(&mock_server)
        .await;

    let config = SanityConfig::new("mgmt")
        .with_organization("org-1")
        .with_api_base(mock_server.uri());
    let client = SanityClient::new(config).unwrap();

    let project = client
        .create_project("Dupont Plomberie - plombier", json!({ "businessType": "plombier" }))
        .await
        .unwrap();
    assert_eq!(project.id, "abc123");

    let token = client.create_token(&project.id, "awema-auto-token", "editor").await.unwrap();
    assert_eq!(token.key, "sk-live-123");

    let hook = client
        .create_webhook(&project.id, "https://dupont-plomberie.fr/api/webhooks/sanity")
        .await
        .unwrap();
    assert_eq!(hook, "hook-1");
}

#[tokio::test]
async fn test_sanity_mutate_uses_project_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2021-06-07/data/mutate/production"))
        .and(header("Authorization", "Bearer project-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transactionId": "tx-1",
            "results": [{ "id": "settings", "operation": "create" }]
        })))
        .mount(&mock_server)
        .await;

    let config = SanityConfig::new("mgmt")
        .with_api_base(mock_server.uri())
        .with_data_api_base(mock_server.uri());
    let client = SanityClient::new(config).unwrap();

    let result = client
        .mutate(
            "abc123",
            "production",
            "project-token",
            vec![json!({ "createOrReplace": { "_id": "settings", "_type": "settings" } })],
        )
        .await
        .unwrap();

    assert_eq!(result.transaction_id.as_deref(), Some("tx-1"));
    assert_eq!(result.results.len(), 1);
}

#[tokio::test]
async fn test_sanity_auth_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2021-06-07/projects"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .mount(&mock_server)
        .await;

    let client = SanityClient::new(SanityConfig::new("bad").with_api_base(mock_server.uri())).unwrap();
    let error = client.create_project("x", json!({})).await.unwrap_err();
    assert!(matches!(error, PlatformError::Authentication { .. }));
}

fn outgoing() -> OutgoingEmail {
    OutgoingEmail {
        from_email: "noreply@awema.fr".into(),
        from_name: "AWEMA".into(),
        to: "jean@dupont-plomberie.fr".into(),
        reply_to: None,
        subject: "Vos maquettes".into(),
        html: "<p>Bonjour Jean</p>".into(),
        text: "Bonjour Jean".into(),
    }
}

#[tokio::test]
async fn test_brevo_send() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/smtp/email"))
        .and(header("api-key", "brevo-key"))
        .and(body_partial_json(json!({ "subject": "Vos maquettes" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "messageId": "<m-1@brevo>" })))
        .mount(&mock_server)
        .await;

    let client = EmailClient::new(EmailProvider::Brevo, "brevo-key", Duration::from_secs(5))
        .unwrap()
        .with_api_base(mock_server.uri());
    let receipt = client.send(&outgoing()).await.unwrap();
    assert_eq!(receipt.message_id.as_deref(), Some("<m-1@brevo>"));
}

#[tokio::test]
async fn test_sendgrid_send_reads_header_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .and(header("Authorization", "Bearer sg-key"))
        .respond_with(ResponseTemplate::new(202).insert_header("X-Message-Id", "sg-1"))
        .mount(&mock_server)
        .await;

    let client = EmailClient::new(EmailProvider::Sendgrid, "sg-key", Duration::from_secs(5))
        .unwrap()
        .with_api_base(mock_server.uri());
    let receipt = client.send(&outgoing()).await.unwrap();
    assert_eq!(receipt.message_id.as_deref(), Some("sg-1"));
}

#[tokio::test]
async fn test_doh_resolve() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/resolve"))
        .and(query_param("name", "dupont-plomberie.fr"))
        .and(query_param("type", "A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Status": 0,
            "Answer": [{ "name": "dupont-plomberie.fr.", "type": 1, "TTL": 300, "data": "192.0.2.1" }]
        })))
        .mount(&mock_server)
        .await;

    let resolver = DohResolver::new(mock_server.uri(), Duration::from_secs(5)).unwrap();
    let response = resolver.resolve("dupont-plomberie.fr", "A").await.unwrap();
    assert!(response.is_resolved());
}

//! Proposal emails and open/click tracking

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::api::{
    error::{ApiError, ApiResult},
    middleware::require,
    response,
    routes::AppState,
};
use crate::email::{MockupEmailRequest, MockupLink};

/// Transparent 1x1 GIF
static TRACKING_PIXEL: [u8; 43] = [
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff,
    0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00,
    0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
];

const REQUIRED_MOCKUPS: usize = 3;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailWorkflow {
    #[serde(alias = "requestId")]
    pub workflow_id: Option<String>,
    pub client_id: Option<String>,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub business_name: Option<String>,
    pub metier: Option<String>,
    pub ville: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailMockup {
    pub id: String,
    pub name: String,
    pub url: String,
    pub screenshot: Option<String>,
    pub description: String,
}

impl From<EmailMockup> for MockupLink {
    fn from(m: EmailMockup) -> Self {
        MockupLink {
            id: m.id,
            name: m.name,
            url: m.url,
            screenshot: m.screenshot,
            description: m.description,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SendMockupsRequest {
    pub workflow: Option<EmailWorkflow>,
    pub mockups: Vec<EmailMockup>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClickQuery {
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsQuery {
    pub workflow_id: Option<String>,
    pub tracking_id: Option<String>,
}

fn email_request(req: SendMockupsRequest) -> ApiResult<MockupEmailRequest> {
    let workflow = match req.workflow {
        Some(workflow) if !req.mockups.is_empty() => workflow,
        _ => {
            return Err(ApiError::BadRequest(
                "Données workflow et mockups requises".to_string(),
            ))
        }
    };
    const CLIENT_REQUIRED: &str = "Email et nom du client requis";
    let client_email = require(workflow.client_email.as_deref(), CLIENT_REQUIRED)?.to_string();
    let client_name = require(workflow.client_name.as_deref(), CLIENT_REQUIRED)?.to_string();
    if req.mockups.len() != REQUIRED_MOCKUPS {
        return Err(ApiError::BadRequest("Exactement 3 mockups sont requis".to_string()));
    }

    Ok(MockupEmailRequest {
        workflow_id: workflow.workflow_id.or(workflow.client_id).unwrap_or_default(),
        client_email,
        business_name: workflow.business_name.unwrap_or_else(|| client_name.clone()),
        client_name,
        metier: workflow.metier.unwrap_or_default(),
        ville: workflow.ville.unwrap_or_default(),
        mockups: req.mockups.into_iter().map(MockupLink::from).collect(),
    })
}

/// POST /api/emails/send-mockups
pub async fn send_mockups(
    State(app_state): State<AppState>,
    Json(req): Json<SendMockupsRequest>,
) -> ApiResult<impl IntoResponse> {
    let request = email_request(req)?;
    let result = app_state.services.email.send_mockups_email(&request).await?;

    tracing::info!(tracking_id = %result.tracking_id, to = %request.client_email, "Proposal email sent");
    Ok(response::ok(json!({
        "message": "Email envoyé avec succès",
        "trackingId": result.tracking_id,
        "messageId": result.message_id,
        "followUpScheduled": result.follow_up_scheduled,
        "sentAt": chrono::Utc::now(),
        "clientEmail": request.client_email,
        "mockupsCount": request.mockups.len(),
    })))
}

/// Tracking pixel; always answers with the image
///
/// GET /api/emails/track/open/:tracking_id
pub async fn track_open(State(app_state): State<AppState>, Path(tracking_id): Path<String>) -> impl IntoResponse {
    match app_state.services.email.track_open(&tracking_id).await {
        Ok(true) => {}
        Ok(false) => tracing::debug!(tracking_id = %tracking_id, "Open for unknown tracking id"),
        Err(e) => tracing::warn!(tracking_id = %tracking_id, error = %e, "Could not record open"),
    }
    (
        [
            (header::CONTENT_TYPE, "image/gif"),
            (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
        ],
        &TRACKING_PIXEL[..],
    )
}

/// Record the click and send the browser on to `url` with a 302
///
/// GET /api/emails/track/click/:tracking_id?url=
pub async fn track_click(
    State(app_state): State<AppState>,
    Path(tracking_id): Path<String>,
    Query(query): Query<ClickQuery>,
) -> ApiResult<impl IntoResponse> {
    let target = require(query.url.as_deref(), "URL de redirection requise")?.to_string();
    if !(target.starts_with("https://") || target.starts_with("http://")) {
        return Err(ApiError::BadRequest("URL de redirection invalide".to_string()));
    }

    if let Err(e) = app_state.services.email.track_click(&tracking_id).await {
        tracing::warn!(tracking_id = %tracking_id, error = %e, "Could not record click");
    }
    Ok((StatusCode::FOUND, [(header::LOCATION, target)]))
}

/// GET /api/emails/analytics
pub async fn email_analytics(
    State(app_state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> ApiResult<axum::response::Response> {
    let email = &app_state.services.email;

    if let Some(tracking_id) = query.tracking_id.filter(|t| !t.trim().is_empty()) {
        let record = email.tracking().get(&tracking_id).ok_or_else(|| {
            ApiError::NotFound("Aucune statistique trouvée pour ce tracking ID".to_string())
        })?;
        return Ok(response::ok(record).into_response());
    }

    let analytics = email.analytics(query.workflow_id.as_deref());
    Ok(response::ok(analytics).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(mockups: usize) -> SendMockupsRequest {
        let mockups: Vec<_> = (0..mockups)
            .map(|i| json!({ "id": format!("m{}", i), "name": "Artisan", "url": "https://m.netlify.app", "description": "d" }))
            .collect();
        serde_json::from_value(json!({
            "workflow": {
                "clientId": "client-1",
                "clientName": "Jean Leroy",
                "clientEmail": "jean@leroy.fr",
                "businessName": "Plomberie Leroy",
                "metier": "plombier",
                "ville": "Lyon",
                "requestId": "wf-1"
            },
            "mockups": mockups
        }))
        .unwrap()
    }

    #[test]
    fn test_email_request_from_body() {
        let req = email_request(request(3)).unwrap();
        assert_eq!(req.workflow_id, "wf-1");
        assert_eq!(req.client_name, "Jean Leroy");
        assert_eq!(req.metier, "plombier");
        assert_eq!(req.mockups.len(), 3);
    }

    #[test]
    fn test_email_request_rejections() {
        let err = email_request(request(2)).unwrap_err();
        assert_eq!(err.to_string(), "Exactement 3 mockups sont requis");

        let err = email_request(request(0)).unwrap_err();
        assert_eq!(err.to_string(), "Données workflow et mockups requises");

        let mut missing_email = request(3);
        if let Some(w) = missing_email.workflow.as_mut() {
            w.client_email = None;
        }
        let err = email_request(missing_email).unwrap_err();
        assert_eq!(err.to_string(), "Email et nom du client requis");
    }

    #[test]
    fn test_pixel_is_a_gif() {
        assert_eq!(&TRACKING_PIXEL[..6], b"GIF89a");
        assert_eq!(TRACKING_PIXEL[42], 0x3b);
    }
}

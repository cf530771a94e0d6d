//! API error types and HTTP response conversion
//!
//! Pipeline errors are mapped onto status codes here so handlers can use `?` on
//! every service call.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::PipelineError;

/// Error body returned by every failing route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Always false
    pub success: bool,
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for programmatic handling
    pub code: String,
    /// Field-level problems, when the request was rejected as a whole
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
    /// Steps the operator can take to fix the failure
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub troubleshooting: Vec<String>,
}

impl ApiErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            message: message.into(),
            code: code.into(),
            details: Vec::new(),
            troubleshooting: Vec::new(),
        }
    }
}

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// Missing or malformed parameter
    #[error("{0}")]
    BadRequest(String),

    /// Request rejected with one message per problem
    #[error("{message}")]
    InvalidData { message: String, details: Vec<String> },

    /// Well-formed request the workflow cannot accept in its current state
    #[error("{0}")]
    ValidationError(String),

    /// Operation already done or still running
    #[error("{0}")]
    Conflict(String),

    /// Platform credentials are missing
    #[error("{message}")]
    Misconfigured { message: String, troubleshooting: Vec<String> },

    /// A platform call failed while serving the request
    #[error("{message}")]
    Upstream { message: String, troubleshooting: Vec<String> },

    /// Internal server error
    #[error("{0}")]
    InternalError(String),

    /// Pipeline service error
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::InvalidData { .. } | ApiError::JsonError(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Misconfigured { .. } | ApiError::Upstream { .. } | ApiError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Pipeline(err) => match err {
                PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
                PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
                PipelineError::InvalidStateTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                PipelineError::Platform(e) if e.is_not_found() => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::InvalidData { .. } => "INVALID_DATA",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Misconfigured { .. } => "CONFIGURATION_ERROR",
            ApiError::Upstream { .. } => "UPSTREAM_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::JsonError(_) => "JSON_ERROR",
            ApiError::Pipeline(err) => match err {
                PipelineError::Validation(_) => "VALIDATION_ERROR",
                PipelineError::NotFound(_) => "NOT_FOUND",
                PipelineError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
                PipelineError::Config(_) => "CONFIGURATION_ERROR",
                PipelineError::Platform(e) if e.is_not_found() => "PLATFORM_NOT_FOUND",
                PipelineError::Platform(_) => "PLATFORM_ERROR",
                PipelineError::Llm(_) => "LLM_ERROR",
                PipelineError::Timeout(_) => "TIMEOUT",
                PipelineError::Build(_) => "BUILD_ERROR",
                _ => "INTERNAL_ERROR",
            },
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NotFound",
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::InvalidData { .. } => "InvalidData",
            ApiError::ValidationError(_) => "ValidationError",
            ApiError::Conflict(_) => "Conflict",
            ApiError::Misconfigured { .. } => "ConfigurationError",
            ApiError::Upstream { .. } => "UpstreamError",
            ApiError::InternalError(_) => "InternalError",
            ApiError::JsonError(_) => "JsonError",
            ApiError::Pipeline(err) => match err {
                PipelineError::Validation(_) => "ValidationError",
                PipelineError::NotFound(_) => "NotFound",
                PipelineError::InvalidStateTransition { .. } => "InvalidStateTransition",
                PipelineError::Config(_) => "ConfigurationError",
                PipelineError::Platform(_) => "PlatformError",
                _ => "PipelineError",
            },
        }
    }

    fn into_body(self) -> ApiErrorResponse {
        let mut body = ApiErrorResponse::new(self.error_type(), self.to_string(), self.code());
        match self {
            ApiError::InvalidData { details, .. } => body.details = details,
            ApiError::Misconfigured { troubleshooting, .. } | ApiError::Upstream { troubleshooting, .. } => {
                body.troubleshooting = troubleshooting
            }
            _ => {}
        }
        body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.into_body();

        if status.is_server_error() {
            tracing::error!(code = %body.code, message = %body.message, "API error");
        } else {
            tracing::debug!(code = %body.code, message = %body.message, "Request rejected");
        }

        (status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::JsonError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let err = ApiError::NotFound("Workflow non trouvé".to_string());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "NOT_FOUND");
        assert_eq!(err.error_type(), "NotFound");
    }

    #[test]
    fn test_pipeline_errors_map_to_status() {
        let cases = [
            (PipelineError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (PipelineError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                PipelineError::InvalidStateTransition {
                    from: "sent".into(),
                    to: "deployed".into(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (PipelineError::Config("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (PipelineError::General("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_conflict_error() {
        let err = ApiError::Conflict("déjà terminé".to_string());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "CONFLICT");
    }

    #[test]
    fn test_body_carries_troubleshooting() {
        let err = ApiError::Misconfigured {
            message: "Configuration Cloudflare manquante".to_string(),
            troubleshooting: vec!["Définir CLOUDFLARE_API_TOKEN".to_string()],
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = err.into_body();
        assert!(!body.success);
        assert_eq!(body.code, "CONFIGURATION_ERROR");
        assert_eq!(body.message, "Configuration Cloudflare manquante");
        assert_eq!(body.troubleshooting.len(), 1);

        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_invalid_data_keeps_details() {
        let body = ApiError::InvalidData {
            message: "Données invalides".to_string(),
            details: vec!["Email requis".to_string(), "Ville requise".to_string()],
        }
        .into_body();
        assert_eq!(body.details.len(), 2);
        assert_eq!(body.code, "INVALID_DATA");
    }
}

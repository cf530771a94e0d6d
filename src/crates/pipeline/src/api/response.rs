//! API response helpers

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

/// Generic success response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { success: true, data }
    }
}

/// 200 OK with `{success: true, data}`
pub fn ok<T: Serialize>(data: T) -> impl IntoResponse {
    (StatusCode::OK, Json(SuccessResponse::new(data)))
}

/// 201 Created with `{success: true, data}`
pub fn created<T: Serialize>(data: T) -> impl IntoResponse {
    (StatusCode::CREATED, Json(SuccessResponse::new(data)))
}

/// 202 Accepted, for work continuing in the background
pub fn accepted<T: Serialize>(data: T) -> impl IntoResponse {
    (StatusCode::ACCEPTED, Json(SuccessResponse::new(data)))
}

/// Domain results that report their own `success` flag keep it in the envelope
pub fn outcome<T: Serialize>(success: bool, data: T) -> impl IntoResponse {
    let status = if success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(SuccessResponse { success, data }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response_serializes_flag() {
        let json = serde_json::to_value(SuccessResponse::new(vec![1, 2])).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"][1], 2);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(created(()).into_response().status(), StatusCode::CREATED);
        assert_eq!(accepted(()).into_response().status(), StatusCode::ACCEPTED);
        assert_eq!(
            outcome(false, ()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

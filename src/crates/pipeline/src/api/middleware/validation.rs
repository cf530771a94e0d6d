//! Presence checks for request fields
//!
//! Messages are shown to the operator as-is, hence French.

use crate::api::error::{ApiError, ApiResult};

/// Trimmed value of a required body field, or 400 with `message`
pub fn require<'a>(value: Option<&'a str>, message: &str) -> ApiResult<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::BadRequest(message.to_string())),
    }
}

/// Same as [`require`] for an owned query parameter
pub fn require_query(value: &Option<String>, message: &str) -> ApiResult<String> {
    require(value.as_deref(), message).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_rejects_blank() {
        assert!(require(None, "Nom du projet requis").is_err());
        assert!(require(Some("   "), "Nom du projet requis").is_err());
        assert_eq!(require(Some(" awema-site "), "x").unwrap(), "awema-site");
    }

    #[test]
    fn test_require_query_message() {
        let err = require_query(&None, "WorkflowId requis").unwrap_err();
        assert_eq!(err.to_string(), "WorkflowId requis");
    }
}

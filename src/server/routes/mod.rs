//! HTTP route modules
//!
//! Route handlers organized by functionality, sharing the standard
//! response envelope.

pub mod bulk;
pub mod health;
pub mod operations;

use crate::server::state::AppState;
use crate::storage::AdminContext;
use crate::utils::error::{Result, ServiceError};
use actix_web::HttpRequest;

/// Standard API response structure
#[derive(Debug, Clone, serde::Serialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (if successful)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Additional metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl<T> ApiResponse<T>
where
    T: serde::Serialize,
{
    /// Create a successful response
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: None,
        }
    }
}

impl<T> ApiResponse<T> {
    /// Create an error response
    pub fn error(message: String) -> ApiResponse<T> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
            meta: None,
        }
    }

    /// Create an error response with metadata
    pub fn error_with_meta(message: String, meta: serde_json::Value) -> ApiResponse<T> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
            meta: Some(meta),
        }
    }
}

/// Verify the request carries a valid admin bearer token
pub async fn require_admin(req: &HttpRequest, state: &AppState) -> Result<AdminContext> {
    let token = bearer_token(req)
        .ok_or_else(|| ServiceError::unauthorized("Missing bearer token"))?;
    state.sessions.verify_token(token).await
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(actix_web::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse::success("test data");
        assert!(response.success);
        assert_eq!(response.data, Some("test data"));
        assert!(response.error.is_none());
    }

    #[test]
    fn test_api_response_error() {
        let response = ApiResponse::<()>::error("test error".to_string());
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.error, Some("test error".to_string()));
    }

    #[test]
    fn test_error_with_meta_serializes_meta() {
        let response = ApiResponse::<()>::error_with_meta(
            "not found".to_string(),
            serde_json::json!({ "tracked_operations": ["op_1"] }),
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["meta"]["tracked_operations"][0], "op_1");
    }
}

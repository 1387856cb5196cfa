//! Error types and API response structures

use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// The primary error type for the server, providing:
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable messages
/// - Optional structured details (e.g. the failed collectible ids of a
///   partial allocation)
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (field-level errors, context, etc.)
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{} not found", r))
            .with_detail("resource", r)
    }

    /// Create an unauthorized error
    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    /// Create an invalid credentials error
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials)
    }

    /// Create an invalid token error
    pub fn invalid_token() -> Self {
        Self::new(ErrorCode::TokenInvalid)
    }

    /// Create a forbidden/ownership error
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::PermissionDenied, msg)
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::AlreadyExists, msg)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }

    /// Create a not-cancellable error with the eligibility reason
    pub fn not_cancellable(reason: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::OrderNotCancellable, reason)
    }

    /// Create a partial allocation error carrying the failed collectible ids
    pub fn partial_allocation(failed: Vec<String>) -> Self {
        Self::new(ErrorCode::PartialAllocation).with_detail(
            "failed",
            Value::Array(failed.into_iter().map(Value::String).collect()),
        )
    }
}

/// Unified API response envelope
///
/// All HTTP responses follow this shape:
/// - `success`: whether the request succeeded
/// - `data`: payload (present on success)
/// - `error`: human-readable message (present on failure)
/// - `code`: numeric error code (present on failure)
/// - details are flattened into the envelope (e.g. `failed` on a partial
///   allocation conflict)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(flatten)]
    pub details: Option<HashMap<String, Value>>,
}

impl<T> ApiResponse<T> {
    /// Create a success response with data
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
            details: None,
        }
    }
}

impl ApiResponse<()> {
    /// Create a success response without data
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            code: None,
            details: None,
        }
    }

    /// Create an error response from an AppError
    pub fn error(err: &AppError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.message.clone()),
            code: Some(err.code.code()),
            details: err.details.clone(),
        }
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

// ===== Axum Integration =====

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        let status = self.http_status();
        let body = ApiResponse::error(&self);

        // Log system errors
        if matches!(self.code.category(), super::category::ErrorCategory::System) {
            tracing::error!(
                code = %self.code,
                message = %self.message,
                "System error occurred"
            );
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::NoCapacity);
        assert_eq!(err.code, ErrorCode::NoCapacity);
        assert_eq!(
            err.message,
            "No available units found for the selected collectible"
        );
        assert!(err.details.is_none());
    }

    #[test]
    fn test_app_error_with_detail() {
        let err = AppError::validation("Missing required fields")
            .with_detail("field", "email")
            .with_detail("reason", "required");

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let details = err.details.unwrap();
        assert_eq!(details.get("field").unwrap(), "email");
        assert_eq!(details.get("reason").unwrap(), "required");
    }

    #[test]
    fn test_partial_allocation_details() {
        let err = AppError::partial_allocation(vec!["col-002".into()]);
        let details = err.details.as_ref().unwrap();
        assert_eq!(
            details.get("failed").unwrap(),
            &serde_json::json!(["col-002"])
        );
        assert_eq!(err.http_status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_api_response_success_serialize() {
        let response = ApiResponse::success(42);
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"data\":42"));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_api_response_error_serialize() {
        let err = AppError::partial_allocation(vec!["col-002".into()]);
        let response = ApiResponse::error(&err);
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("\"code\":7004"));
        // Details are flattened to the top level of the envelope
        assert!(json.contains("\"failed\":[\"col-002\"]"));
    }

    #[test]
    fn test_api_response_deserialize() {
        let json = r#"{"success":true,"data":42}"#;
        let response: ApiResponse<i32> = serde_json::from_str(json).unwrap();
        assert!(response.success);
        assert_eq!(response.data, Some(42));
    }
}

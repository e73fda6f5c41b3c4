//! AppError and the JSON envelope every endpoint answers with

use super::category::ErrorCategory;
use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

type Details = HashMap<String, Value>;

/// Coded error surfaced to API callers
///
/// Rejected hub commands carry the conflicting timeline event in `details`
/// (see [`AppError::with_event`]) so the scanner UI can show what happened
/// and when.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<Details>,
}

impl AppError {
    /// Error carrying the code's stock message
    pub fn new(code: ErrorCode) -> Self {
        Self::with_message(code, code.message())
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(Details::new)
            .insert(key.into(), value.into());
        self
    }

    /// Attach the timeline event that made a command conflict
    pub fn with_event(self, event_type: &str, hub_id: i64, sequence: u64) -> Self {
        self.with_detail("event_type", event_type)
            .with_detail("hub_id", hub_id)
            .with_detail("sequence", sequence)
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// `"{resource} not found"`, with the resource echoed in details
    pub fn not_found(resource: impl Into<String>) -> Self {
        let resource = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{resource} not found"))
            .with_detail("resource", resource)
    }

    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidOperation, msg)
    }
}

/// Response envelope
///
/// Success: `{"code": 0, "message": "OK", "data": ...}`.
/// Failure: `{"code": 4005, "message": "...", "details": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Details>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: Some(ErrorCode::Success.code()),
            message: "OK".to_string(),
            data: Some(data),
            details: None,
        }
    }

    /// Failure envelope; `data` stays empty
    pub fn error(err: &AppError) -> Self {
        err.clone().into()
    }

    /// HTTP status implied by `code`
    fn status(&self) -> StatusCode {
        match self.code {
            None | Some(0) => StatusCode::OK,
            Some(raw) => ErrorCode::try_from(raw)
                .map(|c| c.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

impl<T> From<AppError> for ApiResponse<T> {
    fn from(err: AppError) -> Self {
        Self {
            code: Some(err.code.code()),
            message: err.message,
            data: None,
            details: err.details,
        }
    }
}

/// Result alias used by every handler
pub type AppResult<T> = Result<T, AppError>;

// ===== Axum Integration =====

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if self.code.category() == ErrorCategory::System {
            tracing::error!(code = %self.code, message = %self.message, "System error returned to client");
        }
        ApiResponse::<()>::from(self).into_response()
    }
}

impl<T: Serialize> axum::response::IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        (self.status(), axum::Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_stock_message() {
        let err = AppError::new(ErrorCode::AlreadyDispatched);
        assert_eq!(err.message, "Order was already dispatched from this hub");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_with_event_records_conflict() {
        let err = AppError::with_message(ErrorCode::AlreadyDispatched, "left Ernakulam")
            .with_event("IN_TRANSIT", 8, 7);

        assert_eq!(err.http_status(), StatusCode::CONFLICT);
        let details = err.details.unwrap();
        assert_eq!(details["event_type"], "IN_TRANSIT");
        assert_eq!(details["hub_id"], 8);
        assert_eq!(details["sequence"], 7);
    }

    #[test]
    fn test_not_found_names_resource() {
        let err = AppError::not_found("Hub 12");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Hub 12 not found");
        assert_eq!(err.details.unwrap()["resource"], "Hub 12");
    }

    #[test]
    fn test_envelope_status() {
        let ok = ApiResponse::success(42);
        assert_eq!(ok.code, Some(0));
        assert_eq!(ok.status(), StatusCode::OK);

        let err = AppError::new(ErrorCode::InsufficientStock).with_detail("available", 0);
        let failed = ApiResponse::<()>::error(&err);
        assert_eq!(failed.code, Some(6001));
        assert!(failed.data.is_none());
        assert_eq!(failed.status(), StatusCode::CONFLICT);
    }
}

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::MonodashError;

//--------------------------------------------------------------------------------------------------
// Types: Requests
//--------------------------------------------------------------------------------------------------

/// Query string of the metrics listing endpoint
#[derive(Debug, Default, Deserialize)]
pub struct MetricsParams {
    /// Lookback window in hours, defaults to 1
    pub hours: Option<i64>,
}

//--------------------------------------------------------------------------------------------------
// Types: Error Response
//--------------------------------------------------------------------------------------------------

/// Standard error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status code
    pub code: u16,

    /// Error message
    pub message: String,

    /// Error type for categorizing errors
    pub error_type: ErrorType,

    /// Optional additional details about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Types of errors that can occur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Invalid request parameters or body
    ValidationError,

    /// Resource not found
    NotFound,

    /// The request conflicts with the current state of an instance
    Conflict,

    /// Internal server errors
    InternalError,
}

/// A failed request, rendered as an [`ErrorResponse`].
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ErrorResponse {
    /// Create a new error response
    pub fn new(code: u16, message: String, error_type: ErrorType) -> Self {
        Self {
            code,
            message,
            error_type,
            details: None,
        }
    }

    /// Add details to the error response, ignoring details for 500-level errors
    pub fn with_details(mut self, details: String) -> Self {
        if self.code < 500 {
            self.details = Some(details);
        }
        self
    }
}

impl ApiError {
    /// Returns the HTTP status of the error.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn rejection(status: StatusCode, message: &str, details: String) -> Self {
        let body = ErrorResponse::new(
            status.as_u16(),
            message.to_string(),
            ErrorType::ValidationError,
        )
        .with_details(details);

        Self { status, body }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Maps a service error to its HTTP status and error category.
pub fn classify(error: &MonodashError) -> (StatusCode, ErrorType) {
    match error {
        MonodashError::NotFound(_) | MonodashError::NoTelemetryAvailable => {
            (StatusCode::NOT_FOUND, ErrorType::NotFound)
        }
        MonodashError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorType::ValidationError),
        MonodashError::NotRunning { .. }
        | MonodashError::UniquenessViolation(_)
        | MonodashError::InvalidTransition { .. }
        | MonodashError::ConcurrentModification(_) => (StatusCode::CONFLICT, ErrorType::Conflict),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, ErrorType::InternalError),
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl From<MonodashError> for ApiError {
    fn from(error: MonodashError) -> Self {
        let (status, error_type) = classify(&error);

        let body = if status.is_server_error() {
            tracing::error!(%error, "request failed");
            ErrorResponse::new(
                status.as_u16(),
                "internal server error".to_string(),
                error_type,
            )
            .with_details(error.to_string())
        } else {
            tracing::debug!(%error, status = status.as_u16(), "request rejected");
            ErrorResponse::new(status.as_u16(), error.to_string(), error_type)
        };

        Self { status, body }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match &rejection {
            JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => rejection.status(),
        };
        Self::rejection(
            status,
            "invalid request body",
            rejection.body_text(),
        )
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::rejection(
            StatusCode::BAD_REQUEST,
            "invalid path parameter",
            rejection.body_text(),
        )
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::rejection(
            StatusCode::BAD_REQUEST,
            "invalid query string",
            rejection.body_text(),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InstanceStatus, LifecycleAction};

    #[test]
    fn test_classify_service_errors() {
        let cases = [
            (MonodashError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (MonodashError::NoTelemetryAvailable, StatusCode::NOT_FOUND),
            (MonodashError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                MonodashError::NotRunning {
                    handle: 1,
                    status: InstanceStatus::Paused,
                },
                StatusCode::CONFLICT,
            ),
            (MonodashError::UniquenessViolation("x".into()), StatusCode::CONFLICT),
            (
                MonodashError::InvalidTransition {
                    handle: 1,
                    status: InstanceStatus::Stopped,
                    action: LifecycleAction::Pause,
                },
                StatusCode::CONFLICT,
            ),
            (MonodashError::ConcurrentModification(1), StatusCode::CONFLICT),
            (
                MonodashError::CorruptRecord("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(classify(&error).0, status, "{}", error);
        }
    }

    #[test]
    fn test_server_errors_hide_details() {
        let error = ApiError::from(MonodashError::CorruptRecord("row 7".into()));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.body.message, "internal server error");
        assert_eq!(error.body.details, None);

        let error = ApiError::from(MonodashError::Validation("name must not be empty".into()));
        assert_eq!(error.body.code, 400);
        assert_eq!(error.body.error_type, ErrorType::ValidationError);
        assert!(error.body.message.contains("name"));
    }
}

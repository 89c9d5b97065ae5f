//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use meshboard_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Always `false`; mirrors the `success` flag on happy-path bodies.
    pub success: bool,
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// The `[{field, message}]` list on rejected settings saves.
    #[serde(rename = "validationErrors", skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<serde_json::Value>,
    /// Optional details for non-validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Local wrapper around [`AppError`] so the crate can implement
/// [`IntoResponse`] without violating the orphan rule.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl<E: Into<AppError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        ApiError(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError(err) = self;
        let (status, error_code) = match &err.kind {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ErrorKind::Authentication => (StatusCode::UNAUTHORIZED, "AUTHENTICATION_FAILED"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ErrorKind::NotInitialized => (StatusCode::SERVICE_UNAVAILABLE, "NOT_INITIALIZED"),
            ErrorKind::Configuration => {
                tracing::error!(error = %err.message, "Configuration error");
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR")
            }
            ErrorKind::Module => (StatusCode::INTERNAL_SERVER_ERROR, "MODULE_ERROR"),
            ErrorKind::Delivery => (StatusCode::BAD_GATEWAY, "DELIVERY_FAILED"),
            ErrorKind::Serialization => (StatusCode::INTERNAL_SERVER_ERROR, "SERIALIZATION_ERROR"),
            ErrorKind::Internal => {
                tracing::error!(error = %err.message, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        // Validation details are the field-error list and get their own key.
        let (validation_errors, details) = match err.kind {
            ErrorKind::Validation => (err.details.clone(), None),
            _ => (None, err.details.clone()),
        };
        let body = ApiErrorResponse {
            success: false,
            error: error_code.to_string(),
            message: err.message.clone(),
            validation_errors,
            details,
        };

        (status, Json(body)).into_response()
    }
}

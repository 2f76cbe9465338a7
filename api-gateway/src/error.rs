//! Error handling for the API gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// API error response envelope
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,
    /// Error information
    pub error: ErrorInfo,
    /// Request ID for tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Detailed error information
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code (string identifier for the error type)
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// API errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("{0}")]
    Common(#[from] common::error::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Generate a request ID for tracking errors
        let request_id = Uuid::new_v4().to_string();

        // Log the error with request ID for backend tracing
        tracing::error!("API Error [{}]: {:?}", request_id, &self);

        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            ApiError::Common(e) => match e {
                // Client errors (4xx)
                common::error::Error::AccountNotFound(_) => {
                    (StatusCode::NOT_FOUND, "account_not_found")
                }
                common::error::Error::TransactionNotFound(_) => {
                    (StatusCode::NOT_FOUND, "transaction_not_found")
                }
                common::error::Error::AuditEntryNotFound(_) => {
                    (StatusCode::NOT_FOUND, "audit_entry_not_found")
                }
                common::error::Error::InsufficientFunds(_) => {
                    (StatusCode::BAD_REQUEST, "insufficient_funds")
                }
                common::error::Error::ValidationError(_) => {
                    (StatusCode::BAD_REQUEST, "validation_error")
                }
                common::error::Error::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
                common::error::Error::Unauthorized(_) => {
                    (StatusCode::UNAUTHORIZED, "unauthorized")
                }
                common::error::Error::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),

                // Server errors (5xx) - internals are hidden from clients
                common::error::Error::ConfigurationError(_)
                | common::error::Error::Internal(_)
                | common::error::Error::Database(_)
                | common::error::Error::Serialization(_)
                | common::error::Error::DecimalError(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
                }
            },
        };

        // Client-facing message: full detail for domain errors, generic
        // wording for anything internal
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let error_response = ErrorResponse {
            success: false,
            error: ErrorInfo {
                code: code.to_string(),
                message,
            },
            request_id: Some(request_id),
        };

        (status, Json(error_response)).into_response()
    }
}

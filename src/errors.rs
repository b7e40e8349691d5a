use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Not Found",
    "message": "Item with ID 550e8400-e29b-41d4-a716-446655440000 not found",
    "details": null,
    "request_id": "8c2f5e01-37ab-4b6e-9f0d-5a1c2e7b9d44",
    "timestamp": "2026-01-15T08:24:00.000Z"
}))]
pub struct ErrorResponse {
    /// Canonical reason for the HTTP status.
    #[schema(example = "Not Found")]
    pub error: String,
    /// What went wrong, phrased for the API caller.
    #[schema(example = "Item with ID 550e8400-e29b-41d4-a716-446655440000 not found")]
    pub message: String,
    /// Field-level detail when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Field 'sku' must not be empty")]
    pub details: Option<String>,
    /// Correlation id to quote when reporting the failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "8c2f5e01-37ab-4b6e-9f0d-5a1c2e7b9d44")]
    pub request_id: Option<String>,
    /// RFC 3339 time of the failure.
    #[schema(example = "2026-01-15T08:24:00.000Z")]
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::ValidationError(errors.to_string())
    }
}

impl From<csv::Error> for ServiceError {
    fn from(source: csv::Error) -> Self {
        Self::InternalError(format!("CSV serialization failed: {source}"))
    }
}

impl ServiceError {
    /// Single source of truth for the error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InsufficientStock(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::DatabaseError(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message for the HTTP body. Database and internal failures collapse to
    /// a fixed phrase; their detail stays in the logs.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".into(),
            Self::InternalError(_) => "Internal server error".into(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_owned(),
            message: self.response_message(),
            details: None,
            request_id: crate::tracing::current_request_id().map(|id| id.as_str().to_owned()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}

//! Forum API Handlers

pub mod health;
pub mod questions;

use crate::models::ApiError;
use crate::services::ServiceError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Convert service errors to HTTP responses
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ServiceError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ServiceError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg),
            ServiceError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                "permission_denied",
                "You don't have permission to perform this action".to_string(),
            ),
            ServiceError::ContentFlagged(reason) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "content_flagged", reason)
            }
            ServiceError::ModerationUnavailable(e) => {
                tracing::error!("Moderation error: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "moderation_unavailable",
                    "Content moderation is temporarily unavailable".to_string(),
                )
            }
            ServiceError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                )
            }
        };

        (status, Json(ApiError::new(error, &message))).into_response()
    }
}

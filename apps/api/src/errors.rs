use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::editor::EditError;
use crate::store::ResumeError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// A store operation failed against the hosted backend.
    #[error("Store error: {0}")]
    Store(ResumeError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Not implemented")]
    NotImplemented,
}

impl From<ResumeError> for AppError {
    fn from(err: ResumeError) -> Self {
        match err {
            ResumeError::NotFound => AppError::NotFound("Resume not found".to_string()),
            ResumeError::AuthFailed(msg) => AppError::AuthFailed(msg),
            ResumeError::ParseFailed => AppError::UnprocessableEntity(err.to_string()),
            other => AppError::Store(other),
        }
    }
}

impl From<EditError> for AppError {
    fn from(err: EditError) -> Self {
        match err {
            EditError::UnknownSection(_) | EditError::ItemNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            EditError::InvalidField(_) => AppError::Validation(err.to_string()),
            // Handlers load the resume before editing, so a missing document
            // means its content could not be read.
            EditError::NoDocument => AppError::from(ResumeError::ParseFailed),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::AuthFailed(msg) => (StatusCode::UNAUTHORIZED, "AUTH_FAILED", msg.clone()),
            AppError::Store(e) => {
                tracing::error!("Store error: {e}");
                (StatusCode::BAD_GATEWAY, "STORE_ERROR", e.to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
            AppError::NotImplemented => (
                StatusCode::NOT_IMPLEMENTED,
                "NOT_IMPLEMENTED",
                "This endpoint is not yet implemented".to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use upload_core::SessionError;

/// Thin wrapper so `SessionError` (defined in `upload-core`, which knows
/// nothing about HTTP) can implement `IntoResponse` here at the edge (spec
/// §7's error-to-status mapping).
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Session(SessionError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Session(SessionError::Authorization(msg)) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Session(SessionError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Session(SessionError::State(msg)) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Session(SessionError::Ordering(msg)) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Session(SessionError::Integrity(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Session(SessionError::Expired(msg)) => (StatusCode::GONE, msg.clone()),
            AppError::Session(SessionError::Infrastructure(msg)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        match status {
            StatusCode::INTERNAL_SERVER_ERROR => tracing::error!(error = %self, "request failed"),
            StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND | StatusCode::GONE => {
                tracing::warn!(error = %self, "request rejected")
            }
            _ => tracing::debug!(error = %self, "request rejected"),
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

//! Server errors and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failures a sync request can end in.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Client input the engine refused, e.g. an unparsable `since`.
    #[error(transparent)]
    Engine(#[from] wordsync_engine::Error),

    #[error("push of {count} records exceeds the limit of {limit}")]
    PushTooLarge { count: usize, limit: usize },

    #[error("server clock out of range: {0} microseconds")]
    ClockOutOfRange(i64),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Engine(_) | AppError::PushTooLarge { .. } => StatusCode::BAD_REQUEST,
            AppError::ClockOutOfRange(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if status.is_server_error() {
            tracing::error!("{}", self);
            ErrorBody {
                error: "Internal server error".to_string(),
                details: Some(self.to_string()),
            }
        } else {
            tracing::warn!("Rejected sync request: {}", self);
            ErrorBody {
                error: self.to_string(),
                details: None,
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, AppError>;

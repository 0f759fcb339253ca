//! Mapping of core errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use ddlshelf_core::MediaError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler error carrying a [`MediaError`].
#[derive(Debug)]
pub struct ApiError(pub MediaError);

impl From<MediaError> for ApiError {
    fn from(e: MediaError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            MediaError::NotFound(_) => StatusCode::NOT_FOUND,
            MediaError::InvalidInput(_) | MediaError::ResolutionFailed(_) => {
                StatusCode::BAD_REQUEST
            }
            MediaError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            MediaError::ConcurrentUpdateConflict { .. } => StatusCode::CONFLICT,
            MediaError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Short label for an error kind, used in metrics.
pub fn error_kind(e: &MediaError) -> &'static str {
    match e {
        MediaError::NotFound(_) => "not_found",
        MediaError::ResolutionFailed(_) => "resolution_failed",
        MediaError::UpstreamUnavailable(_) => "upstream_unavailable",
        MediaError::ConcurrentUpdateConflict { .. } => "conflict",
        MediaError::InvalidInput(_) => "invalid_input",
        MediaError::Database(_) => "database",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

//! Shared handler utilities: the JSON error response and the blocking-pool
//! helper.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use planner_common::PlannerError;
use renderer::RenderError;
use tiler::TileError;
use tracing::{error, warn};

/// A [`PlannerError`] rendered as `{"error": message}` with its HTTP status.
#[derive(Debug)]
pub struct ApiError(pub PlannerError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Client-facing message. `NotFound` carries its message bare.
    pub fn message(&self) -> String {
        match &self.0 {
            PlannerError::NotFound(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.0.kind()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            error!(kind = self.kind(), error = %message, "Request failed");
        } else {
            warn!(kind = self.kind(), status = status.as_u16(), error = %message, "Request rejected");
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<PlannerError> for ApiError {
    fn from(err: PlannerError) -> Self {
        ApiError(err)
    }
}

impl From<TileError> for ApiError {
    fn from(err: TileError) -> Self {
        ApiError(err.into())
    }
}

impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        ApiError(err.into())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Run CPU-bound raster work on the blocking pool.
pub async fn run_blocking<T, F>(task: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ApiError(PlannerError::InternalError(format!("worker task failed: {}", e))))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_is_bare() {
        let err = ApiError(PlannerError::NotFound("File not found".into()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "File not found");
    }

    #[test]
    fn test_status_follows_taxonomy() {
        assert_eq!(
            ApiError(PlannerError::ReprojectionError("x".into())).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(TileError::UndefinedCrs).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(PlannerError::DatabaseError("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

//! Raster upload endpoint.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Extension, Multipart},
    Json,
};
use bytes::Bytes;
use planner_common::PlannerError;
use tracing::{info, instrument};

use super::common::{run_blocking, ApiError, ApiResult};
use crate::metrics;
use crate::processing::{process_upload, UploadResult};
use crate::state::AppState;

/// Multipart field carrying the raster.
const FILE_FIELD: &str = "file";

/// POST /upload
#[instrument(skip(state, multipart))]
pub async fn upload_handler(
    Extension(state): Extension<Arc<AppState>>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResult>> {
    let start = Instant::now();
    let result = receive_and_process(state, multipart).await;
    match &result {
        Ok(upload) => {
            let outcome = if upload.reprojected { "reprojected" } else { "stored" };
            metrics::record_upload(outcome, start.elapsed());
        }
        Err(e) => metrics::record_upload(e.kind(), start.elapsed()),
    }
    result.map(Json)
}

async fn receive_and_process(state: Arc<AppState>, multipart: Multipart) -> ApiResult<UploadResult> {
    let (name, bytes) = read_file_field(multipart).await?;
    info!(filename = %name, size = bytes.len(), "Received upload");

    let target = state.config.target_crs();
    let max_pixels = state.config.max_raster_pixels;
    run_blocking(move || {
        process_upload(&state.uploads, &name, bytes, target, max_pixels).map_err(ApiError::from)
    })
    .await
}

async fn read_file_field(mut multipart: Multipart) -> ApiResult<(String, Bytes)> {
    let bad_body = |e: axum::extract::multipart::MultipartError| {
        PlannerError::invalid_parameter(FILE_FIELD, e.body_text())
    };

    while let Some(field) = multipart.next_field().await.map_err(bad_body)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| PlannerError::invalid_parameter(FILE_FIELD, "missing file name"))?;
        let bytes = field.bytes().await.map_err(bad_body)?;
        return Ok((name, bytes));
    }

    Err(PlannerError::invalid_parameter(FILE_FIELD, "multipart field 'file' is required").into())
}

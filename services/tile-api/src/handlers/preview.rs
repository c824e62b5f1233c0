//! Full-canvas preview and vegetation index histogram.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use renderer::{Colormap, IndexClip, IndexHistogram, VegetationIndex};
use serde::Deserialize;
use tiler::{index_histogram, render_preview, PreviewOptions, PreviewView};
use tracing::instrument;

use super::common::{run_blocking, ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PreviewParams {
    /// rgb, vari or gndvi.
    pub view: Option<String>,
    pub colormap: Option<String>,
    pub downsample: Option<u32>,
    /// "lo,hi"
    pub clip: Option<String>,
}

impl PreviewParams {
    fn options(&self, default_downsample: u32) -> ApiResult<PreviewOptions> {
        Ok(PreviewOptions {
            view: self.view.as_deref().map(PreviewView::parse).transpose()?.unwrap_or_default(),
            colormap: self.colormap.as_deref().map(Colormap::parse).transpose()?.unwrap_or_default(),
            downsample: self.downsample.unwrap_or(default_downsample),
            clip: self.clip.as_deref().map(IndexClip::parse).transpose()?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct HistogramParams {
    /// vari (default) or gndvi.
    pub index: Option<String>,
    pub downsample: Option<u32>,
}

/// GET /preview/:filename
#[instrument(skip(state, params))]
pub async fn preview_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(filename): Path<String>,
    Query(params): Query<PreviewParams>,
) -> ApiResult<Response> {
    let options = params.options(state.config.preview_downsample)?;
    let path = state.uploads.existing(&filename)?;

    let png = run_blocking(move || render_preview(&path, &options).map_err(ApiError::from)).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

/// GET /histogram/:filename
#[instrument(skip(state, params))]
pub async fn histogram_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(filename): Path<String>,
    Query(params): Query<HistogramParams>,
) -> ApiResult<Json<IndexHistogram>> {
    let index = match params.index.as_deref() {
        Some(name) => VegetationIndex::parse(name)?,
        None => VegetationIndex::Vari,
    };
    let downsample = params.downsample.unwrap_or(state.config.preview_downsample);
    let path = state.uploads.existing(&filename)?;

    let histogram =
        run_blocking(move || index_histogram(&path, index, downsample).map_err(ApiError::from)).await?;
    Ok(Json(histogram))
}

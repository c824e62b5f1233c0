//! XYZ tile endpoint.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Extension, Path, Query},
    http::header,
    response::{IntoResponse, Response},
};
use planner_common::{PlannerError, TileAddress};
use serde::Deserialize;
use tiler::render_tile;
use tracing::{debug, instrument};

use super::common::{run_blocking, ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TileParams {
    /// "min,max" linear stretch.
    pub rescale: Option<String>,
    /// Tile edge in pixels.
    pub size: Option<u32>,
}

/// GET /tiles/:filename/:z/:x/:y.png
#[instrument(skip(state, params))]
pub async fn tile_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((filename, z, x, y)): Path<(String, u32, u32, String)>,
    Query(params): Query<TileParams>,
) -> ApiResult<Response> {
    let (y_str, _) = y.rsplit_once('.').unwrap_or((&y, "png"));
    let y_val: u32 = y_str
        .parse()
        .map_err(|_| PlannerError::invalid_parameter("y", format!("'{}' is not a tile row", y_str)))?;

    let size = params.size.unwrap_or(state.config.tile_size);
    if size == 0 || size > state.config.max_tile_size {
        return Err(PlannerError::invalid_parameter(
            "size",
            format!("must be in 1..={}", state.config.max_tile_size),
        )
        .into());
    }

    let path = state.uploads.existing(&filename)?;
    let address = TileAddress::new(z, x, y_val);
    let rescale = params.rescale;

    let start = Instant::now();
    let rendered = run_blocking(move || {
        render_tile(&path, address, size, rescale.as_deref()).map_err(ApiError::from)
    })
    .await;

    match rendered {
        Ok(tile) => {
            metrics::record_tile(tile.outcome.as_str(), start.elapsed());
            debug!(outcome = tile.outcome.as_str(), bytes = tile.png.len(), "Tile rendered");
            Ok(([(header::CONTENT_TYPE, "image/png")], tile.png).into_response())
        }
        Err(e) => {
            metrics::record_tile(e.kind(), start.elapsed());
            Err(e)
        }
    }
}

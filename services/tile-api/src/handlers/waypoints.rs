//! Waypoint REST API: create, list, route order and QGC export.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use mission::{apply_order, sequence, waypoints_to_qgc_wpl};
use planner_common::{NewWaypoint, Waypoint};
use serde::Deserialize;
use tracing::{info, instrument};

use super::common::ApiResult;
use crate::state::AppState;

const EXPORT_DISPOSITION: &str = "attachment; filename=\"waypoints.waypoints\"";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportOrder {
    /// Insertion order.
    #[default]
    Stored,
    /// Nearest-neighbour route.
    Route,
}

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    #[serde(default)]
    pub order: ExportOrder,
}

/// Stored waypoints reordered by the nearest-neighbour route over
/// (longitude, latitude).
fn route_order(waypoints: &[Waypoint]) -> Vec<Waypoint> {
    let points: Vec<(f64, f64)> = waypoints.iter().map(|w| (w.longitude, w.latitude)).collect();
    apply_order(waypoints, &sequence(&points))
}

/// POST /api/v1/waypoints
#[instrument(skip(state, new))]
pub async fn create_waypoint_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(new): Json<NewWaypoint>,
) -> ApiResult<Json<Waypoint>> {
    let waypoint = state.waypoints.create(&new).await?;
    info!(id = waypoint.id, name = %waypoint.name, "Created waypoint");
    Ok(Json(waypoint))
}

/// GET /api/v1/waypoints
#[instrument(skip(state))]
pub async fn list_waypoints_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<Json<Vec<Waypoint>>> {
    Ok(Json(state.waypoints.list_all().await?))
}

/// GET /api/v1/waypoints/route
#[instrument(skip(state))]
pub async fn route_waypoints_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<Json<Vec<Waypoint>>> {
    let waypoints = state.waypoints.list_all().await?;
    Ok(Json(route_order(&waypoints)))
}

/// GET /api/v1/waypoints/export
#[instrument(skip(state))]
pub async fn export_waypoints_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<ExportParams>,
) -> ApiResult<Response> {
    let stored = state.waypoints.list_all().await?;
    let waypoints = match params.order {
        ExportOrder::Stored => stored,
        ExportOrder::Route => route_order(&stored),
    };
    let body = waypoints_to_qgc_wpl(&waypoints);

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CONTENT_DISPOSITION, EXPORT_DISPOSITION),
        ],
        body,
    )
        .into_response())
}

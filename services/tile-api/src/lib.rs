//! Survey planner tile service library.
//!
//! Exposes the modules and the router so the service can be driven in tests.

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod processing;
pub mod state;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Extension},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use state::AppState;

/// All routes with their shared layers.
pub fn build_router(state: Arc<AppState>, prometheus_handle: PrometheusHandle) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        // Rasters
        .route("/upload", post(handlers::upload_handler))
        .route("/tiles/:filename/:z/:x/:y", get(handlers::tile_handler))
        .route("/preview/:filename", get(handlers::preview_handler))
        .route("/histogram/:filename", get(handlers::histogram_handler))
        // Waypoints
        .route(
            "/api/v1/waypoints",
            get(handlers::list_waypoints_handler).post(handlers::create_waypoint_handler),
        )
        .route("/api/v1/waypoints/route", get(handlers::route_waypoints_handler))
        .route("/api/v1/waypoints/export", get(handlers::export_waypoints_handler))
        // Health check
        .route("/health", get(handlers::health_handler))
        // Metrics
        .route("/metrics", get(handlers::metrics_handler))
        // Layer extensions
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(Extension(state))
        .layer(Extension(prometheus_handle))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

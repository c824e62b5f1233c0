//! HTTP request handlers.
//!
//! This module is organized into submodules:
//! - `tiles`: XYZ tiles
//! - `uploads`: raster upload and reprojection
//! - `preview`: full-canvas previews and index histograms
//! - `waypoints`: waypoint store, route order and QGC export
//! - `metrics`: health check and Prometheus metrics
//! - `common`: JSON error response and blocking-pool helper

pub mod common;
pub mod metrics;
pub mod preview;
pub mod tiles;
pub mod uploads;
pub mod waypoints;

pub use common::{ApiError, ApiResult};
pub use metrics::{health_handler, metrics_handler};
pub use preview::{histogram_handler, preview_handler};
pub use tiles::tile_handler;
pub use uploads::upload_handler;
pub use waypoints::{
    create_waypoint_handler, export_waypoints_handler, list_waypoints_handler,
    route_waypoints_handler,
};

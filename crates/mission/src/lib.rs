//! Flight mission helpers: waypoint ordering and QGroundControl export.

pub mod export;
pub mod route;

pub use export::{to_qgc_wpl, waypoints_to_qgc_wpl, QGC_WPL_HEADER};
pub use route::{apply_order, sequence};

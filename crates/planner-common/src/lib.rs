//! Common types and utilities shared across the survey-planner crates and services.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod tile;
pub mod waypoint;
pub mod window;

pub use bbox::BoundingBox;
pub use crs::Crs;
pub use error::{PlannerError, PlannerResult};
pub use tile::TileAddress;
pub use waypoint::{NewWaypoint, Waypoint};
pub use window::PixelWindow;

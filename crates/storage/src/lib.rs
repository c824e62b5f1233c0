//! Storage for the survey-planner services.
//!
//! Provides:
//! - The upload directory, with atomic publish and a name-collision policy
//! - The waypoint store (SQLite via sqlx)

pub mod uploads;
pub mod waypoints;

pub use uploads::{validate_filename, CollisionPolicy, PublishedFile, UploadDirectory};
pub use waypoints::{SqliteWaypointStore, WaypointStore};

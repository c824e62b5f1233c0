//! Coordinate reference system transformations.
//!
//! Web Mercator and WGS84 are implemented directly. Every other EPSG code is
//! resolved through the crs-definitions database and transformed with proj4rs.

pub mod mercator;
pub mod transform;

pub use mercator::{lonlat_to_mercator, mercator_to_lonlat};
pub use transform::{is_geographic, proj_string, CrsTransformer, ProjectionError};

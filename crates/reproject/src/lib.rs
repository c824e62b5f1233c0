//! Reprojection of uploaded rasters into the display CRS.
//!
//! The output grid follows GDAL's "suggested warp output" and pixels are
//! resampled with nearest neighbour through the inverse transform.

pub mod error;
pub mod grid;
pub mod warp;

pub use error::{ReprojectError, Result};
pub use grid::{default_output_grid, OutputGrid, EDGE_SAMPLES};
pub use warp::{reproject, warp_bands, RasterArtifact};

//! Output grid selection.

use planner_common::BoundingBox;
use projection::CrsTransformer;
use raster_source::GeoTransform;

use crate::error::{ReprojectError, Result};

/// Points sampled along each edge of the source footprint.
pub const EDGE_SAMPLES: usize = 21;

/// Size and placement of a reprojected raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputGrid {
    pub width: u32,
    pub height: u32,
    pub transform: GeoTransform,
}

impl OutputGrid {
    pub fn bounds(&self) -> BoundingBox {
        self.transform.bounds(self.width, self.height)
    }
}

/// Compute the default output grid for warping a `width x height` raster
/// with footprint `source_bounds` through `transformer`.
///
/// The resolution keeps the pixel count along the diagonal: target bbox
/// diagonal divided by the source diagonal in pixels, as a square pixel.
pub fn default_output_grid(
    transformer: &CrsTransformer,
    source_bounds: &BoundingBox,
    width: u32,
    height: u32,
) -> Result<OutputGrid> {
    let target = transformer.forward_bounds(source_bounds, EDGE_SAMPLES)?;
    if target.is_empty() {
        return Err(ReprojectError::EmptyGrid(format!(
            "target footprint {:?} has no area",
            target
        )));
    }

    let pixel_diagonal = (width as f64).hypot(height as f64);
    let resolution = target.diagonal() / pixel_diagonal;
    if !resolution.is_finite() || resolution <= 0.0 {
        return Err(ReprojectError::EmptyGrid(format!(
            "invalid resolution {}",
            resolution
        )));
    }

    let out_width = (target.width() / resolution).ceil().max(1.0) as u32;
    let out_height = (target.height() / resolution).ceil().max(1.0) as u32;

    Ok(OutputGrid {
        width: out_width,
        height: out_height,
        transform: GeoTransform::new(target.min_x, target.max_y, resolution, resolution),
    })
}

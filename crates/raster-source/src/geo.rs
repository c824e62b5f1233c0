//! Georeferencing: the pixel/CRS affine and the GeoKey directory.
//!
//! Only north-up, non-rotated rasters are supported. Pixel `(0, 0)` has its
//! top-left corner at `origin`; columns run east, rows run south.

use planner_common::{BoundingBox, Crs, PixelWindow};
use serde::{Deserialize, Serialize};

/// GTModelTypeGeoKey
pub const KEY_MODEL_TYPE: u16 = 1024;
/// GTRasterTypeGeoKey
pub const KEY_RASTER_TYPE: u16 = 1025;
/// GeographicTypeGeoKey
pub const KEY_GEOGRAPHIC_TYPE: u16 = 2048;
/// ProjectedCSTypeGeoKey
pub const KEY_PROJECTED_CS_TYPE: u16 = 3072;

const USER_DEFINED: u16 = 32767;

// Snaps coordinates that land a hair off a pixel edge.
const EDGE_EPSILON: f64 = 1e-9;

/// Pixel to CRS affine for a north-up raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    /// Pixel width in CRS units (> 0).
    pub pixel_width: f64,
    /// Pixel height in CRS units (> 0, rows run south).
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Build from ModelPixelScale `[sx, sy, sz]` and the first ModelTiepoint
    /// `[i, j, k, x, y, z]`.
    pub fn from_scale_and_tiepoint(scale: &[f64], tiepoint: &[f64]) -> Option<Self> {
        if scale.len() < 2 || tiepoint.len() < 6 {
            return None;
        }
        let (sx, sy) = (scale[0], scale[1]);
        let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
        Self::new(x - i * sx, y + j * sy, sx, sy).validated()
    }

    /// Build from a 4x4 ModelTransformation matrix. Rotated or sheared
    /// matrices are rejected.
    pub fn from_model_transformation(matrix: &[f64]) -> Option<Self> {
        if matrix.len() < 8 {
            return None;
        }
        let (a, b, d) = (matrix[0], matrix[1], matrix[3]);
        let (e, f, h) = (matrix[4], matrix[5], matrix[7]);
        if b != 0.0 || e != 0.0 {
            return None;
        }
        Self::new(d, h, a, -f).validated()
    }

    fn validated(self) -> Option<Self> {
        let finite = [self.origin_x, self.origin_y, self.pixel_width, self.pixel_height]
            .iter()
            .all(|v| v.is_finite());
        if finite && self.pixel_width > 0.0 && self.pixel_height > 0.0 {
            Some(self)
        } else {
            None
        }
    }

    /// CRS coordinate of a (fractional) pixel position.
    pub fn pixel_to_world(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width,
            self.origin_y - row * self.pixel_height,
        )
    }

    /// Fractional pixel position of a CRS coordinate.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.pixel_width,
            (self.origin_y - y) / self.pixel_height,
        )
    }

    /// Footprint of a `width x height` raster.
    pub fn bounds(&self, width: u32, height: u32) -> BoundingBox {
        let (max_x, min_y) = self.pixel_to_world(width as f64, height as f64);
        BoundingBox::new(self.origin_x, min_y, max_x, self.origin_y)
    }

    /// Smallest pixel window covering `bbox` (not clamped).
    pub fn window_covering(&self, bbox: &BoundingBox) -> PixelWindow {
        let (c0, r0) = self.world_to_pixel(bbox.min_x, bbox.max_y);
        let (c1, r1) = self.world_to_pixel(bbox.max_x, bbox.min_y);
        PixelWindow::from_ranges(
            (c0 + EDGE_EPSILON).floor() as i64,
            (c1 - EDGE_EPSILON).ceil() as i64,
            (r0 + EDGE_EPSILON).floor() as i64,
            (r1 - EDGE_EPSILON).ceil() as i64,
        )
    }

    /// The transform of a sub-grid starting at `window` and sampled every
    /// `step` pixels.
    pub fn for_window(&self, window: &PixelWindow, step: u32) -> GeoTransform {
        let (x, y) = self.pixel_to_world(window.col_off as f64, window.row_off as f64);
        GeoTransform::new(
            x,
            y,
            self.pixel_width * step as f64,
            self.pixel_height * step as f64,
        )
    }

    /// ModelPixelScale tag payload.
    pub fn pixel_scale(&self) -> [f64; 3] {
        [self.pixel_width, self.pixel_height, 0.0]
    }

    /// ModelTiepoint tag payload anchoring pixel (0, 0).
    pub fn tiepoint(&self) -> [f64; 6] {
        [0.0, 0.0, 0.0, self.origin_x, self.origin_y, 0.0]
    }
}

/// Read the CRS out of a GeoKeyDirectory.
///
/// ProjectedCSType wins over GeographicType. Missing and user-defined codes
/// leave the CRS undefined.
pub fn crs_from_geokeys(directory: &[u16]) -> Option<Crs> {
    if directory.len() < 4 {
        return None;
    }
    let count = directory[3] as usize;
    let mut projected = None;
    let mut geographic = None;

    for entry in directory[4..].chunks_exact(4).take(count) {
        let (key, location, value) = (entry[0], entry[1], entry[3]);
        // Values stored in other tags are never EPSG codes.
        if location != 0 || value == 0 || value == USER_DEFINED {
            continue;
        }
        match key {
            KEY_PROJECTED_CS_TYPE => projected = Some(value),
            KEY_GEOGRAPHIC_TYPE => geographic = Some(value),
            _ => {}
        }
    }

    projected.or(geographic).map(Crs::from_epsg)
}

/// Build a GeoKeyDirectory for an EPSG code.
pub fn geokeys_for(crs: Crs, geographic: bool) -> Vec<u16> {
    let model_type = if geographic { 2 } else { 1 };
    let crs_key = if geographic {
        KEY_GEOGRAPHIC_TYPE
    } else {
        KEY_PROJECTED_CS_TYPE
    };
    let entries: [[u16; 4]; 3] = [
        [KEY_MODEL_TYPE, 0, 1, model_type],
        // PixelIsArea
        [KEY_RASTER_TYPE, 0, 1, 1],
        [crs_key, 0, 1, crs.epsg()],
    ];

    let mut keys = vec![1, 1, 0, entries.len() as u16];
    for entry in entries {
        keys.extend_from_slice(&entry);
    }
    keys
}

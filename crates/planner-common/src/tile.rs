//! XYZ tile pyramid addressing (Web Mercator, top-left origin).

use crate::BoundingBox;
use serde::{Deserialize, Serialize};

/// Half the Web Mercator world width in meters.
pub const WEB_MERCATOR_EXTENT: f64 = 20037508.342789244;

/// Deepest zoom level accepted for tile requests.
pub const MAX_ZOOM: u32 = 30;

/// A tile address (z/x/y) in a power-of-two pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileAddress {
    /// Zoom level
    pub z: u32,
    /// Column (x), increasing eastward
    pub x: u32,
    /// Row (y), increasing southward
    pub y: u32,
}

impl TileAddress {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Number of tiles along one axis at this zoom.
    pub fn matrix_size(z: u32) -> u64 {
        1u64 << z.min(MAX_ZOOM)
    }

    /// Whether the address exists in the pyramid.
    pub fn is_valid(&self) -> bool {
        if self.z > MAX_ZOOM {
            return false;
        }
        let n = Self::matrix_size(self.z);
        (self.x as u64) < n && (self.y as u64) < n
    }

    /// Tile footprint in EPSG:3857 meters.
    ///
    /// Each zoom level halves the tile span: `span = 2 * E / 2^z`.
    pub fn web_mercator_bounds(&self) -> BoundingBox {
        let span = 2.0 * WEB_MERCATOR_EXTENT / Self::matrix_size(self.z) as f64;
        let min_x = -WEB_MERCATOR_EXTENT + self.x as f64 * span;
        let max_y = WEB_MERCATOR_EXTENT - self.y as f64 * span;
        BoundingBox::new(min_x, max_y - span, min_x + span, max_y)
    }
}

impl std::fmt::Display for TileAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Convert lon/lat to the tile containing it.
pub fn lonlat_to_tile(lon: f64, lat: f64, zoom: u32) -> TileAddress {
    let n = TileAddress::matrix_size(zoom) as f64;
    let max_index = n - 1.0;

    let x = ((lon + 180.0) / 360.0 * n).floor().clamp(0.0, max_index) as u32;
    let lat_rad = lat.to_radians();
    let y = ((1.0 - lat_rad.tan().asinh() / std::f64::consts::PI) / 2.0 * n)
        .floor()
        .clamp(0.0, max_index) as u32;

    TileAddress { z: zoom, x, y }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_zero_covers_world() {
        let bounds = TileAddress::new(0, 0, 0).web_mercator_bounds();
        assert!((bounds.min_x + WEB_MERCATOR_EXTENT).abs() < 1e-6);
        assert!((bounds.max_y - WEB_MERCATOR_EXTENT).abs() < 1e-6);
        assert!((bounds.width() - 2.0 * WEB_MERCATOR_EXTENT).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_one_quadrants() {
        let nw = TileAddress::new(1, 0, 0).web_mercator_bounds();
        assert!((nw.max_x).abs() < 1e-6);
        assert!((nw.min_y).abs() < 1e-6);

        let se = TileAddress::new(1, 1, 1).web_mercator_bounds();
        assert!((se.min_x).abs() < 1e-6);
        assert!((se.max_y).abs() < 1e-6);
    }

    #[test]
    fn test_validity() {
        assert!(TileAddress::new(2, 3, 3).is_valid());
        assert!(!TileAddress::new(2, 4, 0).is_valid());
        assert!(!TileAddress::new(MAX_ZOOM + 1, 0, 0).is_valid());
    }

    #[test]
    fn test_lonlat_to_tile_origin() {
        assert_eq!(lonlat_to_tile(0.0, 0.0, 1), TileAddress::new(1, 1, 1));
        assert_eq!(lonlat_to_tile(-179.9, 85.0, 1), TileAddress::new(1, 0, 0));
    }
}

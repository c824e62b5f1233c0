//! Common test fixtures for survey-planner tests.
//!
//! Pre-defined rasters and waypoints that represent the usual upload
//! scenarios: an RGB drone orthomosaic in WGS84, a UTM multispectral
//! stack, and a single-band elevation-like grid.

use tempfile::TempDir;

use crate::generators::{band_with_zero_border, ramp_u16, reflectance_band, rgb_bands};
use crate::geotiff::GeoTiffBuilder;

/// Common bounding boxes `(min_x, min_y, max_x, max_y)`.
pub mod bbox {
    /// A small field near Wageningen, in WGS84 degrees.
    pub const FIELD_WGS84: (f64, f64, f64, f64) = (5.66, 51.98, 5.67, 51.99);

    /// The same region in UTM zone 31N meters.
    pub const FIELD_UTM31: (f64, f64, f64, f64) = (683_000.0, 5_761_000.0, 683_640.0, 5_761_640.0);
}

/// Waypoints `(latitude, longitude)` around a field.
pub mod waypoints {
    pub const SQUARE: [(f64, f64); 4] = [
        (51.98, 5.66),
        (51.98, 5.67),
        (51.99, 5.67),
        (51.99, 5.66),
    ];
}

/// Create a fresh temporary directory.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

/// 64x64 RGB orthomosaic in EPSG:4326 covering [`bbox::FIELD_WGS84`].
pub fn rgb_wgs84_raster() -> GeoTiffBuilder {
    let (min_x, _, max_x, max_y) = bbox::FIELD_WGS84;
    let size = 64;
    let pixel = (max_x - min_x) / size as f64;
    GeoTiffBuilder::u8(size as u32, size as u32, rgb_bands(size, size))
        .origin(min_x, max_y)
        .pixel_size(pixel, pixel)
        .epsg(Some(4326))
}

/// 64x64 four-band RGBA orthomosaic; the left 8 columns are transparent.
pub fn rgba_wgs84_raster() -> GeoTiffBuilder {
    let (min_x, _, max_x, max_y) = bbox::FIELD_WGS84;
    let size = 64;
    let pixel = (max_x - min_x) / size as f64;
    let mut bands = rgb_bands(size, size);
    bands.push(band_with_zero_border(size, size, 8, 255u8));
    GeoTiffBuilder::u8(size as u32, size as u32, bands)
        .origin(min_x, max_y)
        .pixel_size(pixel, pixel)
        .epsg(Some(4326))
}

/// 32x32 five-band 16-bit multispectral stack in UTM 31N (EPSG:32631).
pub fn multispectral_utm_raster() -> GeoTiffBuilder {
    let (min_x, _, max_x, max_y) = bbox::FIELD_UTM31;
    let size = 32;
    let pixel = (max_x - min_x) / size as f64;
    let bands = (0..5)
        .map(|i| ramp_u16(size, size, 1000 + i * 500, 20_000 + i * 1000))
        .collect();
    GeoTiffBuilder::u16(size as u32, size as u32, bands)
        .origin(min_x, max_y)
        .pixel_size(pixel, pixel)
        .epsg(Some(32631))
}

/// 32x32 single-band float raster already in Web Mercator.
pub fn float_mercator_raster() -> GeoTiffBuilder {
    let size = 32;
    GeoTiffBuilder::f32(size as u32, size as u32, vec![reflectance_band(size, size, 0.1)])
        .origin(630_000.0, 6_795_000.0)
        .pixel_size(20.0, 20.0)
        .epsg(Some(3857))
}

/// Write a builder's output into `dir` under `name` and return the path.
pub fn write_raster(dir: &TempDir, name: &str, builder: &GeoTiffBuilder) -> std::path::PathBuf {
    let path = dir.path().join(name);
    builder.write_to(&path).expect("write raster fixture");
    path
}

//! Tile and preview rendering against synthetic GeoTIFFs on disk.

use planner_common::tile::lonlat_to_tile;
use planner_common::{Crs, PlannerError, TileAddress};
use projection::CrsTransformer;
use renderer::{Colormap, VegetationIndex};
use test_utils::{
    band_with_zero_border, bbox, constant_band, float_mercator_raster, multispectral_utm_raster,
    ramp_u16, reflectance_band, rgb_wgs84_raster, temp_dir, write_raster, GeoTiffBuilder,
};
use tiler::{
    index_histogram, render_preview, render_tile, transparent_tile, PreviewOptions, PreviewView,
    TileError, TileOutcome,
};

// ============================================================================
// Helper functions
// ============================================================================

fn decode(png: &[u8]) -> image::RgbaImage {
    image::load_from_memory(png).unwrap().to_rgba8()
}

fn opaque_count(img: &image::RgbaImage) -> usize {
    img.pixels().filter(|p| p.0[3] > 0).count()
}

/// Tile at zoom `z` containing a point given in `crs`.
fn tile_at(crs: Crs, x: f64, y: f64, z: u32) -> TileAddress {
    let (lon, lat) = CrsTransformer::new(crs, Crs::WGS84).unwrap().forward(x, y).unwrap();
    lonlat_to_tile(lon, lat, z)
}

/// A Web Mercator tile that rasters below are aligned to.
const ALIGNED_TILE: TileAddress = TileAddress {
    z: 16,
    x: 33_800,
    y: 21_600,
};

/// Place `builder` exactly over [`ALIGNED_TILE`].
fn aligned_to_tile(builder: GeoTiffBuilder, size: u32) -> GeoTiffBuilder {
    let bounds = ALIGNED_TILE.web_mercator_bounds();
    let pixel = (bounds.max_x - bounds.min_x) / size as f64;
    builder
        .origin(bounds.min_x, bounds.max_y)
        .pixel_size(pixel, pixel)
        .epsg(Some(3857))
}

fn field_center_tile(z: u32) -> TileAddress {
    let (min_x, min_y, max_x, max_y) = bbox::FIELD_WGS84;
    lonlat_to_tile((min_x + max_x) / 2.0, (min_y + max_y) / 2.0, z)
}

// ============================================================================
// Transparent fallback
// ============================================================================

#[test]
fn test_tile_outside_raster_is_transparent() {
    let dir = temp_dir();
    let path = write_raster(&dir, "field.tif", &rgb_wgs84_raster());

    let tile = render_tile(&path, TileAddress::new(14, 0, 0), 256, None).unwrap();
    assert_eq!(tile.outcome, TileOutcome::Empty);

    let img = decode(&tile.png);
    assert_eq!(img.dimensions(), (256, 256));
    assert_eq!(opaque_count(&img), 0);
}

#[test]
fn test_tile_outside_pyramid_is_transparent() {
    let dir = temp_dir();
    let path = write_raster(&dir, "field.tif", &rgb_wgs84_raster());

    let tile = render_tile(&path, TileAddress::new(2, 10, 1), 128, None).unwrap();
    assert_eq!(tile.outcome, TileOutcome::Empty);
    assert_eq!(decode(&tile.png).dimensions(), (128, 128));
}

#[test]
fn test_transparent_tile_size() {
    let img = decode(&transparent_tile(512).unwrap());
    assert_eq!(img.dimensions(), (512, 512));
    assert_eq!(opaque_count(&img), 0);
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_tile_inside_raster_is_opaque() {
    let dir = temp_dir();
    let path = write_raster(&dir, "field.tif", &rgb_wgs84_raster());

    let tile = render_tile(&path, field_center_tile(18), 256, None).unwrap();
    assert_eq!(tile.outcome, TileOutcome::Rendered);

    let img = decode(&tile.png);
    assert_eq!(opaque_count(&img), 256 * 256);
}

#[test]
fn test_tile_partially_covering_raster() {
    let dir = temp_dir();
    let path = write_raster(&dir, "field.tif", &rgb_wgs84_raster());

    let tile = render_tile(&path, field_center_tile(13), 256, None).unwrap();
    let img = decode(&tile.png);
    let opaque = opaque_count(&img);
    assert!(opaque > 0);
    assert!(opaque < 256 * 256);
}

#[test]
fn test_mercator_raster_tile() {
    let dir = temp_dir();
    let path = write_raster(&dir, "ortho.tif", &float_mercator_raster());

    let address = tile_at(Crs::WEB_MERCATOR, 630_320.0, 6_794_680.0, 16);
    let tile = render_tile(&path, address, 256, None).unwrap();
    assert_eq!(tile.outcome, TileOutcome::Rendered);
    assert!(opaque_count(&decode(&tile.png)) > 0);
}

#[test]
fn test_utm_raster_tile() {
    let dir = temp_dir();
    let path = write_raster(&dir, "multi.tif", &multispectral_utm_raster());

    let (min_x, min_y, max_x, max_y) = bbox::FIELD_UTM31;
    let center = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
    let address = tile_at(Crs::from_epsg(32631), center.0, center.1, 16);

    let tile = render_tile(&path, address, 256, Some("1000,30000")).unwrap();
    assert_eq!(tile.outcome, TileOutcome::Rendered);
    assert!(opaque_count(&decode(&tile.png)) > 0);
}

#[test]
fn test_tile_is_north_up() {
    let dir = temp_dir();
    let size = 256usize;
    let half = size * size / 2;
    let red: Vec<u8> = [vec![255; half], vec![0; half]].concat();
    let green = vec![0u8; size * size];
    let blue: Vec<u8> = [vec![0; half], vec![255; half]].concat();
    let builder = aligned_to_tile(GeoTiffBuilder::u8(256, 256, vec![red, green, blue]), 256);
    let path = write_raster(&dir, "halves.tif", &builder);

    let tile = render_tile(&path, ALIGNED_TILE, 256, None).unwrap();
    let img = decode(&tile.png);
    assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
    assert_eq!(img.get_pixel(255, 0).0, [255, 0, 0, 255]);
    assert_eq!(img.get_pixel(0, 255).0, [0, 0, 255, 255]);
    assert_eq!(img.get_pixel(255, 255).0, [0, 0, 255, 255]);
}

#[test]
fn test_single_band_u8_tile() {
    let dir = temp_dir();
    let builder = aligned_to_tile(GeoTiffBuilder::u8(32, 32, vec![constant_band(32, 32, 200u8)]), 32);
    let path = write_raster(&dir, "gray.tif", &builder);

    let tile = render_tile(&path, ALIGNED_TILE, 256, None).unwrap();
    assert_eq!(tile.outcome, TileOutcome::Rendered);
    let img = decode(&tile.png);
    assert_eq!(opaque_count(&img), 256 * 256);
    assert_eq!(img.get_pixel(128, 128).0, [200, 200, 200, 255]);
}

#[test]
fn test_single_band_f32_tile() {
    let dir = temp_dir();
    let builder = aligned_to_tile(
        GeoTiffBuilder::f32(32, 32, vec![reflectance_band(32, 32, 0.25)]),
        32,
    );
    let path = write_raster(&dir, "reflectance.tif", &builder);

    let tile = render_tile(&path, ALIGNED_TILE, 256, None).unwrap();
    assert_eq!(tile.outcome, TileOutcome::Rendered);
    assert!(opaque_count(&decode(&tile.png)) > 0);
}

#[test]
fn test_gray_alpha_tile() {
    let dir = temp_dir();
    let gray = constant_band(32, 32, 180u8);
    let alpha = band_with_zero_border(32, 32, 16, 255u8);
    let builder = aligned_to_tile(GeoTiffBuilder::u8(32, 32, vec![gray, alpha]), 32);
    let path = write_raster(&dir, "gray_alpha.tif", &builder);

    let tile = render_tile(&path, ALIGNED_TILE, 256, None).unwrap();
    assert_eq!(tile.outcome, TileOutcome::Rendered);
    let img = decode(&tile.png);
    assert_eq!(img.get_pixel(10, 128).0[3], 0);
    assert_eq!(img.get_pixel(245, 128).0, [180, 180, 180, 255]);
    assert_eq!(opaque_count(&img), 256 * 128);
}

#[test]
fn test_five_band_tile() {
    let dir = temp_dir();
    let bands = (0..5u16)
        .map(|i| ramp_u16(32, 32, 1000 + i * 500, 20_000 + i * 1000))
        .collect();
    let builder = aligned_to_tile(GeoTiffBuilder::u16(32, 32, bands), 32);
    let path = write_raster(&dir, "multi.tif", &builder);

    let tile = render_tile(&path, ALIGNED_TILE, 256, None).unwrap();
    assert_eq!(tile.outcome, TileOutcome::Rendered);
    let img = decode(&tile.png);
    // Band 4 is alpha; its minimum (the top row) stretches to 0.
    assert_eq!(img.get_pixel(128, 0).0[3], 0);
    assert_eq!(img.get_pixel(128, 255).0[3], 255);
}

#[test]
fn test_invalid_rescale_is_ignored() {
    let dir = temp_dir();
    let path = write_raster(&dir, "field.tif", &rgb_wgs84_raster());
    let address = field_center_tile(18);

    let plain = render_tile(&path, address, 256, None).unwrap();
    let ignored = render_tile(&path, address, 256, Some("5,5")).unwrap();
    assert_eq!(ignored.outcome, TileOutcome::Rendered);
    assert_eq!(decode(&plain.png), decode(&ignored.png));
}

#[test]
fn test_custom_tile_size() {
    let dir = temp_dir();
    let path = write_raster(&dir, "field.tif", &rgb_wgs84_raster());

    let tile = render_tile(&path, field_center_tile(17), 64, None).unwrap();
    assert_eq!(decode(&tile.png).dimensions(), (64, 64));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_raster_without_crs_fails() {
    let dir = temp_dir();
    let path = write_raster(&dir, "nocrs.tif", &rgb_wgs84_raster().epsg(None));

    let err = render_tile(&path, field_center_tile(18), 256, None).unwrap_err();
    assert!(matches!(err, TileError::UndefinedCrs));
    assert_eq!(PlannerError::from(err).http_status_code(), 400);
}

#[test]
fn test_missing_file_fails() {
    let dir = temp_dir();
    let err = render_tile(dir.path().join("missing.tif"), field_center_tile(18), 256, None).unwrap_err();
    assert!(matches!(err, TileError::Raster(_)));
}

// ============================================================================
// Previews and histograms
// ============================================================================

#[test]
fn test_rgb_preview_is_downsampled() {
    let dir = temp_dir();
    let path = write_raster(&dir, "field.tif", &rgb_wgs84_raster());

    let options = PreviewOptions {
        downsample: 2,
        ..Default::default()
    };
    let img = decode(&render_preview(&path, &options).unwrap());
    assert_eq!(img.dimensions(), (32, 32));
    // Red ramps left to right.
    assert_eq!(img.get_pixel(0, 0).0, [0, 255, 128, 255]);
}

#[test]
fn test_index_preview() {
    let dir = temp_dir();
    let path = write_raster(&dir, "field.tif", &rgb_wgs84_raster());

    let options = PreviewOptions {
        view: PreviewView::Vari,
        colormap: Colormap::Plasma,
        downsample: 4,
        clip: None,
    };
    let img = decode(&render_preview(&path, &options).unwrap());
    assert_eq!(img.dimensions(), (16, 16));
    assert_eq!(opaque_count(&img), 16 * 16);
}

#[test]
fn test_index_preview_needs_rgb() {
    let dir = temp_dir();
    let builder = GeoTiffBuilder::u8(8, 8, vec![constant_band(8, 8, 3u8)]);
    let path = write_raster(&dir, "gray.tif", &builder);

    let options = PreviewOptions {
        view: PreviewView::Gndvi,
        ..Default::default()
    };
    let err = render_preview(&path, &options).unwrap_err();
    assert_eq!(PlannerError::from(err).http_status_code(), 400);
}

#[test]
fn test_histogram_counts_opaque_pixels() {
    let dir = temp_dir();
    let path = write_raster(&dir, "field.tif", &rgb_wgs84_raster());

    let h = index_histogram(&path, VegetationIndex::Gndvi, 1).unwrap();
    assert_eq!(h.counts.len(), 125);
    assert_eq!(h.edges.len(), 126);
    assert_eq!(h.counts.iter().sum::<u64>(), 64 * 64);
}

#[test]
fn test_zero_downsample_rejected() {
    let dir = temp_dir();
    let path = write_raster(&dir, "field.tif", &rgb_wgs84_raster());
    assert!(matches!(
        index_histogram(&path, VegetationIndex::Vari, 0),
        Err(TileError::InvalidParameter { param: "downsample", .. })
    ));
}

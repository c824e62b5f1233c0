//! Tests for CRS transforms through the public API.

use planner_common::{BoundingBox, Crs};
use projection::{lonlat_to_mercator, CrsTransformer};
use test_utils::{assert_approx_eq, assert_coords_approx_eq};

// ============================================================================
// Web Mercator / WGS84
// ============================================================================

#[test]
fn test_known_city_in_mercator() {
    // Reference values from EPSG:3857 for (13.4050, 52.5200)
    let (x, y) = lonlat_to_mercator(13.405, 52.52);
    assert_approx_eq!(x, 1_492_237.77, 0.01);
    assert_approx_eq!(y, 6_894_699.80, 0.01);
}

#[test]
fn test_bounds_roundtrip_wgs84_mercator() {
    let t = CrsTransformer::new(Crs::WGS84, Crs::WEB_MERCATOR).unwrap();
    let bbox = BoundingBox::new(10.0, 45.0, 11.0, 46.0);

    let merc = t.forward_bounds(&bbox, 21).unwrap();
    assert!(merc.min_x < merc.max_x);
    assert!(merc.min_y < merc.max_y);

    let back = t.inverse_bounds(&merc, 21).unwrap();
    assert_approx_eq!(back.min_x, bbox.min_x, 1e-9);
    assert_approx_eq!(back.max_y, bbox.max_y, 1e-9);
}

// ============================================================================
// proj4rs-backed codes
// ============================================================================

#[test]
fn test_utm_roundtrip() {
    // UTM zone 33N
    let utm = Crs::from_epsg(32633);
    let t = CrsTransformer::new(Crs::WGS84, utm).unwrap();

    let (e, n) = t.forward(15.0, 52.0).unwrap();
    // Central meridian of zone 33 maps to the false easting
    assert_approx_eq!(e, 500_000.0, 1.0);
    assert!(n > 5_700_000.0 && n < 5_800_000.0, "northing {}", n);

    let (lon, lat) = t.inverse(e, n).unwrap();
    assert_coords_approx_eq!((lon, lat), (15.0, 52.0), 1e-6);
}

#[test]
fn test_utm_to_mercator_matches_two_step() {
    let utm = Crs::from_epsg(32633);
    let direct = CrsTransformer::new(utm, Crs::WEB_MERCATOR).unwrap();
    let to_wgs = CrsTransformer::new(utm, Crs::WGS84).unwrap();

    let (x, y) = direct.forward(400_000.0, 5_800_000.0).unwrap();
    let (lon, lat) = to_wgs.forward(400_000.0, 5_800_000.0).unwrap();
    let (ex, ey) = lonlat_to_mercator(lon, lat);
    assert_coords_approx_eq!((x, y), (ex, ey), 1e-3);
}

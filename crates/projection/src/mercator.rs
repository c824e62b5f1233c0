//! Spherical Web Mercator (EPSG:3857).
//!
//! Uses the WGS84 semi-major axis as the sphere radius, matching the
//! definition used by XYZ tile pyramids.

use std::f64::consts::PI;

/// Sphere radius for EPSG:3857 (WGS84 semi-major axis, meters).
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Latitude at which the Web Mercator square ends.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Longitude/latitude degrees to Web Mercator meters.
///
/// Latitude is clamped to the Mercator square so the poles map to a finite y.
pub fn lonlat_to_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = EARTH_RADIUS * lon.to_radians();
    let y = EARTH_RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

/// Web Mercator meters to longitude/latitude degrees.
pub fn mercator_to_lonlat(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    (lon, lat)
}

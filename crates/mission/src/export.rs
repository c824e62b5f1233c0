//! QGroundControl WPL 110 waypoint files.
//!
//! Each line is tab-separated:
//! `index current frame command p1 p2 p3 p4 lat lon alt autocontinue`.
//! The first point is the home position (command 3, current = 1); the rest
//! are plain waypoints (command 16). Altitude is fixed at 100 m.

use std::fmt::Write;

use planner_common::Waypoint;

pub const QGC_WPL_HEADER: &str = "QGC WPL 110";

const CMD_HOME: u16 = 3;
const CMD_WAYPOINT: u16 = 16;
const ALTITUDE: &str = "100.000000";

/// Shortest round-trip decimal that always has a fractional part. Small
/// magnitudes stay positional (`0.00001`, never `1e-05`).
fn coordinate(v: f64) -> String {
    let s = v.to_string();
    if v.is_finite() && !s.contains('.') {
        format!("{}.0", s)
    } else {
        s
    }
}

/// Render `(latitude, longitude)` pairs as a WPL file. An empty slice gives
/// the header line only.
pub fn to_qgc_wpl(points: &[(f64, f64)]) -> String {
    let mut out = String::with_capacity(32 + points.len() * 64);
    out.push_str(QGC_WPL_HEADER);
    out.push('\n');

    for (i, &(lat, lon)) in points.iter().enumerate() {
        let (current, command) = if i == 0 {
            (1, CMD_HOME)
        } else {
            (0, CMD_WAYPOINT)
        };
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "{}\t{}\t0\t{}\t0\t0\t0\t0\t{}\t{}\t{}\t1",
            i,
            current,
            command,
            coordinate(lat),
            coordinate(lon),
            ALTITUDE
        );
    }

    out
}

/// [`to_qgc_wpl`] over stored waypoints, in the given order.
pub fn waypoints_to_qgc_wpl(waypoints: &[Waypoint]) -> String {
    let points: Vec<(f64, f64)> = waypoints.iter().map(|w| (w.latitude, w.longitude)).collect();
    to_qgc_wpl(&points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_format() {
        assert_eq!(coordinate(1.0), "1.0");
        assert_eq!(coordinate(-3.0), "-3.0");
        assert_eq!(coordinate(47.123456), "47.123456");
        assert_eq!(coordinate(0.00001), "0.00001");
        assert_eq!(coordinate(-0.000002), "-0.000002");
    }

    #[test]
    fn test_empty_is_header_only() {
        assert_eq!(to_qgc_wpl(&[]), "QGC WPL 110\n");
    }

    #[test]
    fn test_home_and_waypoint_lines() {
        let text = to_qgc_wpl(&[(1.0, 2.0), (3.0, 4.0)]);
        assert_eq!(
            text,
            "QGC WPL 110\n\
             0\t1\t0\t3\t0\t0\t0\t0\t1.0\t2.0\t100.000000\t1\n\
             1\t0\t0\t16\t0\t0\t0\t0\t3.0\t4.0\t100.000000\t1\n"
        );
    }
}

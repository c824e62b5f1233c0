//! Route ordering and WPL export over realistic waypoint sets.

use mission::{apply_order, sequence, to_qgc_wpl, waypoints_to_qgc_wpl};
use planner_common::Waypoint;
use test_utils::waypoints::SQUARE;

// ============================================================================
// Helper functions
// ============================================================================

/// Positions as (x = longitude, y = latitude).
fn positions(latlon: &[(f64, f64)]) -> Vec<(f64, f64)> {
    latlon.iter().map(|&(lat, lon)| (lon, lat)).collect()
}

/// Deterministic pseudo-random points in a unit square.
fn scattered(n: usize) -> Vec<(f64, f64)> {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = || {
        state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };
    (0..n).map(|_| (next(), next())).collect()
}

fn waypoint(id: i64, lat: f64, lon: f64) -> Waypoint {
    Waypoint {
        id,
        name: format!("WP{}", id),
        latitude: lat,
        longitude: lon,
        description: None,
    }
}

// ============================================================================
// Route sequencing
// ============================================================================

#[test]
fn test_square_in_order_is_identity() {
    assert_eq!(sequence(&positions(&SQUARE)), vec![0, 1, 2, 3]);
}

#[test]
fn test_square_shuffled() {
    let shuffled = [SQUARE[0], SQUARE[2], SQUARE[1], SQUARE[3]];
    let order = sequence(&positions(&shuffled));
    assert_eq!(order, vec![0, 2, 1, 3]);
    assert_eq!(apply_order(&shuffled, &order), SQUARE.to_vec());
}

#[test]
fn test_sequence_is_permutation() {
    let points = scattered(200);
    let order = sequence(&points);
    assert_eq!(order[0], 0);

    let mut sorted = order.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, (0..200).collect::<Vec<_>>());
}

#[test]
fn test_sequence_does_not_mutate_input() {
    let points = scattered(20);
    let before = points.clone();
    let _ = sequence(&points);
    assert_eq!(points, before);
}

#[test]
fn test_each_step_is_nearest() {
    let points = scattered(50);
    let order = sequence(&points);
    let dist = |a: usize, b: usize| {
        let (ax, ay) = points[a];
        let (bx, by) = points[b];
        (ax - bx).hypot(ay - by)
    };
    for step in 1..order.len() {
        let from = order[step - 1];
        let chosen = dist(from, order[step]);
        for &later in &order[step..] {
            assert!(chosen <= dist(from, later));
        }
    }
}

// ============================================================================
// WPL export
// ============================================================================

#[test]
fn test_export_two_points() {
    let text = to_qgc_wpl(&[(1.0, 2.0), (3.0, 4.0)]);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "QGC WPL 110");

    let home: Vec<&str> = lines[1].split('\t').collect();
    assert_eq!(home.len(), 12);
    assert_eq!((home[0], home[1], home[3]), ("0", "1", "3"));
    assert_eq!((home[8], home[9]), ("1.0", "2.0"));

    let wp: Vec<&str> = lines[2].split('\t').collect();
    assert_eq!((wp[0], wp[1], wp[3]), ("1", "0", "16"));
    assert_eq!((wp[8], wp[9]), ("3.0", "4.0"));
    assert_eq!(wp[10], "100.000000");
}

#[test]
fn test_export_stored_waypoints() {
    let stored: Vec<Waypoint> = SQUARE
        .iter()
        .enumerate()
        .map(|(i, &(lat, lon))| waypoint(i as i64 + 1, lat, lon))
        .collect();
    let text = waypoints_to_qgc_wpl(&stored);

    assert!(text.ends_with('\n'));
    let last: Vec<&str> = text.lines().last().unwrap().split('\t').collect();
    assert_eq!(last[0], "3");
    assert_eq!((last[8], last[9]), ("51.99", "5.66"));
}

//! Greedy nearest-neighbour ordering of 2-D points.

/// Visit order starting at index 0, always moving to the closest unvisited
/// point (Euclidean). Ties go to the lowest index.
///
/// Fewer than two points come back in their given order.
pub fn sequence(points: &[(f64, f64)]) -> Vec<usize> {
    let n = points.len();
    if n < 2 {
        return (0..n).collect();
    }

    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let mut current = 0;
    visited[0] = true;
    order.push(0);

    while order.len() < n {
        let (cx, cy) = points[current];
        let mut nearest: Option<(usize, f64)> = None;
        for (i, &(x, y)) in points.iter().enumerate() {
            if visited[i] {
                continue;
            }
            let d = (x - cx).hypot(y - cy);
            // Strict comparison keeps the lowest index on ties.
            if nearest.map_or(true, |(_, best)| d < best) {
                nearest = Some((i, d));
            }
        }
        let Some((next, _)) = nearest else { break };
        visited[next] = true;
        order.push(next);
        current = next;
    }

    order
}

/// `items` rearranged by `order`; out-of-range indices are skipped.
pub fn apply_order<T: Clone>(items: &[T], order: &[usize]) -> Vec<T> {
    order.iter().filter_map(|&i| items.get(i).cloned()).collect()
}

/// Euclidean distance, scaled by the largest coordinate gap so the squared terms
/// stay in range for any finite inputs whose distance is representable.
#[inline]
pub(crate) fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let scale = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max);
    if scale == 0.0 || !scale.is_finite() {
        return scale;
    }
    let sum: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let r = (x - y) / scale;
            r * r
        })
        .sum();
    scale * sum.sqrt()
}

/// Index and distance of the nearest center. Ties go to the lowest index.
pub(crate) fn nearest_center(point: &[f64], centers: &[Vec<f64>]) -> (usize, f64) {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (idx, center) in centers.iter().enumerate() {
        let d = euclidean(point, center);
        if d < best_dist {
            best_dist = d;
            best = idx;
        }
    }
    (best, best_dist)
}

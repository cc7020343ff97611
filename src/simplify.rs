//! Douglas-Peucker line simplification.
//!
//! Runs over an explicit work stack instead of recursing, so call depth stays
//! constant regardless of route length. Distances are planar in degree
//! space (x = longitude, y = latitude), which is what a display tolerance
//! of ~1e-4° expects.

use crate::GeoPoint;

/// Simplify a route, dropping points that lie within `tolerance_degrees` of
/// the chord between their kept neighbours.
///
/// - The first and last points are always kept.
/// - Input shorter than 3 points is returned unchanged.
/// - A larger tolerance never yields more points.
/// - Negative or non-finite tolerance is treated as 0 (only exactly
///   colinear points are dropped).
///
/// # Example
/// ```
/// use route_poi::{simplify, GeoPoint};
///
/// let line = vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0), GeoPoint::new(0.0, 2.0)];
/// assert_eq!(simplify(&line, 0.5), vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 2.0)]);
/// ```
pub fn simplify(points: &[GeoPoint], tolerance_degrees: f64) -> Vec<GeoPoint> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let keep = retained_mask(points, tolerance_degrees);
    points
        .iter()
        .zip(&keep)
        .filter(|(_, &kept)| kept)
        .map(|(p, _)| *p)
        .collect()
}

/// Indices of the points [`simplify`] keeps, in route order.
pub fn simplify_indices(points: &[GeoPoint], tolerance_degrees: f64) -> Vec<usize> {
    if points.len() < 3 {
        return (0..points.len()).collect();
    }

    retained_mask(points, tolerance_degrees)
        .iter()
        .enumerate()
        .filter(|(_, &kept)| kept)
        .map(|(i, _)| i)
        .collect()
}

fn retained_mask(points: &[GeoPoint], tolerance_degrees: f64) -> Vec<bool> {
    let tolerance = if tolerance_degrees.is_finite() {
        tolerance_degrees.max(0.0)
    } else {
        0.0
    };

    let n = points.len();
    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    let mut stack: Vec<(usize, usize)> = vec![(0, n - 1)];

    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }

        let mut max_dist = 0.0;
        let mut max_idx = start;
        for (i, p) in points.iter().enumerate().take(end).skip(start + 1) {
            let dist = perpendicular_distance(p, &points[start], &points[end]);
            if dist > max_dist {
                max_dist = dist;
                max_idx = i;
            }
        }

        if max_dist > tolerance {
            keep[max_idx] = true;
            stack.push((start, max_idx));
            stack.push((max_idx, end));
        }
    }

    keep
}

/// Distance from `p` to the line through `a` and `b`, in degrees.
/// Falls back to the distance to `a` when the chord has zero length.
fn perpendicular_distance(p: &GeoPoint, a: &GeoPoint, b: &GeoPoint) -> f64 {
    let dx = b.longitude - a.longitude;
    let dy = b.latitude - a.latitude;
    let chord = dx.hypot(dy);

    let px = p.longitude - a.longitude;
    let py = p.latitude - a.latitude;

    if chord == 0.0 {
        return px.hypot(py);
    }

    (dx * py - dy * px).abs() / chord
}

//! Corner smoothing for display.
//!
//! Sharp turns get extra Catmull-Rom points on the segments either side of
//! the corner. Real route points are never removed or moved: the corner
//! itself stays in the output and every inserted point lies strictly between
//! two original neighbours.
//!
//! [`optimize_polyline`] is the full display pipeline: simplify long routes,
//! then smooth.

use log::debug;

use crate::config::RenderConfig;
use crate::simplify::simplify;
use crate::GeoPoint;

/// Interpolated points inserted around each sharp corner by default.
pub const DEFAULT_INTERPOLATION_POINTS: usize = 5;

/// Turn angle at `current`, in degrees.
///
/// 0° is a straight continuation, 90° a right-angle turn and 180° a full
/// reversal. Longitude is scaled by the cosine of the corner latitude so the
/// angle is measured on the ground rather than in raw degrees. A repeated
/// point (zero-length vector) counts as no turn.
///
/// # Example
/// ```
/// use route_poi::{calculate_turn_angle, GeoPoint};
///
/// let angle = calculate_turn_angle(
///     &GeoPoint::new(0.0, 0.0),
///     &GeoPoint::new(0.0, 0.01),
///     &GeoPoint::new(0.01, 0.01),
/// );
/// assert!((angle - 90.0).abs() < 1.0);
/// ```
pub fn calculate_turn_angle(prev: &GeoPoint, current: &GeoPoint, next: &GeoPoint) -> f64 {
    let scale = current.latitude.to_radians().cos();

    // Both vectors point away from the corner
    let (ax, ay) = (
        (prev.longitude - current.longitude) * scale,
        prev.latitude - current.latitude,
    );
    let (bx, by) = (
        (next.longitude - current.longitude) * scale,
        next.latitude - current.latitude,
    );

    let len_a = ax.hypot(ay);
    let len_b = bx.hypot(by);
    if len_a == 0.0 || len_b == 0.0 {
        return 0.0;
    }

    let dot = ((ax * bx + ay * by) / (len_a * len_b)).clamp(-1.0, 1.0);
    180.0 - dot.acos().to_degrees()
}

/// Insert [`DEFAULT_INTERPOLATION_POINTS`] Catmull-Rom points around every
/// corner whose turn exceeds `angle_threshold_degrees`.
pub fn smooth_sharp_corners(points: &[GeoPoint], angle_threshold_degrees: f64) -> Vec<GeoPoint> {
    smooth_sharp_corners_with(points, angle_threshold_degrees, DEFAULT_INTERPOLATION_POINTS)
}

/// Insert `interpolation_points` Catmull-Rom points around every corner
/// whose turn exceeds `angle_threshold_degrees`.
///
/// The points are split between the approach segment (the larger half,
/// placed in its second half, closing on the corner) and the exit segment
/// (placed in its first half). Output is never shorter than input and keeps
/// the first and last points.
pub fn smooth_sharp_corners_with(
    points: &[GeoPoint],
    angle_threshold_degrees: f64,
    interpolation_points: usize,
) -> Vec<GeoPoint> {
    let n = points.len();
    if n < 3 || interpolation_points == 0 {
        return points.to_vec();
    }

    let sharp: Vec<bool> = (0..n)
        .map(|i| {
            i > 0
                && i + 1 < n
                && calculate_turn_angle(&points[i - 1], &points[i], &points[i + 1])
                    > angle_threshold_degrees
        })
        .collect();

    let corner_count = sharp.iter().filter(|&&s| s).count();
    if corner_count == 0 {
        return points.to_vec();
    }

    let approach_count = interpolation_points - interpolation_points / 2;
    let exit_count = interpolation_points / 2;

    let mut out =
        Vec::with_capacity(n.saturating_add(corner_count.saturating_mul(interpolation_points)));

    for j in 0..n - 1 {
        out.push(points[j]);

        let p0 = if j == 0 { &points[j] } else { &points[j - 1] };
        let p1 = &points[j];
        let p2 = &points[j + 1];
        let p3 = if j + 2 < n { &points[j + 2] } else { &points[j + 1] };

        // Leaving the corner at j: t in (0, 0.5)
        if sharp[j] {
            for k in 1..=exit_count {
                let t = 0.5 * k as f64 / (exit_count + 1) as f64;
                out.push(catmull_rom(p0, p1, p2, p3, t));
            }
        }

        // Approaching the corner at j + 1: t in (0.5, 1)
        if sharp[j + 1] {
            for k in 1..=approach_count {
                let t = 0.5 + 0.5 * k as f64 / (approach_count + 1) as f64;
                out.push(catmull_rom(p0, p1, p2, p3, t));
            }
        }
    }
    out.push(points[n - 1]);

    debug!(
        "[Smoothing] {} sharp corners, {} -> {} points",
        corner_count,
        n,
        out.len()
    );

    out
}

/// Uniform Catmull-Rom interpolation between `p1` and `p2`.
fn catmull_rom(p0: &GeoPoint, p1: &GeoPoint, p2: &GeoPoint, p3: &GeoPoint, t: f64) -> GeoPoint {
    let t2 = t * t;
    let t3 = t2 * t;
    let blend = |a: f64, b: f64, c: f64, d: f64| {
        0.5 * (2.0 * b
            + (c - a) * t
            + (2.0 * a - 5.0 * b + 4.0 * c - d) * t2
            + (3.0 * b - a - 3.0 * c + d) * t3)
    };
    GeoPoint::new(
        blend(p0.latitude, p1.latitude, p2.latitude, p3.latitude),
        blend(p0.longitude, p1.longitude, p2.longitude, p3.longitude),
    )
}

/// Prepare a route for rendering.
///
/// Routes longer than [`RenderConfig::simplify_threshold`] are simplified
/// first, then sharp corners are always smoothed.
pub fn optimize_polyline(points: &[GeoPoint], config: &RenderConfig) -> Vec<GeoPoint> {
    let base = if points.len() > config.simplify_threshold {
        let simplified = simplify(points, config.simplification_tolerance);
        debug!(
            "[Smoothing] Simplified {} -> {} points (tolerance {})",
            points.len(),
            simplified.len(),
            config.simplification_tolerance
        );
        simplified
    } else {
        points.to_vec()
    };

    smooth_sharp_corners_with(
        &base,
        config.corner_angle_threshold,
        config.interpolation_points,
    )
}

//! # Geographic Utilities
//!
//! Spherical-Earth helpers shared by the proximity, ranking and discovery
//! modules.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two points |
//! | [`initial_bearing`] | Initial great-circle bearing, in radians |
//! | [`polyline_length`] | Total length of a route in meters |
//! | [`compute_bounds`] | Bounding box of a route |
//! | [`compute_center`] | Center of a route's bounding box |
//! | [`meters_to_degrees`] | Approximate degree span of a distance at a latitude |
//! | [`sample_evenly`] | Points evenly spaced by distance along a route |
//!
//! All distances use a sphere of radius [`EARTH_RADIUS_M`] so that the
//! cross-track and point-to-point measures agree exactly on degenerate input.

use geo::{BoundingRect, Coord, LineString};

use crate::{Bounds, GeoPoint};

/// Mean Earth radius used by every spherical computation, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude on the sphere above.
const METERS_PER_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// Great-circle distance between two points in meters (haversine formula).
///
/// Uses [`EARTH_RADIUS_M`]; `geo::Haversine` uses 6,371,008.8 m and would
/// disagree with [`crate::proximity::cross_track_distance_meters`].
///
/// # Example
///
/// ```rust
/// use route_poi::{GeoPoint, geo_utils};
///
/// let london = GeoPoint::new(51.5074, -0.1278);
/// let paris = GeoPoint::new(48.8566, 2.3522);
///
/// let distance = geo_utils::haversine_distance(&london, &paris);
/// assert!((distance - 343_500.0).abs() < 2_000.0);
/// ```
#[inline]
pub fn haversine_distance(p1: &GeoPoint, p2: &GeoPoint) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let delta_lat = (p2.latitude - p1.latitude).to_radians();
    let delta_lng = (p2.longitude - p1.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    // Rounding can push `a` a hair above 1 for antipodal points
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Initial bearing of the great circle from `from` to `to`, in radians.
///
/// Measured clockwise from true north in `(-π, π]`. Coincident points
/// yield `0.0`.
#[inline]
pub fn initial_bearing(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lng = (to.longitude - from.longitude).to_radians();

    let y = delta_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lng.cos();
    y.atan2(x)
}

/// Total length of a route in meters. Empty or single-point routes are 0.0.
pub fn polyline_length(points: &[GeoPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Bounding box of a route, or `None` when the route is empty.
pub fn compute_bounds(points: &[GeoPoint]) -> Option<Bounds> {
    let line: LineString<f64> = points.iter().map(|p| Coord::from(*p)).collect();
    let rect = line.bounding_rect()?;
    Some(Bounds {
        min_lat: rect.min().y,
        max_lat: rect.max().y,
        min_lng: rect.min().x,
        max_lng: rect.max().x,
    })
}

/// Center of a route's bounding box.
pub fn compute_center(points: &[GeoPoint]) -> Option<GeoPoint> {
    compute_bounds(points).map(|b| b.center())
}

/// Convert meters to an approximate `(lat_degrees, lng_degrees)` span at a
/// given latitude. Longitude span is capped near the poles.
pub fn meters_to_degrees(meters: f64, latitude: f64) -> (f64, f64) {
    let lat_deg = meters / METERS_PER_DEGREE;
    let cos_lat = latitude.to_radians().cos().max(0.01);
    (lat_deg, lat_deg / cos_lat)
}

/// Pick `count` points evenly spaced by distance along a route.
///
/// The first and last route points are always included when `count >= 2`.
/// Intermediate points are linearly interpolated within the segment they
/// fall on. A zero-length route yields just its first point.
pub fn sample_evenly(points: &[GeoPoint], count: usize) -> Vec<GeoPoint> {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Vec::new(),
    };
    if count == 0 {
        return Vec::new();
    }
    if points.len() == 1 || count == 1 {
        return vec![first];
    }

    let total_length = polyline_length(points);
    if total_length <= 0.0 {
        return vec![first];
    }

    let step = total_length / (count - 1) as f64;
    let mut samples = Vec::with_capacity(count);
    samples.push(first);

    let mut accumulated = 0.0;
    let mut target = step;

    for w in points.windows(2) {
        let (p1, p2) = (&w[0], &w[1]);
        let seg_dist = haversine_distance(p1, p2);

        while seg_dist > 0.0 && accumulated + seg_dist >= target && samples.len() < count - 1 {
            let ratio = (target - accumulated) / seg_dist;
            samples.push(GeoPoint::new(
                p1.latitude + ratio * (p2.latitude - p1.latitude),
                p1.longitude + ratio * (p2.longitude - p1.longitude),
            ));
            target += step;
        }

        accumulated += seg_dist;
    }

    samples.push(last);
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_zero_for_same_point() {
        let p = GeoPoint::new(45.0, 7.0);
        assert_eq!(haversine_distance(&p, &p), 0.0);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(1.0, 0.0);
        let d = haversine_distance(&a, &b);
        assert!((d - METERS_PER_DEGREE).abs() < 1e-6);
    }

    #[test]
    fn test_initial_bearing_cardinal_directions() {
        let origin = GeoPoint::new(0.0, 0.0);
        let north = initial_bearing(&origin, &GeoPoint::new(1.0, 0.0));
        let east = initial_bearing(&origin, &GeoPoint::new(0.0, 1.0));
        assert!(north.abs() < 1e-9);
        assert!((east - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_compute_bounds_and_center() {
        let points = vec![
            GeoPoint::new(10.0, 20.0),
            GeoPoint::new(12.0, 18.0),
            GeoPoint::new(11.0, 22.0),
        ];
        let bounds = compute_bounds(&points).unwrap();
        assert_eq!(bounds.min_lat, 10.0);
        assert_eq!(bounds.max_lat, 12.0);
        assert_eq!(bounds.min_lng, 18.0);
        assert_eq!(bounds.max_lng, 22.0);
        assert_eq!(compute_center(&points), Some(GeoPoint::new(11.0, 20.0)));
        assert!(compute_bounds(&[]).is_none());
    }

    #[test]
    fn test_sample_evenly_includes_endpoints() {
        let route: Vec<GeoPoint> = (0..=10).map(|i| GeoPoint::new(0.0, i as f64 * 0.01)).collect();
        let samples = sample_evenly(&route, 8);
        assert_eq!(samples.len(), 8);
        assert_eq!(samples[0], route[0]);
        assert_eq!(samples[7], route[10]);

        // Evenly spaced along a straight line
        let gaps: Vec<f64> = samples
            .windows(2)
            .map(|w| haversine_distance(&w[0], &w[1]))
            .collect();
        for gap in &gaps {
            assert!((gap - gaps[0]).abs() < 1.0);
        }
    }

    #[test]
    fn test_sample_evenly_degenerate_inputs() {
        assert!(sample_evenly(&[], 8).is_empty());
        let p = GeoPoint::new(1.0, 1.0);
        assert_eq!(sample_evenly(&[p], 8), vec![p]);
        assert_eq!(sample_evenly(&[p, p, p], 8), vec![p]);
    }

    #[test]
    fn test_meters_to_degrees() {
        let (lat_deg, lng_deg) = meters_to_degrees(METERS_PER_DEGREE, 60.0);
        assert!((lat_deg - 1.0).abs() < 1e-9);
        assert!((lng_deg - 2.0).abs() < 1e-6);
    }
}

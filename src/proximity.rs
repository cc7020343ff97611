//! Distance from a place to a route.
//!
//! Uses cross-track distance on a spherical Earth. Every segment is scanned
//! for each queried point, so attaching distances to M candidates over an
//! N-point route costs O(N·M). That is fine for routes of a few thousand
//! points.
// TODO: bucket segments in an rstar R-tree once routes or candidate batches
// grow past a few thousand, and query only segments near each candidate.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{Result, RoutePoiError};
use crate::geo_utils::{haversine_distance, initial_bearing, EARTH_RADIUS_M};
use crate::poi::PoiCandidate;
use crate::GeoPoint;

/// Distance in meters from `point` to the segment `start`→`end`.
///
/// Inside the segment's span this is the absolute cross-track distance
/// `|asin(sin(d13/R) · sin(θ13 − θ12)) · R|`. When the point projects
/// before `start` or past `end`, the distance to that endpoint is used
/// instead. A zero-length segment falls back to the point distance.
pub fn cross_track_distance_meters(point: &GeoPoint, start: &GeoPoint, end: &GeoPoint) -> f64 {
    let d13 = haversine_distance(start, point);
    if d13 == 0.0 {
        return 0.0;
    }

    let d12 = haversine_distance(start, end);
    if d12 == 0.0 {
        return d13;
    }

    let delta_bearing = initial_bearing(start, point) - initial_bearing(start, end);

    // Behind the start of the segment
    if delta_bearing.cos() < 0.0 {
        return d13;
    }

    let angular_d13 = d13 / EARTH_RADIUS_M;
    let angular_xt = (angular_d13.sin() * delta_bearing.sin()).clamp(-1.0, 1.0).asin();

    // tan(at) = tan(d13) · cos(θ13 − θ12), well conditioned for short distances
    let along_track = (angular_d13.sin() * delta_bearing.cos()).atan2(angular_d13.cos())
        * EARTH_RADIUS_M;

    // Past the end of the segment
    if along_track > d12 {
        return haversine_distance(point, end);
    }

    (angular_xt * EARTH_RADIUS_M).abs()
}

/// Minimum distance in meters from `point` to any segment of `route`.
///
/// A single-point route measures the distance to that point. Returns `None`
/// for an empty route or an out-of-range `point`, so callers never see an
/// infinite or NaN distance.
///
/// # Example
/// ```
/// use route_poi::{distance_to_route_meters, GeoPoint};
///
/// let route = vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.02)];
/// let d = distance_to_route_meters(&GeoPoint::new(0.001, 0.01), &route).unwrap();
/// assert!((d - 111.2).abs() < 1.0);
/// ```
pub fn distance_to_route_meters(point: &GeoPoint, route: &[GeoPoint]) -> Option<f64> {
    if !point.is_valid() {
        return None;
    }
    match route {
        [] => None,
        [only] => Some(haversine_distance(point, only)),
        _ => Some(
            route
                .windows(2)
                .map(|w| cross_track_distance_meters(point, &w[0], &w[1]))
                .fold(f64::MAX, f64::min),
        ),
    }
}

/// Fill `distance_to_route_meters` on every candidate.
///
/// Always measure against the full, unsimplified route.
pub fn attach_route_distances(candidates: &mut [PoiCandidate], route: &[GeoPoint]) -> Result<()> {
    if route.is_empty() {
        return Err(RoutePoiError::InsufficientPoints {
            point_count: 0,
            minimum_required: 1,
        });
    }

    #[cfg(feature = "parallel")]
    candidates.par_iter_mut().for_each(|c| {
        c.distance_to_route_meters = distance_to_route_meters(&c.location, route);
    });

    #[cfg(not(feature = "parallel"))]
    for c in candidates.iter_mut() {
        c.distance_to_route_meters = distance_to_route_meters(&c.location, route);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_route_matches_haversine() {
        let a = GeoPoint::new(48.8566, 2.3522);
        let p = GeoPoint::new(48.86, 2.36);
        let d = distance_to_route_meters(&p, &[a, a]).unwrap();
        assert_eq!(d, haversine_distance(&p, &a));
        assert!(d.is_finite());
    }

    #[test]
    fn test_point_on_route_is_zero() {
        let route = vec![GeoPoint::new(10.0, 10.0), GeoPoint::new(10.0, 10.1)];
        assert_eq!(distance_to_route_meters(&route[0], &route), Some(0.0));
        let mid = distance_to_route_meters(&GeoPoint::new(10.0, 10.05), &route).unwrap();
        // Great circle bows slightly away from the parallel
        assert!(mid < 5.0);
    }

    #[test]
    fn test_perpendicular_offset_at_equator() {
        let route = vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.02)];
        let p = GeoPoint::new(0.001, 0.01);
        let d = distance_to_route_meters(&p, &route).unwrap();
        let expected = haversine_distance(&p, &GeoPoint::new(0.0, 0.01));
        assert!((d - expected).abs() < 0.01);
    }

    #[test]
    fn test_beyond_segment_end_uses_endpoint() {
        let route = vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.01)];
        // Colinear with the segment but 10 km past its end
        let far = GeoPoint::new(0.0, 0.1);
        let d = distance_to_route_meters(&far, &route).unwrap();
        assert!((d - haversine_distance(&far, &route[1])).abs() < 1e-6);

        let behind = GeoPoint::new(0.0, -0.05);
        let d = distance_to_route_meters(&behind, &route).unwrap();
        assert!((d - haversine_distance(&behind, &route[0])).abs() < 1e-6);
    }

    #[test]
    fn test_minimum_over_all_segments() {
        let route = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.01),
            GeoPoint::new(0.01, 0.01),
        ];
        // Close to the second leg only
        let p = GeoPoint::new(0.005, 0.0102);
        let d = distance_to_route_meters(&p, &route).unwrap();
        assert!(d < 25.0, "distance was {}", d);
    }

    #[test]
    fn test_empty_and_single_point_routes() {
        let p = GeoPoint::new(1.0, 1.0);
        assert_eq!(distance_to_route_meters(&p, &[]), None);
        let only = GeoPoint::new(1.0, 1.001);
        assert_eq!(
            distance_to_route_meters(&p, &[only]),
            Some(haversine_distance(&p, &only))
        );
    }

    #[test]
    fn test_attach_route_distances() {
        let route = vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.02)];
        let mut candidates = vec![
            PoiCandidate::new("near", 0.0005, 0.01),
            PoiCandidate::new("far", 0.01, 0.01),
        ];
        attach_route_distances(&mut candidates, &route).unwrap();
        let near = candidates[0].distance_to_route_meters.unwrap();
        let far = candidates[1].distance_to_route_meters.unwrap();
        assert!(near < far);
        assert!(near >= 0.0);

        assert!(attach_route_distances(&mut candidates, &[]).is_err());
    }

    #[test]
    fn test_invalid_point_has_no_distance() {
        let route = vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.02)];
        assert_eq!(distance_to_route_meters(&GeoPoint::new(f64::NAN, 0.01), &route), None);
        assert_eq!(distance_to_route_meters(&GeoPoint::new(0.0, 200.0), &route), None);

        let mut candidates = vec![PoiCandidate::new("lost", f64::NAN, f64::NAN)];
        attach_route_distances(&mut candidates, &route).unwrap();
        assert_eq!(candidates[0].distance_to_route_meters, None);
    }
}

//! Property-based tests for the route geometry pipeline.
//!
//! # Invariants tested
//!
//! - **Round trip:** decode(encode(p)) is within 1e-5 of p per coordinate.
//! - **Endpoints:** simplification and smoothing keep the first and last points.
//! - **Monotonicity:** a larger tolerance never keeps more points.
//! - **Smoothing:** output is never shorter and keeps every original point in order.
//! - **Degenerate segments:** cross-track distance to A→A equals haversine to A.
//! - **Idempotence:** ranking the same candidates twice gives the same order.

use proptest::prelude::*;
use route_poi::geo_utils::haversine_distance;
use route_poi::simplify::simplify_indices;
use route_poi::{
    cross_track_distance_meters, decode, encode, rank, simplify, smooth_sharp_corners, GeoPoint,
    PoiCandidate,
};

fn point_strategy() -> impl Strategy<Value = GeoPoint> {
    (-89.0..89.0f64, -179.0..179.0f64).prop_map(|(lat, lng)| GeoPoint::new(lat, lng))
}

/// A wandering route near a fixed origin, like a real trip.
fn route_strategy(max_len: usize) -> impl Strategy<Value = Vec<GeoPoint>> {
    prop::collection::vec((-0.01..0.01f64, -0.01..0.01f64), 2..max_len).prop_map(|steps| {
        let mut lat = 45.0;
        let mut lng = 7.0;
        steps
            .into_iter()
            .map(|(dlat, dlng)| {
                lat += dlat;
                lng += dlng;
                GeoPoint::new(lat, lng)
            })
            .collect()
    })
}

fn candidate_strategy() -> impl Strategy<Value = Vec<PoiCandidate>> {
    let one = (
        0.0..0.02f64,
        0.0..0.02f64,
        prop::option::of(0.0..5.0f64),
        prop::option::of(0u32..5000),
        any::<bool>(),
        prop::sample::select(vec!["cafe", "museum", "park", "bar"]),
    );
    prop::collection::vec(one, 0..30).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (lat, lng, rating, reviews, open, category))| {
                let mut poi = PoiCandidate::new(&format!("poi-{}", i), lat, lng)
                    .with_open(open)
                    .with_categories(&[category]);
                poi.rating = rating;
                poi.review_count = reviews;
                poi
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn round_trip_within_precision(points in prop::collection::vec(point_strategy(), 0..50)) {
        let decoded = decode(&encode(&points)).unwrap();
        prop_assert_eq!(decoded.len(), points.len());
        for (a, b) in points.iter().zip(&decoded) {
            prop_assert!((a.latitude - b.latitude).abs() <= 1e-5);
            prop_assert!((a.longitude - b.longitude).abs() <= 1e-5);
        }
    }

    #[test]
    fn simplify_keeps_endpoints(route in route_strategy(200), tolerance in 0.0..0.05f64) {
        let simplified = simplify(&route, tolerance);
        prop_assert!(simplified.len() >= 2);
        prop_assert!(simplified.len() <= route.len());
        prop_assert_eq!(simplified.first(), route.first());
        prop_assert_eq!(simplified.last(), route.last());
    }

    #[test]
    fn simplify_is_monotone_in_tolerance(
        route in route_strategy(200),
        low in 0.0..0.01f64,
        extra in 0.0..0.01f64,
    ) {
        let fine = simplify_indices(&route, low);
        let coarse = simplify_indices(&route, low + extra);
        prop_assert!(coarse.len() <= fine.len());
        // Every point kept at the coarse tolerance is kept at the fine one
        for i in &coarse {
            prop_assert!(fine.contains(i));
        }
    }

    #[test]
    fn smoothing_never_drops_points(route in route_strategy(60), threshold in 0.0..180.0f64) {
        let smoothed = smooth_sharp_corners(&route, threshold);
        prop_assert!(smoothed.len() >= route.len());
        prop_assert_eq!(smoothed.first(), route.first());
        prop_assert_eq!(smoothed.last(), route.last());

        // Original points appear as a subsequence
        let mut cursor = smoothed.iter();
        for p in &route {
            prop_assert!(cursor.any(|s| s == p));
        }
    }

    #[test]
    fn degenerate_segment_is_point_distance(a in point_strategy(), p in point_strategy()) {
        let d = cross_track_distance_meters(&p, &a, &a);
        prop_assert!(d.is_finite());
        prop_assert_eq!(d, haversine_distance(&p, &a));
    }

    #[test]
    fn ranking_is_idempotent(
        candidates in candidate_strategy(),
        chosen in prop::collection::vec(prop::sample::select(vec!["cafe", "park"]), 0..3),
    ) {
        let center = GeoPoint::new(0.01, 0.01);
        let chosen: Vec<String> = chosen.into_iter().map(String::from).collect();

        let first = rank(candidates.clone(), &center, &chosen, None);
        let second = rank(candidates, &center, &chosen, None);
        prop_assert_eq!(&first, &second);

        for w in first.windows(2) {
            prop_assert!(w[0].score >= w[1].score);
        }
    }
}

//! # Route POI
//!
//! Route geometry and point-of-interest matching.
//!
//! This library provides:
//! - Encoded polyline decoding and encoding
//! - Douglas-Peucker simplification and Catmull-Rom corner smoothing for display
//! - Cross-track distance from a place to a route
//! - Multi-factor POI ranking and filtering
//! - Concurrent along-route discovery against a caller-supplied places source
//!
//! ## Features
//!
//! - **`parallel`** - Attach route distances to candidates in parallel with rayon
//! - **`discovery`** - Enable concurrent along-route discovery (default)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use route_poi::{EngineConfig, PoiCandidate, PoiFilter, RankingStrategy, RouteSession};
//!
//! let config = EngineConfig::default();
//! let session = RouteSession::from_encoded("_p~iF~ps|U_ulLnnqC_mqNvxq`@", config).unwrap();
//!
//! let candidates = vec![
//!     PoiCandidate::new("Cafe", 38.5, -120.2).with_rating(4.5).with_categories(&["cafe"]),
//! ];
//!
//! let strategy = RankingStrategy::WeightedScore(Default::default());
//! let ranked = session.rank_candidates(candidates, &PoiFilter::default(), &strategy);
//! assert_eq!(ranked.len(), 1);
//! println!("render {} points", session.render_points().len());
//! ```

use geo::Coord;
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{OptionExt, Result, RoutePoiError};

// Configuration for every pipeline stage
pub mod config;
pub use config::{DiscoveryConfig, EngineConfig, RankingConfig, RenderConfig};

// Geographic utilities (distance, bearing, bounds, sampling)
pub mod geo_utils;

// Encoded polyline wire format
pub mod polyline;
pub use polyline::{decode, encode};

// Douglas-Peucker simplification
pub mod simplify;
pub use simplify::simplify;

// Catmull-Rom corner smoothing and the display pipeline
pub mod smoothing;
pub use smoothing::{calculate_turn_angle, optimize_polyline, smooth_sharp_corners};

// Distance from a place to a route
pub mod proximity;
pub use proximity::{attach_route_distances, cross_track_distance_meters, distance_to_route_meters};

// POI model, filtering and ranking strategies
pub mod poi;
pub use poi::{OperationalStatus, PoiCandidate, RawPlace};

pub mod ranking;
pub use ranking::{
    apply_filters, rank, rank_with_strategy, PoiFilter, RankedPoi, RankingStrategy,
    RankingWeights, ScoreBreakdown,
};

// Along-route discovery against an injected places source
#[cfg(feature = "discovery")]
pub mod discovery;
#[cfg(feature = "discovery")]
pub use discovery::{discover_along_route, DiscoveryReport, PlaceQuery, PlacesSource};

// Caller-owned session tying the pipeline together
pub mod session;
pub use session::{RouteSession, SearchResult};

// ============================================================================
// Core Types
// ============================================================================

/// A WGS-84 coordinate with latitude and longitude in decimal degrees.
///
/// # Example
/// ```
/// use route_poi::GeoPoint;
/// let point = GeoPoint::new(51.5074, -0.1278); // London
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new point.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl From<GeoPoint> for Coord<f64> {
    fn from(p: GeoPoint) -> Self {
        Coord {
            x: p.longitude,
            y: p.latitude,
        }
    }
}

impl From<Coord<f64>> for GeoPoint {
    fn from(c: Coord<f64>) -> Self {
        GeoPoint::new(c.y, c.x)
    }
}

/// Bounding box for a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from points.
    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        geo_utils::compute_bounds(points)
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// Check whether a point lies inside the bounds (inclusive).
    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.latitude)
            && (self.min_lng..=self.max_lng).contains(&point.longitude)
    }
}

// ============================================================================
// Tests
// ============================================================================

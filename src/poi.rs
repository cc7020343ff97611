//! Place candidates.
//!
//! [`RawPlace`] is what an upstream places source hands back;
//! [`PoiCandidate`] is the engine's view of it, carrying the derived
//! distance to the route once it has been measured.

use serde::{Deserialize, Serialize};

use crate::GeoPoint;

/// Business status reported by a places source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationalStatus {
    Operational,
    ClosedTemporarily,
    ClosedPermanently,
}

/// A raw place as returned by the injected places source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPlace {
    pub name: String,
    pub location: GeoPoint,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u32>,
    /// Missing status means the source did not say; treated as open
    #[serde(default)]
    pub operational_status: Option<OperationalStatus>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Photo references, passed through untouched
    #[serde(default)]
    pub photos: Vec<String>,
    /// Opening hours lines, passed through untouched
    #[serde(default)]
    pub hours: Vec<String>,
}

/// A place being considered for ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiCandidate {
    pub name: String,
    pub location: GeoPoint,
    /// Category tags; the first one is the primary category
    pub categories: Vec<String>,
    /// Rating on a 0-5 scale
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub is_open: bool,
    pub address: Option<String>,
    /// Distance to the route in meters, set by
    /// [`attach_route_distances`](crate::proximity::attach_route_distances).
    /// Never read from fetched data.
    #[serde(default, skip_deserializing)]
    pub distance_to_route_meters: Option<f64>,
}

impl PoiCandidate {
    /// Create an open candidate with no rating, reviews or categories.
    pub fn new(name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.to_string(),
            location: GeoPoint::new(latitude, longitude),
            categories: Vec::new(),
            rating: None,
            review_count: None,
            is_open: true,
            address: None,
            distance_to_route_meters: None,
        }
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_review_count(mut self, review_count: u32) -> Self {
        self.review_count = Some(review_count);
        self
    }

    pub fn with_categories(mut self, categories: &[&str]) -> Self {
        self.categories = categories.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_open(mut self, is_open: bool) -> Self {
        self.is_open = is_open;
        self
    }

    pub fn with_address(mut self, address: &str) -> Self {
        self.address = Some(address.to_string());
        self
    }

    /// The first category tag, if any.
    pub fn primary_category(&self) -> Option<&str> {
        self.categories.first().map(String::as_str)
    }

    /// Whether any category tag matches `category`, ignoring case.
    pub fn has_category(&self, category: &str) -> bool {
        self.categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category))
    }
}

impl From<RawPlace> for PoiCandidate {
    fn from(raw: RawPlace) -> Self {
        // Out-of-range ratings are dropped rather than clamped
        let rating = raw
            .rating
            .filter(|r| r.is_finite() && (0.0..=5.0).contains(r));
        Self {
            name: raw.name,
            location: raw.location,
            categories: raw.categories,
            rating,
            review_count: raw.review_count,
            is_open: raw
                .operational_status
                .map_or(true, |s| s == OperationalStatus::Operational),
            address: raw.address,
            distance_to_route_meters: None,
        }
    }
}

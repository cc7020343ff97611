//! POI filtering and ranking.
//!
//! Two strategies share one entry point, [`rank_with_strategy`]:
//!
//! - [`RankingStrategy::WeightedScore`] blends five normalized factors
//!   (distance, rating, popularity, open status, category diversity).
//! - [`RankingStrategy::ProximityThenRating`] drops anything farther than a
//!   hard cutoff and orders the rest by distance, then rating.
//!
//! Both sorts are stable, so candidates that compare equal keep their input
//! order and re-ranking an already ranked list changes nothing.

use std::cmp::Ordering;
use std::collections::HashMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::RankingConfig;
use crate::error::{Result, RoutePoiError};
use crate::geo_utils::haversine_distance;
use crate::poi::PoiCandidate;
use crate::GeoPoint;

/// Default distance at which the distance factor reaches zero (meters).
pub const DEFAULT_MAX_USEFUL_DISTANCE: f64 = 1000.0;

/// Default hard cutoff for the proximity-first strategy (meters).
pub const DEFAULT_PROXIMITY_CUTOFF: f64 = 300.0;

/// Score given to a missing rating or review count.
const UNKNOWN_FACTOR: f64 = 0.3;

/// Review count at which popularity saturates.
const POPULAR_REVIEW_COUNT: f64 = 500.0;

/// Weights for the five scoring factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    pub distance: f64,
    pub rating: f64,
    pub popularity: f64,
    pub open: f64,
    pub diversification: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            distance: 0.40,
            rating: 0.25,
            popularity: 0.20,
            open: 0.10,
            diversification: 0.05,
        }
    }
}

impl RankingWeights {
    fn as_array(&self) -> [f64; 5] {
        [
            self.distance,
            self.rating,
            self.popularity,
            self.open,
            self.diversification,
        ]
    }

    /// Sum of all weights.
    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }

    /// Weights must be finite, non-negative and not all zero.
    pub fn validate(&self) -> Result<()> {
        if self.as_array().iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(RoutePoiError::Config {
                message: "ranking weights must be finite and >= 0".to_string(),
            });
        }
        if self.sum() <= 0.0 {
            return Err(RoutePoiError::Config {
                message: "ranking weights must not all be zero".to_string(),
            });
        }
        Ok(())
    }

    /// Rescale so the weights sum to 1.0. Invalid weights fall back to the
    /// defaults.
    pub fn normalized(&self) -> Self {
        if self.validate().is_err() {
            return Self::default();
        }
        let total = self.sum();
        Self {
            distance: self.distance / total,
            rating: self.rating / total,
            popularity: self.popularity / total,
            open: self.open / total,
            diversification: self.diversification / total,
        }
    }
}

/// Per-factor scores, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub distance: f64,
    pub rating: f64,
    pub popularity: f64,
    pub open: f64,
    pub diversification: f64,
}

impl ScoreBreakdown {
    fn compute(
        poi: &PoiCandidate,
        distance_meters: f64,
        max_useful_distance: f64,
        chosen: &CategoryCounts,
    ) -> Self {
        Self {
            distance: distance_score(distance_meters, max_useful_distance),
            rating: rating_score(poi.rating),
            popularity: popularity_score(poi.review_count),
            open: open_score(poi.is_open),
            diversification: diversification_score(poi.primary_category(), chosen),
        }
    }

    /// Weighted sum of the factors.
    pub fn weighted(&self, weights: &RankingWeights) -> f64 {
        self.distance * weights.distance
            + self.rating * weights.rating
            + self.popularity * weights.popularity
            + self.open * weights.open
            + self.diversification * weights.diversification
    }
}

/// A candidate with its score and factor breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPoi {
    pub poi: PoiCandidate,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    /// Distance used for scoring (meters)
    pub distance_meters: f64,
}

/// How to order candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RankingStrategy {
    /// Weighted multi-factor score, descending.
    WeightedScore(RankingConfig),
    /// Hard-reject beyond `max_distance_meters`, then distance ascending,
    /// rating descending. `score` is `1 - distance / max_distance_meters`.
    ProximityThenRating { max_distance_meters: f64 },
}

impl Default for RankingStrategy {
    fn default() -> Self {
        RankingStrategy::WeightedScore(RankingConfig::default())
    }
}

impl RankingStrategy {
    /// The proximity-first strategy with its standard 300 m cutoff.
    pub fn proximity_then_rating() -> Self {
        RankingStrategy::ProximityThenRating {
            max_distance_meters: DEFAULT_PROXIMITY_CUTOFF,
        }
    }
}

/// Independent pre-filters, all optional and combined with logical AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoiFilter {
    /// Drop candidates farther than this from the route (meters)
    pub max_distance_meters: Option<f64>,
    /// Drop candidates rated below this; unrated candidates are dropped too
    pub min_rating: Option<f64>,
    /// Keep only candidates with at least one of these categories (ignoring case)
    pub allowed_categories: Option<Vec<String>>,
    /// Drop candidates that are not open
    pub open_only: bool,
}

// =============================================================================
// Factor scores
// =============================================================================

/// `max(0, 1 - distance / max_useful_distance)`. Non-finite distances score 0.
pub fn distance_score(distance_meters: f64, max_useful_distance: f64) -> f64 {
    if !distance_meters.is_finite() || max_useful_distance <= 0.0 {
        return 0.0;
    }
    (1.0 - distance_meters.max(0.0) / max_useful_distance).clamp(0.0, 1.0)
}

/// `rating / 5 · 0.9 + 0.1`, or 0.3 when unrated.
pub fn rating_score(rating: Option<f64>) -> f64 {
    match rating {
        Some(r) if r.is_finite() => (r.clamp(0.0, 5.0) / 5.0) * 0.9 + 0.1,
        _ => UNKNOWN_FACTOR,
    }
}

/// `min(1, reviews / 500 · 0.8 + 0.2)`, or 0.3 when unknown.
pub fn popularity_score(review_count: Option<u32>) -> f64 {
    match review_count {
        Some(n) => ((f64::from(n) / POPULAR_REVIEW_COUNT) * 0.8 + 0.2).min(1.0),
        None => UNKNOWN_FACTOR,
    }
}

/// 1.0 when open, 0.5 when closed.
pub fn open_score(is_open: bool) -> f64 {
    if is_open {
        1.0
    } else {
        0.5
    }
}

type CategoryCounts = HashMap<String, usize>;

fn count_categories(categories: &[String]) -> CategoryCounts {
    let mut counts = CategoryCounts::new();
    for c in categories {
        *counts.entry(c.to_lowercase()).or_insert(0) += 1;
    }
    counts
}

/// 1.0 for a category not yet chosen, otherwise
/// `max(0.3, 1 - 0.4 · times_already_chosen)`.
fn diversification_score(primary_category: Option<&str>, chosen: &CategoryCounts) -> f64 {
    let count = primary_category
        .and_then(|c| chosen.get(&c.to_lowercase()))
        .copied()
        .unwrap_or(0);
    if count == 0 {
        1.0
    } else {
        (1.0 - 0.4 * count as f64).max(0.3)
    }
}

// =============================================================================
// Filtering
// =============================================================================

/// Distance used for filtering and scoring: the attached route distance, or
/// the distance to `route_center` when none has been attached.
fn effective_distance(poi: &PoiCandidate, route_center: &GeoPoint) -> f64 {
    poi.distance_to_route_meters
        .filter(|d| d.is_finite())
        .unwrap_or_else(|| haversine_distance(route_center, &poi.location))
}

/// Apply the filters in order: distance, rating, category, open status.
pub fn apply_filters(
    mut pois: Vec<PoiCandidate>,
    filter: &PoiFilter,
    route_center: &GeoPoint,
) -> Vec<PoiCandidate> {
    let initial = pois.len();

    if let Some(max) = filter.max_distance_meters {
        pois.retain(|p| effective_distance(p, route_center) <= max);
    }
    let after_distance = pois.len();

    if let Some(min) = filter.min_rating {
        pois.retain(|p| p.rating.is_some_and(|r| r >= min));
    }
    let after_rating = pois.len();

    if let Some(allowed) = &filter.allowed_categories {
        pois.retain(|p| allowed.iter().any(|c| p.has_category(c)));
    }
    let after_category = pois.len();

    if filter.open_only {
        pois.retain(|p| p.is_open);
    }

    debug!(
        "[Ranking] Filters: {} -> distance {} -> rating {} -> category {} -> open {}",
        initial,
        after_distance,
        after_rating,
        after_category,
        pois.len()
    );

    pois
}

// =============================================================================
// Ranking
// =============================================================================

/// Rank with the weighted scorer, using the default useful distance.
///
/// `weights` defaults to [`RankingWeights::default`].
pub fn rank(
    pois: Vec<PoiCandidate>,
    route_center: &GeoPoint,
    already_chosen_categories: &[String],
    weights: Option<&RankingWeights>,
) -> Vec<RankedPoi> {
    let config = RankingConfig {
        max_useful_distance_meters: DEFAULT_MAX_USEFUL_DISTANCE,
        weights: weights.copied().unwrap_or_default(),
    };
    rank_weighted(pois, route_center, already_chosen_categories, &config)
}

/// Rank candidates with the given strategy.
pub fn rank_with_strategy(
    pois: Vec<PoiCandidate>,
    route_center: &GeoPoint,
    already_chosen_categories: &[String],
    strategy: &RankingStrategy,
) -> Vec<RankedPoi> {
    match strategy {
        RankingStrategy::WeightedScore(config) => {
            rank_weighted(pois, route_center, already_chosen_categories, config)
        }
        RankingStrategy::ProximityThenRating {
            max_distance_meters,
        } => rank_by_proximity(
            pois,
            route_center,
            already_chosen_categories,
            *max_distance_meters,
        ),
    }
}

fn rank_weighted(
    pois: Vec<PoiCandidate>,
    route_center: &GeoPoint,
    already_chosen_categories: &[String],
    config: &RankingConfig,
) -> Vec<RankedPoi> {
    let config = usable_config(config);
    let chosen = count_categories(already_chosen_categories);
    let mut ranked: Vec<RankedPoi> = pois
        .into_iter()
        .filter_map(|poi| {
            let distance_meters = effective_distance(&poi, route_center);
            // A place that cannot be located cannot be ranked
            if !distance_meters.is_finite() {
                return None;
            }
            let breakdown = ScoreBreakdown::compute(
                &poi,
                distance_meters,
                config.max_useful_distance_meters,
                &chosen,
            );
            Some(RankedPoi {
                score: breakdown.weighted(&config.weights),
                breakdown,
                distance_meters,
                poi,
            })
        })
        .collect();

    // Stable: equal scores keep input order
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

/// Ranking settings can arrive straight from a caller without passing
/// through [`EngineConfig::validate`](crate::EngineConfig::validate).
/// Anything that would make a score non-finite falls back to its default.
fn usable_config(config: &RankingConfig) -> RankingConfig {
    let weights = match config.weights.validate() {
        Ok(()) => config.weights,
        Err(e) => {
            warn!("[Ranking] {}, using default weights", e);
            RankingWeights::default()
        }
    };
    let max_useful = config.max_useful_distance_meters;
    let max_useful_distance_meters = if max_useful.is_finite() && max_useful > 0.0 {
        max_useful
    } else {
        warn!(
            "[Ranking] Unusable max useful distance {}, using {}m",
            max_useful, DEFAULT_MAX_USEFUL_DISTANCE
        );
        DEFAULT_MAX_USEFUL_DISTANCE
    };
    RankingConfig {
        max_useful_distance_meters,
        weights,
    }
}

fn rank_by_proximity(
    pois: Vec<PoiCandidate>,
    route_center: &GeoPoint,
    already_chosen_categories: &[String],
    max_distance_meters: f64,
) -> Vec<RankedPoi> {
    let max_distance_meters = if max_distance_meters.is_finite() && max_distance_meters >= 0.0 {
        max_distance_meters
    } else {
        warn!(
            "[Ranking] Unusable proximity cutoff {}, using {}m",
            max_distance_meters, DEFAULT_PROXIMITY_CUTOFF
        );
        DEFAULT_PROXIMITY_CUTOFF
    };
    let chosen = count_categories(already_chosen_categories);
    let total = pois.len();

    let mut ranked: Vec<RankedPoi> = pois
        .into_iter()
        .filter_map(|poi| {
            let distance_meters = effective_distance(&poi, route_center);
            // Hard reject, independent of any score
            if !distance_meters.is_finite() || distance_meters > max_distance_meters {
                return None;
            }
            let breakdown =
                ScoreBreakdown::compute(&poi, distance_meters, max_distance_meters, &chosen);
            Some(RankedPoi {
                score: breakdown.distance,
                breakdown,
                distance_meters,
                poi,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.distance_meters
            .total_cmp(&b.distance_meters)
            .then_with(|| compare_rating_desc(a.poi.rating, b.poi.rating))
    });

    debug!(
        "[Ranking] Proximity cutoff {}m kept {}/{} candidates",
        max_distance_meters,
        ranked.len(),
        total
    );

    ranked
}

/// Higher rating first; unrated sorts after any rating.
fn compare_rating_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

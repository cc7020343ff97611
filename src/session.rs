//! # Route Session
//!
//! Caller-owned state for one route: the decoded route, its display
//! geometry, and the categories already picked for an itinerary.
//!
//! A session holds no global state. Create one per route and drop it when
//! done; several sessions can live side by side.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{OptionExt, Result, RoutePoiError};
use crate::geo_utils::{compute_bounds, polyline_length};
use crate::poi::PoiCandidate;
use crate::polyline;
use crate::proximity::attach_route_distances;
use crate::ranking::{apply_filters, rank_with_strategy, PoiFilter, RankedPoi, RankingStrategy};
use crate::smoothing::optimize_polyline;
use crate::{Bounds, GeoPoint};

#[cfg(feature = "discovery")]
use crate::discovery::{discover_along_route, DiscoveryReport, PlacesSource};
#[cfg(feature = "discovery")]
use tokio_util::sync::CancellationToken;

/// What the presentation layer needs to draw a route and its places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub render_points: Vec<GeoPoint>,
    pub ranked: Vec<RankedPoi>,
}

/// A decoded route with its display geometry and itinerary state.
#[derive(Debug, Clone)]
pub struct RouteSession {
    config: EngineConfig,
    route: Vec<GeoPoint>,
    render: Vec<GeoPoint>,
    bounds: Bounds,
    length_meters: f64,
    chosen_categories: Vec<String>,
}

impl RouteSession {
    /// Decode an encoded polyline and prepare its render geometry.
    pub fn from_encoded(encoded: &str, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let route = polyline::decode(encoded)?;
        Self::from_points(route, config)
    }

    /// Build a session from an already decoded route.
    ///
    /// The route needs at least two points, all with valid coordinates.
    pub fn from_points(route: Vec<GeoPoint>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        if route.len() < 2 {
            return Err(RoutePoiError::InsufficientPoints {
                point_count: route.len(),
                minimum_required: 2,
            });
        }
        if let Some(i) = route.iter().position(|p| !p.is_valid()) {
            return Err(RoutePoiError::InvalidCoordinates {
                message: format!("point {} is out of range: {:?}", i, route[i]),
            });
        }

        let bounds = compute_bounds(&route).ok_or_internal("bounds of a non-empty route")?;
        let length_meters = polyline_length(&route);
        let render = optimize_polyline(&route, &config.render);

        info!(
            "[RouteSession] Created: {} points ({:.0}m), {} render points",
            route.len(),
            length_meters,
            render.len()
        );

        Ok(Self {
            config,
            route,
            render,
            bounds,
            length_meters,
            chosen_categories: Vec::new(),
        })
    }

    /// Full-resolution route. Distances are always measured against this.
    pub fn route(&self) -> &[GeoPoint] {
        &self.route
    }

    /// Simplified and smoothed geometry, for drawing only.
    pub fn render_points(&self) -> &[GeoPoint] {
        &self.render
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Center of the route's bounding box.
    pub fn center(&self) -> GeoPoint {
        self.bounds.center()
    }

    pub fn length_meters(&self) -> f64 {
        self.length_meters
    }

    /// Re-encode the full route.
    pub fn encoded(&self) -> String {
        polyline::encode(&self.route)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Primary categories of the places picked so far.
    pub fn chosen_categories(&self) -> &[String] {
        &self.chosen_categories
    }

    /// Record a pick so later rankings favour other categories.
    pub fn choose(&mut self, poi: &RankedPoi) {
        if let Some(category) = poi.poi.primary_category() {
            self.chosen_categories.push(category.to_string());
        }
    }

    pub fn clear_choices(&mut self) {
        self.chosen_categories.clear();
    }

    /// Measure candidates against the route, filter and rank them.
    ///
    /// Candidates with out-of-range locations are dropped.
    /// Ranking takes the categories picked with [`choose`](Self::choose)
    /// into account. The session itself is left untouched, so ranking the
    /// same candidates twice gives the same order.
    pub fn rank_candidates(
        &self,
        mut candidates: Vec<PoiCandidate>,
        filter: &PoiFilter,
        strategy: &RankingStrategy,
    ) -> Vec<RankedPoi> {
        let total = candidates.len();
        candidates.retain(|c| c.location.is_valid());
        if candidates.len() < total {
            warn!(
                "[RouteSession] Dropped {} candidates with invalid locations",
                total - candidates.len()
            );
        }

        if let Err(e) = attach_route_distances(&mut candidates, &self.route) {
            warn!("[RouteSession] Could not attach distances: {}", e);
        }

        let center = self.center();
        let filtered = apply_filters(candidates, filter, &center);
        let ranked = rank_with_strategy(filtered, &center, &self.chosen_categories, strategy);

        info!(
            "[RouteSession] Ranked {} candidates ({} categories already chosen)",
            ranked.len(),
            self.chosen_categories.len()
        );
        ranked
    }

    /// Rank candidates and bundle them with the render geometry.
    pub fn search(
        &self,
        candidates: Vec<PoiCandidate>,
        filter: &PoiFilter,
        strategy: &RankingStrategy,
    ) -> SearchResult {
        SearchResult {
            render_points: self.render.clone(),
            ranked: self.rank_candidates(candidates, filter, strategy),
        }
    }

    /// Find places matching `keyword` along the route with the session's
    /// discovery settings.
    #[cfg(feature = "discovery")]
    pub async fn discover<S>(
        &self,
        keyword: &str,
        source: &S,
        cancel: &CancellationToken,
    ) -> Result<DiscoveryReport>
    where
        S: PlacesSource + ?Sized,
    {
        discover_along_route(&self.route, keyword, source, &self.config.discovery, cancel).await
    }
}

//! Along-route discovery against an injected places source.
//!
//! This module provides concurrent "places matching X along this route"
//! lookups with:
//! - Evenly spaced sample points along the full route
//! - Bounded concurrency (semaphore) across sample queries
//! - Per-attempt timeout with exponential backoff retries
//! - Cooperative cancellation from the caller
//!
//! A failed sample is logged and skipped. Only when every sample fails is
//! the whole discovery an error, so "nothing nearby" and "could not ask"
//! stay distinguishable.

use std::collections::HashSet;
use std::future::Future;
use std::time::{Duration, Instant};

use futures::future::{join_all, BoxFuture};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::config::DiscoveryConfig;
use crate::error::{OptionExt, Result, RoutePoiError};
use crate::geo_utils::sample_evenly;
use crate::poi::{PoiCandidate, RawPlace};
use crate::proximity::attach_route_distances;
use crate::ranking::{rank_with_strategy, RankedPoi, RankingStrategy};
use crate::GeoPoint;

/// Longest backoff exponent; keeps the delay bounded on large retry counts.
const MAX_BACKOFF_EXPONENT: u32 = 6;

/// A single query sent to the places source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceQuery {
    pub location: GeoPoint,
    pub radius_meters: f64,
    /// Category or free-text keyword describing the interest
    pub keyword: String,
}

/// Upstream places lookup supplied by the caller.
///
/// Implemented for any `Fn(PlaceQuery) -> impl Future<Output = Result<Vec<RawPlace>>>`
/// closure, so a plain async closure can be passed directly.
pub trait PlacesSource: Send + Sync {
    fn search(&self, query: PlaceQuery) -> BoxFuture<'_, Result<Vec<RawPlace>>>;
}

impl<F, Fut> PlacesSource for F
where
    F: Fn(PlaceQuery) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<RawPlace>>> + Send + 'static,
{
    fn search(&self, query: PlaceQuery) -> BoxFuture<'_, Result<Vec<RawPlace>>> {
        Box::pin(self(query))
    }
}

/// Outcome of an along-route discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryReport {
    /// Survivors ordered by distance to route, then rating
    pub ranked: Vec<RankedPoi>,
    pub samples_attempted: usize,
    pub samples_succeeded: usize,
    /// Error messages of the samples that failed
    pub sample_errors: Vec<String>,
    /// Unique candidates seen before the distance cutoff
    pub unique_candidates: usize,
}

/// Find places matching `keyword` along `route`.
///
/// Queries `config.sample_count` evenly spaced points concurrently, merges
/// the answers (first occurrence of a name wins), measures each candidate
/// against the full route and drops anything beyond
/// `config.max_route_distance_meters`. Survivors are ordered by distance,
/// then rating.
///
/// # Errors
/// - [`RoutePoiError::InsufficientPoints`] for an empty route
/// - [`RoutePoiError::DiscoveryFailed`] when every sample query failed
/// - [`RoutePoiError::Cancelled`] when `cancel` fires before completion
pub async fn discover_along_route<S>(
    route: &[GeoPoint],
    keyword: &str,
    source: &S,
    config: &DiscoveryConfig,
    cancel: &CancellationToken,
) -> Result<DiscoveryReport>
where
    S: PlacesSource + ?Sized,
{
    let route_start = *route.first().ok_or_insufficient_points(0, 1)?;

    let samples = sample_evenly(route, config.sample_count);
    let semaphore = Semaphore::new(config.max_concurrency.max(1));
    let start = Instant::now();

    info!(
        "[Discovery] Querying '{}' at {} samples with {} concurrent workers",
        keyword,
        samples.len(),
        config.max_concurrency
    );

    let queries = samples.iter().map(|location| {
        let query = PlaceQuery {
            location: *location,
            radius_meters: config.search_radius_meters,
            keyword: keyword.to_string(),
        };
        query_sample(source, query, config, &semaphore, cancel)
    });
    let results = join_all(queries).await;

    if cancel.is_cancelled() {
        info!("[Discovery] Cancelled after {:.2}s", start.elapsed().as_secs_f64());
        return Err(RoutePoiError::Cancelled);
    }

    let samples_attempted = results.len();
    let mut sample_errors = Vec::new();
    let mut places = Vec::new();
    for result in results {
        match result {
            Ok(batch) => places.extend(batch),
            Err(RoutePoiError::Cancelled) => return Err(RoutePoiError::Cancelled),
            Err(e) => sample_errors.push(e.to_string()),
        }
    }
    let samples_succeeded = samples_attempted - sample_errors.len();

    if samples_succeeded == 0 {
        let last_error = sample_errors
            .last()
            .cloned()
            .unwrap_or_else(|| "no samples".to_string());
        warn!(
            "[Discovery] All {} sample queries failed: {}",
            samples_attempted, last_error
        );
        return Err(RoutePoiError::DiscoveryFailed {
            attempted: samples_attempted,
            last_error,
        });
    }

    let mut candidates = dedupe_by_name(places);
    let unique_candidates = candidates.len();
    attach_route_distances(&mut candidates, route)?;

    let strategy = RankingStrategy::ProximityThenRating {
        max_distance_meters: config.max_route_distance_meters,
    };
    // Every candidate carries a route distance, so the center is never read
    let ranked = rank_with_strategy(candidates, &route_start, &[], &strategy);

    info!(
        "[Discovery] {}/{} samples ok, {} unique candidates, {} within {}m in {:.2}s",
        samples_succeeded,
        samples_attempted,
        unique_candidates,
        ranked.len(),
        config.max_route_distance_meters,
        start.elapsed().as_secs_f64()
    );

    Ok(DiscoveryReport {
        ranked,
        samples_attempted,
        samples_succeeded,
        sample_errors,
        unique_candidates,
    })
}

/// Run one sample query with timeout and retries, holding a concurrency
/// permit for its whole duration.
async fn query_sample<S>(
    source: &S,
    query: PlaceQuery,
    config: &DiscoveryConfig,
    semaphore: &Semaphore,
    cancel: &CancellationToken,
) -> Result<Vec<RawPlace>>
where
    S: PlacesSource + ?Sized,
{
    let _permit = tokio::select! {
        _ = cancel.cancelled() => return Err(RoutePoiError::Cancelled),
        permit = semaphore.acquire() => permit.map_err(|e| RoutePoiError::Internal {
            message: format!("semaphore closed: {}", e),
        })?,
    };

    let timeout = Duration::from_millis(config.request_timeout_ms);
    let mut attempt: u32 = 0;

    loop {
        let outcome = tokio::select! {
            _ = cancel.cancelled() => return Err(RoutePoiError::Cancelled),
            r = tokio::time::timeout(timeout, source.search(query.clone())) => r,
        };

        let error = match outcome {
            Ok(Ok(places)) => {
                debug!(
                    "[Discovery] Sample ({:.5}, {:.5}) returned {} places",
                    query.location.latitude,
                    query.location.longitude,
                    places.len()
                );
                return Ok(places);
            }
            Ok(Err(e)) => e,
            Err(_) => RoutePoiError::Source {
                message: format!("timed out after {}ms", config.request_timeout_ms),
            },
        };

        if attempt >= config.max_retries {
            warn!(
                "[Discovery] Sample ({:.5}, {:.5}) failed after {} attempts: {}",
                query.location.latitude,
                query.location.longitude,
                attempt + 1,
                error
            );
            return Err(error);
        }

        attempt += 1;
        let backoff = backoff_delay(config.retry_backoff_ms, attempt);
        debug!(
            "[Discovery] Sample error: {}, retry {} after {:?}",
            error, attempt, backoff
        );

        tokio::select! {
            _ = cancel.cancelled() => return Err(RoutePoiError::Cancelled),
            _ = tokio::time::sleep(backoff) => {}
        }
    }
}

/// Delay before retry number `attempt` (1-based): the base doubled per
/// earlier retry. Saturates instead of overflowing.
fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
    Duration::from_millis(base_ms.saturating_mul(1u64 << exponent))
}

/// Merge candidates across samples, keeping the first place seen under each
/// name (compared trimmed and ignoring case). Places with invalid locations
/// are dropped.
fn dedupe_by_name(places: Vec<RawPlace>) -> Vec<PoiCandidate> {
    let mut seen = HashSet::new();
    places
        .into_iter()
        .filter(|p| p.location.is_valid())
        .filter(|p| seen.insert(p.name.trim().to_lowercase()))
        .map(PoiCandidate::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(name: &str, lat: f64, lng: f64) -> RawPlace {
        RawPlace {
            name: name.to_string(),
            location: GeoPoint::new(lat, lng),
            rating: None,
            review_count: None,
            operational_status: None,
            categories: Vec::new(),
            address: None,
            photos: Vec::new(),
            hours: Vec::new(),
        }
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let places = vec![
            place("Corner Cafe", 1.0, 1.0),
            place("corner cafe ", 2.0, 2.0),
            place("Library", 3.0, 3.0),
            place("Broken", f64::NAN, 0.0),
        ];
        let deduped = dedupe_by_name(places);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].location, GeoPoint::new(1.0, 1.0));
        assert_eq!(deduped[1].name, "Library");
    }

    #[test]
    fn test_backoff_doubles_and_saturates() {
        assert_eq!(backoff_delay(250, 1), Duration::from_millis(250));
        assert_eq!(backoff_delay(250, 3), Duration::from_millis(1000));
        assert_eq!(backoff_delay(250, 50), Duration::from_millis(250 * 64));
        assert_eq!(backoff_delay(u64::MAX, 4), Duration::from_millis(u64::MAX));
    }

    #[tokio::test]
    async fn test_closure_source_is_queried_per_sample() {
        let route = vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.1)];
        let source = |q: PlaceQuery| async move {
            Ok::<_, RoutePoiError>(vec![place(
                &format!("spot-{:.3}", q.location.longitude),
                q.location.latitude + 0.001,
                q.location.longitude,
            )])
        };
        let config = DiscoveryConfig::default();
        let report =
            discover_along_route(&route, "cafe", &source, &config, &CancellationToken::new())
                .await
                .unwrap();
        assert_eq!(report.samples_attempted, 8);
        assert_eq!(report.samples_succeeded, 8);
        assert_eq!(report.unique_candidates, 8);
        // Every spot sits ~111 m off the route
        assert_eq!(report.ranked.len(), 8);
    }

    #[tokio::test]
    async fn test_empty_route_rejected() {
        let source = |_q: PlaceQuery| async move { Ok::<_, RoutePoiError>(Vec::new()) };
        let err = discover_along_route(
            &[],
            "cafe",
            &source,
            &DiscoveryConfig::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RoutePoiError::InsufficientPoints { .. }));
    }
}

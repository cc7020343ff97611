//! Engine configuration.
//!
//! One struct per pipeline stage, grouped under [`EngineConfig`]. Every field
//! has a documented default, and partial JSON documents fill the rest from
//! those defaults.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RoutePoiError};
use crate::ranking::RankingWeights;

/// Configuration for the display pipeline (simplify, then smooth).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Routes with more points than this are simplified before smoothing.
    /// Default: 500
    pub simplify_threshold: usize,

    /// Tolerance for Douglas-Peucker simplification (in degrees).
    /// Default: 0.0001 (~11 meters)
    pub simplification_tolerance: f64,

    /// Turns sharper than this get interpolated corner points (degrees).
    /// 0° is a straight continuation, 180° a reversal. Default: 20.0
    pub corner_angle_threshold: f64,

    /// Catmull-Rom points inserted per sharp corner, the larger half on the
    /// approach segment and the rest on the exit segment.
    /// Default: 5
    pub interpolation_points: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            simplify_threshold: 500,
            simplification_tolerance: 0.0001,
            corner_angle_threshold: 20.0,
            interpolation_points: 5,
        }
    }
}

/// Configuration for the weighted POI scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Distance at which the distance factor reaches zero (meters).
    /// Default: 1000.0
    pub max_useful_distance_meters: f64,

    /// Factor weights. Default: distance 0.40, rating 0.25, popularity 0.20,
    /// open 0.10, diversification 0.05
    pub weights: RankingWeights,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            max_useful_distance_meters: 1000.0,
            weights: RankingWeights::default(),
        }
    }
}

/// Configuration for along-route discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Number of evenly spaced sample points queried along the route.
    /// Default: 8
    pub sample_count: usize,

    /// Search radius passed to the places source at each sample (meters).
    /// Default: 1000.0
    pub search_radius_meters: f64,

    /// Candidates farther than this from the route are always dropped (meters).
    /// Default: 300.0
    pub max_route_distance_meters: f64,

    /// Maximum sample queries in flight at once.
    /// Default: 4
    pub max_concurrency: usize,

    /// Per-attempt timeout for a single sample query (milliseconds).
    /// Default: 10000
    pub request_timeout_ms: u64,

    /// Retries after the first failed attempt of a sample query.
    /// Default: 2
    pub max_retries: u32,

    /// Base delay for exponential backoff between retries (milliseconds).
    /// Default: 250
    pub retry_backoff_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            sample_count: 8,
            search_radius_meters: 1000.0,
            max_route_distance_meters: 300.0,
            max_concurrency: 4,
            request_timeout_ms: 10_000,
            max_retries: 2,
            retry_backoff_ms: 250,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub render: RenderConfig,
    pub ranking: RankingConfig,
    pub discovery: DiscoveryConfig,
}

impl EngineConfig {
    /// Parse and validate a JSON configuration document.
    ///
    /// Missing sections and fields take their defaults.
    ///
    /// # Example
    /// ```
    /// use route_poi::EngineConfig;
    ///
    /// let config = EngineConfig::from_json(r#"{"discovery": {"sample_count": 12}}"#).unwrap();
    /// assert_eq!(config.discovery.sample_count, 12);
    /// assert_eq!(config.discovery.max_route_distance_meters, 300.0);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<()> {
        let render = &self.render;
        if !render.simplification_tolerance.is_finite() || render.simplification_tolerance < 0.0 {
            return Err(config_error("render.simplification_tolerance must be finite and >= 0"));
        }
        if !(0.0..=180.0).contains(&render.corner_angle_threshold) {
            return Err(config_error("render.corner_angle_threshold must be within [0, 180]"));
        }
        if render.interpolation_points > MAX_INTERPOLATION_POINTS {
            return Err(config_error("render.interpolation_points must be at most 64"));
        }

        let ranking = &self.ranking;
        if !ranking.max_useful_distance_meters.is_finite()
            || ranking.max_useful_distance_meters <= 0.0
        {
            return Err(config_error("ranking.max_useful_distance_meters must be > 0"));
        }
        ranking.weights.validate()?;

        let discovery = &self.discovery;
        if discovery.sample_count == 0 {
            return Err(config_error("discovery.sample_count must be at least 1"));
        }
        if discovery.max_concurrency == 0 {
            return Err(config_error("discovery.max_concurrency must be at least 1"));
        }
        if !discovery.search_radius_meters.is_finite() || discovery.search_radius_meters <= 0.0 {
            return Err(config_error("discovery.search_radius_meters must be > 0"));
        }
        if !discovery.max_route_distance_meters.is_finite()
            || discovery.max_route_distance_meters < 0.0
        {
            return Err(config_error("discovery.max_route_distance_meters must be >= 0"));
        }
        if discovery.request_timeout_ms == 0 {
            return Err(config_error("discovery.request_timeout_ms must be > 0"));
        }
        if discovery.retry_backoff_ms > MAX_RETRY_BACKOFF_MS {
            return Err(config_error("discovery.retry_backoff_ms must be at most 60000"));
        }

        Ok(())
    }
}

/// Upper bound for [`RenderConfig::interpolation_points`].
pub const MAX_INTERPOLATION_POINTS: usize = 64;

/// Upper bound for [`DiscoveryConfig::retry_backoff_ms`].
pub const MAX_RETRY_BACKOFF_MS: u64 = 60_000;

fn config_error(message: &str) -> RoutePoiError {
    RoutePoiError::Config {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let config = EngineConfig::default();
        let json = config.to_json().unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{"render": {"interpolation_points": 3}}"#).unwrap();
        assert_eq!(config.render.interpolation_points, 3);
        assert_eq!(config.render.simplify_threshold, 500);
        assert_eq!(config.ranking, RankingConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = EngineConfig::from_json(r#"{"discovery": {"max_concurrency": 0}}"#).unwrap_err();
        assert!(matches!(err, RoutePoiError::Config { .. }));

        let err = EngineConfig::from_json(r#"{"render": {"corner_angle_threshold": 200.0}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("corner_angle_threshold"));
    }

    #[test]
    fn test_unbounded_values_rejected() {
        let err = EngineConfig::from_json(r#"{"discovery": {"retry_backoff_ms": 18446744073709551615}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("retry_backoff_ms"));

        let err = EngineConfig::from_json(r#"{"render": {"interpolation_points": 100000}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("interpolation_points"));

        let edge = EngineConfig::from_json(
            r#"{"render": {"interpolation_points": 64}, "discovery": {"retry_backoff_ms": 60000}}"#,
        );
        assert!(edge.is_ok());
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = EngineConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, RoutePoiError::Config { .. }));
    }
}

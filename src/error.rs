//! Unified error handling for the route-poi library.
//!
//! Every fallible operation in the crate returns [`RoutePoiError`]. Conditions
//! that are normal outcomes (an empty ranked list, a degenerate segment) are
//! not errors and never show up here.

use std::fmt;

/// Unified error type for route-poi operations.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutePoiError {
    /// Encoded polyline could not be decoded
    Decode {
        /// Byte offset where decoding stopped
        position: usize,
        message: String,
    },
    /// Route has insufficient points for the operation
    InsufficientPoints {
        point_count: usize,
        minimum_required: usize,
    },
    /// A coordinate is out of range or not finite
    InvalidCoordinates { message: String },
    /// Configuration error
    Config { message: String },
    /// A single places-source query failed
    Source { message: String },
    /// Every sample-point query failed, so "no results" cannot be reported
    DiscoveryFailed {
        attempted: usize,
        last_error: String,
    },
    /// The caller cancelled an in-flight discovery
    Cancelled,
    /// Generic internal error
    Internal { message: String },
}

impl fmt::Display for RoutePoiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutePoiError::Decode { position, message } => {
                write!(f, "Polyline decode error at byte {}: {}", position, message)
            }
            RoutePoiError::InsufficientPoints {
                point_count,
                minimum_required,
            } => {
                write!(
                    f,
                    "Route has {} points, minimum {} required",
                    point_count, minimum_required
                )
            }
            RoutePoiError::InvalidCoordinates { message } => {
                write!(f, "Invalid coordinates: {}", message)
            }
            RoutePoiError::Config { message } => {
                write!(f, "Configuration error: {}", message)
            }
            RoutePoiError::Source { message } => {
                write!(f, "Places source error: {}", message)
            }
            RoutePoiError::DiscoveryFailed {
                attempted,
                last_error,
            } => {
                write!(
                    f,
                    "Discovery failed: all {} sample queries failed (last error: {})",
                    attempted, last_error
                )
            }
            RoutePoiError::Cancelled => write!(f, "Discovery cancelled"),
            RoutePoiError::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for RoutePoiError {}

impl From<serde_json::Error> for RoutePoiError {
    fn from(e: serde_json::Error) -> Self {
        RoutePoiError::Config {
            message: e.to_string(),
        }
    }
}

/// Result type alias for route-poi operations.
pub type Result<T> = std::result::Result<T, RoutePoiError>;

/// Extension trait for converting Option to RoutePoiError.
pub trait OptionExt<T> {
    /// Convert Option to Result with insufficient points error.
    fn ok_or_insufficient_points(self, point_count: usize, minimum: usize) -> Result<T>;

    /// Convert Option to Result with generic internal error.
    fn ok_or_internal(self, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_insufficient_points(self, point_count: usize, minimum: usize) -> Result<T> {
        self.ok_or(RoutePoiError::InsufficientPoints {
            point_count,
            minimum_required: minimum,
        })
    }

    fn ok_or_internal(self, message: &str) -> Result<T> {
        self.ok_or_else(|| RoutePoiError::Internal {
            message: message.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RoutePoiError::Decode {
            position: 7,
            message: "unterminated chunk".to_string(),
        };
        assert!(err.to_string().contains("byte 7"));
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn test_discovery_failed_is_distinct_from_empty() {
        let err = RoutePoiError::DiscoveryFailed {
            attempted: 8,
            last_error: "timeout".to_string(),
        };
        assert!(err.to_string().contains("all 8 sample queries failed"));
    }

    #[test]
    fn test_option_ext() {
        let none: Option<i32> = None;
        let result = none.ok_or_insufficient_points(0, 2);
        assert!(matches!(
            result,
            Err(RoutePoiError::InsufficientPoints { .. })
        ));
        assert_eq!(Some(3).ok_or_internal("unused"), Ok(3));
    }
}

//! Encoded polyline wire format.
//!
//! Thin layer over the `polyline` crate: the standard signed,
//! delta-encoded algorithm with latitude before longitude. This module adds
//! the precision policy and maps codec failures onto [`RoutePoiError`] with
//! the byte offset where decoding stopped.
//!
//! Decoding is bounded by the input length. A value whose continuation bit
//! never clears is rejected, never partially returned.

use ::polyline::errors::PolylineError;
use geo::Coord;
use log::warn;

use crate::error::{Result, RoutePoiError};
use crate::GeoPoint;

/// Default precision (5 decimal places, factor 1e5).
pub const DEFAULT_PRECISION: u32 = 5;

/// Largest supported precision. Seven decimals still fit a 32-bit value.
const MAX_PRECISION: u32 = 7;

/// Decode a polyline with the default precision of 1e5.
///
/// # Example
/// ```
/// use route_poi::polyline::decode;
///
/// let points = decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
/// assert_eq!(points.len(), 3);
/// assert!((points[0].latitude - 38.5).abs() < 1e-9);
/// assert!((points[0].longitude + 120.2).abs() < 1e-9);
/// ```
pub fn decode(encoded: &str) -> Result<Vec<GeoPoint>> {
    decode_with_precision(encoded, DEFAULT_PRECISION)
}

/// Encode points with the default precision of 1e5.
///
/// Out-of-range points cannot be encoded; they produce an empty string and
/// a warning. Use [`encode_with_precision`] to get the error instead.
pub fn encode(points: &[GeoPoint]) -> String {
    encode_with_precision(points, DEFAULT_PRECISION).unwrap_or_else(|e| {
        warn!("[Polyline] Encode failed: {}", e);
        String::new()
    })
}

/// Decode a polyline encoded with `precision` decimal places (5 or 6 in
/// practice; up to 7 is accepted).
pub fn decode_with_precision(encoded: &str, precision: u32) -> Result<Vec<GeoPoint>> {
    check_precision(precision)?;
    if encoded.is_empty() {
        return Ok(Vec::new());
    }

    let line = ::polyline::decode_polyline(encoded, precision).map_err(decode_error)?;
    Ok(line.coords().map(|c| GeoPoint::from(*c)).collect())
}

/// Encode points with `precision` decimal places.
pub fn encode_with_precision(points: &[GeoPoint], precision: u32) -> Result<String> {
    check_precision(precision)?;
    ::polyline::encode_coordinates(points.iter().map(|p| Coord::from(*p)), precision).map_err(
        |e| RoutePoiError::InvalidCoordinates {
            message: format!("cannot encode polyline: {}", e),
        },
    )
}

fn decode_error(e: PolylineError) -> RoutePoiError {
    let (position, message) = match &e {
        PolylineError::NoLongError { idx } => {
            (*idx, "latitude without a matching longitude".to_string())
        }
        PolylineError::DecodeError { idx } => {
            (*idx, "invalid character or value exceeds 32 bits".to_string())
        }
        PolylineError::LatitudeCoordError { idx, .. }
        | PolylineError::LongitudeCoordError { idx, .. } => {
            (*idx, format!("decoded coordinate out of range: {}", e))
        }
        other => (0, other.to_string()),
    };
    RoutePoiError::Decode { position, message }
}

fn check_precision(precision: u32) -> Result<()> {
    if precision == 0 || precision > MAX_PRECISION {
        return Err(RoutePoiError::Config {
            message: format!(
                "polyline precision must be within 1..={}, got {}",
                MAX_PRECISION, precision
            ),
        });
    }
    Ok(())
}

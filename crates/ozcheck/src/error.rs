//! Error types for Opportunity Zone checks.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable error discriminant, shared by the library, the proxy wire
/// format (`errorKind`) and the CLI's JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DataLoad,
    Uninitialized,
    NoMatch,
    Landmark,
    Unavailable,
    Failed,
    NoTract,
    InvalidCoordinates,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DataLoad => "data_load",
            Self::Uninitialized => "uninitialized",
            Self::NoMatch => "no_match",
            Self::Landmark => "landmark",
            Self::Unavailable => "unavailable",
            Self::Failed => "failed",
            Self::NoTract => "no_tract",
            Self::InvalidCoordinates => "invalid_coordinates",
        }
    }
}

/// Why a geocoding request failed.
///
/// Each variant carries the message reported by the service so it can still
/// be shown verbatim, but callers dispatch on the variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeError {
    /// No address in the census database matched the input.
    #[error("{0}")]
    NoMatch(String),
    /// Input looked like a building or landmark name, not a street address.
    #[error("{0}")]
    Landmark(String),
    /// Timeout, transport error or non-success HTTP status.
    #[error("{0}")]
    Unavailable(String),
    #[error("{0}")]
    Failed(String),
}

impl GeocodeError {
    /// Classify a free-text failure message from a proxy that does not send a
    /// structured `errorKind`.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        let message = message.to_string();

        if lower.contains("building/landmark names may not work") {
            Self::Landmark(message)
        } else if lower.contains("no address match found") {
            Self::NoMatch(message)
        } else if lower.contains("timeout") || lower.contains("failed") {
            Self::Unavailable(message)
        } else {
            Self::Failed(message)
        }
    }

    /// Rebuild an error from a wire `errorKind`. Kinds that are not geocoding
    /// failures collapse to [`GeocodeError::Failed`].
    pub fn from_kind(kind: ErrorKind, message: String) -> Self {
        match kind {
            ErrorKind::NoMatch => Self::NoMatch(message),
            ErrorKind::Landmark => Self::Landmark(message),
            ErrorKind::Unavailable => Self::Unavailable(message),
            _ => Self::Failed(message),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::NoMatch(m) | Self::Landmark(m) | Self::Unavailable(m) | Self::Failed(m) => m,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoMatch(_) => ErrorKind::NoMatch,
            Self::Landmark(_) => ErrorKind::Landmark,
            Self::Unavailable(_) => ErrorKind::Unavailable,
            Self::Failed(_) => ErrorKind::Failed,
        }
    }
}

impl From<reqwest::Error> for GeocodeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GeocodeError::Unavailable(format!("Request timeout: {}", e))
        } else if e.is_decode() {
            GeocodeError::Failed(format!("Invalid response from geocoding service: {}", e))
        } else {
            GeocodeError::Unavailable(format!("Request failed: {}", e))
        }
    }
}

/// Errors surfaced by an Opportunity Zone check.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CheckError {
    /// The static GEOID resource was unreachable or malformed.
    #[error("Failed to load OZ data: {0}")]
    DataLoad(String),
    #[error("OZ checker not initialized. Call initialize() first.")]
    Uninitialized,
    #[error(transparent)]
    Geocoding(#[from] GeocodeError),
    /// Geocoding succeeded but produced no census tract.
    #[error("{0}")]
    NoTract(String),
    #[error("Coordinates ({lat}, {lng}) are outside the continental United States")]
    InvalidCoordinates { lat: f64, lng: f64 },
}

impl CheckError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DataLoad(_) => ErrorKind::DataLoad,
            Self::Uninitialized => ErrorKind::Uninitialized,
            Self::Geocoding(e) => e.kind(),
            Self::NoTract(_) => ErrorKind::NoTract,
            Self::InvalidCoordinates { .. } => ErrorKind::InvalidCoordinates,
        }
    }
}

pub type CheckResult<T> = Result<T, CheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_landmark_message() {
        let err = GeocodeError::classify(
            "Address not found. Building/landmark names may not work. Please try a specific street address.",
        );
        assert_eq!(err.kind(), ErrorKind::Landmark);
    }

    #[test]
    fn classify_no_match_message() {
        let err = GeocodeError::classify("No address match found in Census database");
        assert_eq!(err.kind(), ErrorKind::NoMatch);
    }

    #[test]
    fn classify_transient_messages() {
        assert_eq!(
            GeocodeError::classify("Census API timeout/error: connection reset").kind(),
            ErrorKind::Unavailable
        );
        assert_eq!(
            GeocodeError::classify("Geocoding failed: 502").kind(),
            ErrorKind::Unavailable
        );
    }

    #[test]
    fn classify_generic_message() {
        let err = GeocodeError::classify("Invalid data from Census API");
        assert_eq!(err, GeocodeError::Failed("Invalid data from Census API".to_string()));
    }

    #[test]
    fn from_kind_collapses_non_geocoding_kinds() {
        let err = GeocodeError::from_kind(ErrorKind::NoTract, "x".to_string());
        assert_eq!(err.kind(), ErrorKind::Failed);
        let err = GeocodeError::from_kind(ErrorKind::Landmark, "y".to_string());
        assert_eq!(err, GeocodeError::Landmark("y".to_string()));
    }

    #[test]
    fn check_error_kind_passes_through_geocoding() {
        let err: CheckError = GeocodeError::NoMatch("none".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::NoMatch);
        assert_eq!(err.to_string(), "none");
    }

    #[test]
    fn error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::InvalidCoordinates).unwrap();
        assert_eq!(json, "\"invalid_coordinates\"");
        assert_eq!(ErrorKind::NoMatch.as_str(), "no_match");
    }
}

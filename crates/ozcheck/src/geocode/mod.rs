//! Geocoding gateway.
//!
//! Turns a free-text address or a coordinate pair into a census tract. Two
//! gateways implement [`Geocoder`]:
//! - [`ProxyGeocoder`] posts to a census-geocoder proxy endpoint
//! - [`CensusGeocoder`] talks to the U.S. Census geocoder directly, with an
//!   optional Google fallback (this is what the proxy endpoint runs)

mod census;
mod google;
mod places;
mod proxy;

pub use census::{clean_address, CensusGeocoder};
pub use google::GoogleGeocoder;
pub use places::{PlacesClient, Prediction};
pub use proxy::ProxyGeocoder;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{CheckError, CheckResult, GeocodeError};

/// Southern edge of the accepted bounding box.
pub const MIN_LAT: f64 = 24.0;
/// Northern edge of the accepted bounding box.
pub const MAX_LAT: f64 = 49.0;
/// Western edge of the accepted bounding box.
pub const MIN_LNG: f64 = -125.0;
/// Eastern edge of the accepted bounding box.
pub const MAX_LNG: f64 = -66.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether the point lies in the box approximating the continental U.S.
    /// NaN coordinates are never inside.
    pub fn in_continental_us(&self) -> bool {
        (MIN_LAT..=MAX_LAT).contains(&self.lat) && (MIN_LNG..=MAX_LNG).contains(&self.lng)
    }

    /// Reject points that can never resolve to a U.S. tract.
    pub fn validate(&self) -> CheckResult<()> {
        if self.in_continental_us() {
            Ok(())
        } else {
            Err(CheckError::InvalidCoordinates {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }
}

/// Normalized geocoder answer.
///
/// Serializes to the proxy's `data` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct GeocodeResult {
    pub lat: f64,
    pub lng: f64,
    /// 11-digit tract GEOID (state + county + tract).
    #[serde(default)]
    pub geoid: Option<String>,
    #[serde(default)]
    pub matched_address: Option<String>,
    /// 2-digit state FIPS code.
    #[serde(default)]
    pub state: Option<String>,
    /// 3-digit county FIPS code.
    #[serde(default)]
    pub county: Option<String>,
    /// 6-digit tract code.
    #[serde(default)]
    pub tract: Option<String>,
    /// 4-digit block code.
    #[serde(default)]
    pub block: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tract_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_name: Option<String>,
}

impl GeocodeResult {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}

/// A service that resolves locations to census tracts.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Geocode a free-text address.
    async fn geocode_address(&self, address: &str) -> Result<GeocodeResult, GeocodeError>;

    /// Find the census geographies containing a point.
    async fn reverse_geocode(&self, coords: Coordinates) -> Result<GeocodeResult, GeocodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_edges_are_inclusive() {
        assert!(Coordinates::new(24.0, -125.0).in_continental_us());
        assert!(Coordinates::new(49.0, -66.0).in_continental_us());
        assert!(Coordinates::new(28.0587, -82.4139).in_continental_us());
    }

    #[test]
    fn outside_bounding_box_is_rejected() {
        for (lat, lng) in [
            (23.99, -80.0),
            (49.01, -100.0),
            (40.0, -125.01),
            (40.0, -65.99),
            (21.3069, -157.8583),
            (f64::NAN, -80.0),
        ] {
            let err = Coordinates::new(lat, lng).validate().unwrap_err();
            assert!(matches!(err, CheckError::InvalidCoordinates { .. }));
        }
    }

    #[test]
    fn geocode_result_wire_names() {
        let result = GeocodeResult {
            lat: 28.06,
            lng: -82.41,
            geoid: Some("12057012607".to_string()),
            matched_address: Some("4202 E FOWLER AVE, TAMPA, FL, 33620".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["geoid"], "12057012607");
        assert_eq!(json["matchedAddress"], "4202 E FOWLER AVE, TAMPA, FL, 33620");
        assert!(json.get("tractName").is_none());

        let parsed: GeocodeResult =
            serde_json::from_str(r#"{"lat":1.0,"lng":2.0,"geoid":"01001020100"}"#).unwrap();
        assert_eq!(parsed.geoid.as_deref(), Some("01001020100"));
        assert!(parsed.block.is_none());
    }
}

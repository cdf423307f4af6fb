//! U.S. Census Bureau geocoder.
//!
//! Forward lookups use the `onelineaddress` geographies endpoint with a small
//! retry budget; reverse lookups use the `coordinates` endpoint. Both return
//! the census geographies containing the point, from which the tract GEOID and
//! its state/county/tract/block parts are derived.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{Coordinates, GeocodeResult, Geocoder, GoogleGeocoder};
use crate::error::GeocodeError;

const BENCHMARK: &str = "Public_AR_Current";
const VINTAGE: &str = "Current_Current";

/// Length of a tract GEOID (2 state + 3 county + 6 tract).
const TRACT_GEOID_LEN: usize = 11;

static COUNTRY_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:, USA|, United States|, US)$").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static HOUSE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\s").expect("valid regex"));

const LANDMARK_MESSAGE: &str = "Address not found. Building/landmark names may not work. \
     Please try a specific street address with number (e.g., \"123 Main Street, Tampa, FL\").";
const GENERIC_MESSAGE: &str = "Address geocoding failed. Please verify the address and try again.";

#[derive(Debug, Deserialize)]
struct CensusEnvelope {
    result: Option<CensusResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CensusResult {
    #[serde(default)]
    address_matches: Vec<AddressMatch>,
    geographies: Option<Geographies>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddressMatch {
    matched_address: Option<String>,
    coordinates: Option<CensusPoint>,
    geographies: Option<Geographies>,
}

#[derive(Debug, Deserialize)]
struct CensusPoint {
    x: f64,
    y: f64,
}

#[derive(Debug, Default, Deserialize)]
struct Geographies {
    #[serde(rename = "Census Tracts", default)]
    tracts: Vec<Geography>,
    #[serde(rename = "Census Blocks", alias = "2020 Census Blocks", default)]
    blocks: Vec<Geography>,
    #[serde(rename = "Counties", default)]
    counties: Vec<Geography>,
    #[serde(rename = "States", default)]
    states: Vec<Geography>,
}

#[derive(Debug, Deserialize)]
struct Geography {
    #[serde(rename = "GEOID")]
    geoid: Option<String>,
    #[serde(rename = "NAME")]
    name: Option<String>,
}

/// Census codes derived from a set of geographies.
#[derive(Debug, Default, PartialEq)]
struct TractCodes {
    geoid: Option<String>,
    state: Option<String>,
    county: Option<String>,
    tract: Option<String>,
    block: Option<String>,
    tract_name: Option<String>,
    county_name: Option<String>,
    state_name: Option<String>,
}

/// Non-empty `s[start..end]`, clamped to the string length.
fn slice(s: Option<&str>, start: usize, end: usize) -> Option<String> {
    let s = s?;
    let end = end.min(s.len());
    if start >= end {
        return None;
    }
    s.get(start..end).map(str::to_string)
}

impl Geographies {
    fn codes(&self) -> TractCodes {
        let tract = self.tracts.first();
        let block = self.blocks.first();
        let county = self.counties.first();
        let state = self.states.first();

        let tract_geoid = tract.and_then(|t| t.geoid.as_deref());
        let block_geoid = block.and_then(|b| b.geoid.as_deref());
        let county_geoid = county.and_then(|c| c.geoid.as_deref());
        let state_geoid = state.and_then(|s| s.geoid.as_deref());

        TractCodes {
            geoid: tract_geoid
                .filter(|g| !g.is_empty())
                .map(str::to_string)
                .or_else(|| slice(block_geoid, 0, TRACT_GEOID_LEN)),
            state: slice(tract_geoid, 0, 2)
                .or_else(|| state_geoid.filter(|g| !g.is_empty()).map(str::to_string))
                .or_else(|| slice(block_geoid, 0, 2)),
            county: slice(tract_geoid, 2, 5)
                .or_else(|| slice(county_geoid, 2, 5))
                .or_else(|| slice(block_geoid, 2, 5)),
            tract: slice(tract_geoid, 5, 11).or_else(|| slice(block_geoid, 5, 11)),
            block: slice(block_geoid, 11, 15),
            tract_name: tract.and_then(|t| t.name.clone()),
            county_name: county.and_then(|c| c.name.clone()),
            state_name: state.and_then(|s| s.name.clone()),
        }
    }

    fn has_tract_or_block(&self) -> bool {
        !self.tracts.is_empty() || !self.blocks.is_empty()
    }
}

impl TractCodes {
    fn into_result(self, coords: Coordinates, matched_address: Option<String>) -> GeocodeResult {
        GeocodeResult {
            lat: coords.lat,
            lng: coords.lng,
            geoid: self.geoid,
            matched_address,
            state: self.state,
            county: self.county,
            tract: self.tract,
            block: self.block,
            tract_name: self.tract_name,
            county_name: self.county_name,
            state_name: self.state_name,
        }
    }
}

/// Strip country suffixes and collapse whitespace; the Census matcher is
/// strict about both.
pub fn clean_address(address: &str) -> String {
    let collapsed = WHITESPACE.replace_all(address.trim(), " ");
    COUNTRY_SUFFIX.replace(&collapsed, "").trim().to_string()
}

/// "<County>, <State>" label for a reverse lookup.
fn area_label(county: Option<&str>, state: Option<&str>) -> String {
    let county = county.unwrap_or("Unknown");
    let state = state.unwrap_or("Unknown");
    if county.ends_with(" County") {
        format!("{}, {}", county, state)
    } else {
        format!("{} County, {}", county, state)
    }
}

/// Direct client for `geocoding.geo.census.gov`.
#[derive(Clone)]
pub struct CensusGeocoder {
    client: Client,
    base_url: String,
    timeout: Duration,
    retries: u32,
    retry_delay: Duration,
    google: Option<GoogleGeocoder>,
}

impl CensusGeocoder {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(8),
            retries: 2,
            retry_delay: Duration::from_secs(1),
            google: None,
        }
    }

    /// Per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Forward-lookup attempts (at least one) and the pause between them.
    pub fn retries(mut self, retries: u32, delay: Duration) -> Self {
        self.retries = retries.max(1);
        self.retry_delay = delay;
        self
    }

    /// Fall back to Google when the Census matcher finds nothing.
    pub fn google_fallback(mut self, google: GoogleGeocoder) -> Self {
        self.google = Some(google);
        self
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<CensusEnvelope, Attempt> {
        let response = self
            .client
            .get(url)
            .query(query)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(Attempt::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Attempt::Status(
                status.canonical_reason().unwrap_or(status.as_str()).to_string(),
            ));
        }

        response.json().await.map_err(Attempt::Transport)
    }

    /// First address match for a cleaned address, retrying transient failures.
    async fn find_match(&self, address: &str) -> Result<AddressMatch, GeocodeError> {
        let url = format!("{}/geocoder/geographies/onelineaddress", self.base_url);
        let query = [
            ("address", address.to_string()),
            ("benchmark", BENCHMARK.to_string()),
            ("vintage", VINTAGE.to_string()),
            ("format", "json".to_string()),
        ];

        let mut attempt = 1;
        loop {
            debug!("Census API attempt {}: {} ({})", attempt, url, address);
            let last = attempt >= self.retries;

            match self.get_json(&url, &query).await {
                Ok(envelope) => {
                    return envelope
                        .result
                        .and_then(|r| r.address_matches.into_iter().next())
                        .ok_or_else(|| {
                            GeocodeError::NoMatch(
                                "No address match found in Census database".to_string(),
                            )
                        });
                }
                Err(Attempt::Status(reason)) => {
                    warn!("Census API HTTP error: {}", reason);
                    if last {
                        return Err(GeocodeError::Unavailable(format!(
                            "Census API error: {}",
                            reason
                        )));
                    }
                }
                Err(Attempt::Transport(e)) => {
                    warn!("Census API attempt {} failed: {}", attempt, e);
                    if last {
                        return Err(GeocodeError::Unavailable(format!(
                            "Census API timeout/error: {}",
                            e
                        )));
                    }
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
            attempt += 1;
        }
    }

    /// Build a result from a Census address match.
    fn from_match(m: AddressMatch) -> Result<GeocodeResult, GeocodeError> {
        let (Some(point), Some(geographies)) = (m.coordinates, m.geographies) else {
            return Err(GeocodeError::Failed("Invalid data from Census API".to_string()));
        };
        let coords = Coordinates::new(point.y, point.x);
        Ok(geographies.codes().into_result(coords, m.matched_address))
    }

    /// Fallback path once the Census matcher has failed.
    async fn fallback(
        &self,
        address: &str,
        census_error: GeocodeError,
    ) -> Result<GeocodeResult, GeocodeError> {
        if let Some(google) = &self.google {
            info!("Census API failed, trying Google Geocoding as fallback...");
            match google.locate(address).await {
                Ok(coords) => return self.reverse_geocode(coords).await,
                Err(e) => warn!("Google geocoding failed: {}", e),
            }
        }

        if !HOUSE_NUMBER.is_match(address) {
            return Err(GeocodeError::Landmark(LANDMARK_MESSAGE.to_string()));
        }

        match census_error {
            GeocodeError::NoMatch(_) => Err(census_error),
            _ => Err(GeocodeError::Unavailable(GENERIC_MESSAGE.to_string())),
        }
    }
}

/// Outcome of a single HTTP attempt.
enum Attempt {
    Status(String),
    Transport(reqwest::Error),
}

#[async_trait]
impl Geocoder for CensusGeocoder {
    async fn geocode_address(&self, address: &str) -> Result<GeocodeResult, GeocodeError> {
        let cleaned = clean_address(address);
        debug!("Raw address received: {}", address);

        match self.find_match(&cleaned).await {
            Ok(m) => Self::from_match(m),
            Err(e) => self.fallback(address, e).await,
        }
    }

    async fn reverse_geocode(&self, coords: Coordinates) -> Result<GeocodeResult, GeocodeError> {
        let url = format!("{}/geocoder/geographies/coordinates", self.base_url);
        let query = [
            ("x", coords.lng.to_string()),
            ("y", coords.lat.to_string()),
            ("benchmark", BENCHMARK.to_string()),
            ("vintage", VINTAGE.to_string()),
            ("format", "json".to_string()),
        ];
        debug!("Reverse geocoding coordinates: {}, {}", coords.lat, coords.lng);

        let envelope = match self.get_json(&url, &query).await {
            Ok(envelope) => envelope,
            Err(Attempt::Status(reason)) => {
                return Err(GeocodeError::Unavailable(format!(
                    "Reverse geocoding failed: Census reverse geocoding error: {}",
                    reason
                )));
            }
            Err(Attempt::Transport(e)) => {
                warn!("Reverse geocoding failed: {}", e);
                return Err(GeocodeError::Unavailable(format!(
                    "Reverse geocoding failed: {}",
                    e
                )));
            }
        };

        let Some(geographies) = envelope.result.and_then(|r| r.geographies) else {
            return Err(GeocodeError::Failed(
                "No geographic data found for coordinates".to_string(),
            ));
        };
        if !geographies.has_tract_or_block() {
            return Err(GeocodeError::Failed(
                "No census tract found for coordinates".to_string(),
            ));
        }

        let codes = geographies.codes();
        let label = area_label(codes.county_name.as_deref(), codes.state_name.as_deref());
        Ok(codes.into_result(coords, Some(label)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::{
        extract::{Query, State},
        http::StatusCode,
        response::IntoResponse,
        routing::get,
        Json, Router,
    };
    use serde_json::{json, Value};

    use crate::error::ErrorKind;
    use crate::test_support::spawn;

    fn fowler_match() -> Value {
        json!({
            "result": {
                "addressMatches": [{
                    "matchedAddress": "4202 E FOWLER AVE, TAMPA, FL, 33620",
                    "coordinates": {"x": -82.4139, "y": 28.0587},
                    "geographies": {
                        "Census Tracts": [{"GEOID": "12057012607", "NAME": "Census Tract 126.07"}],
                        "2020 Census Blocks": [{"GEOID": "120570126071000", "NAME": "Block 1000"}],
                        "Counties": [{"GEOID": "12057", "NAME": "Hillsborough County"}],
                        "States": [{"GEOID": "12", "NAME": "Florida"}]
                    }
                }]
            }
        })
    }

    fn reverse_geographies() -> Value {
        json!({
            "result": {
                "geographies": {
                    "Census Blocks": [{"GEOID": "120570126071000"}],
                    "Counties": [{"GEOID": "12057", "NAME": "Hillsborough County"}],
                    "States": [{"GEOID": "12", "NAME": "Florida"}]
                }
            }
        })
    }

    #[derive(Clone)]
    struct Fake {
        hits: Arc<AtomicUsize>,
        fail_first: usize,
    }

    async fn oneline(
        State(fake): State<Fake>,
        Query(params): Query<HashMap<String, String>>,
    ) -> impl IntoResponse {
        let n = fake.hits.fetch_add(1, Ordering::SeqCst);
        if n < fake.fail_first {
            return (StatusCode::BAD_GATEWAY, Json(json!({}))).into_response();
        }
        assert_eq!(params.get("benchmark").map(String::as_str), Some(BENCHMARK));
        match params.get("address").map(String::as_str) {
            Some("4202 E Fowler Ave, Tampa, FL") => Json(fowler_match()).into_response(),
            _ => Json(json!({"result": {"addressMatches": []}})).into_response(),
        }
    }

    async fn coordinates(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
        match params.get("x").map(String::as_str) {
            Some("-82.4134") => Json(reverse_geographies()),
            Some("-90") => Json(json!({"result": {"geographies": {"Counties": []}}})),
            _ => Json(json!({"result": {}})),
        }
    }

    async fn census(fail_first: usize) -> (CensusGeocoder, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/geocoder/geographies/onelineaddress", get(oneline))
            .route("/geocoder/geographies/coordinates", get(coordinates))
            .route(
                "/maps/api/geocode/json",
                get(|| async {
                    Json(json!({
                        "status": "OK",
                        "results": [{"geometry": {"location": {"lat": 28.0638, "lng": -82.4134}}}]
                    }))
                }),
            )
            .with_state(Fake {
                hits: hits.clone(),
                fail_first,
            });
        let base = spawn(app).await;
        let geocoder = CensusGeocoder::new(Client::new(), base)
            .retries(2, Duration::from_millis(10))
            .timeout(Duration::from_secs(2));
        (geocoder, hits)
    }

    #[test]
    fn clean_address_strips_country_and_spaces() {
        assert_eq!(
            clean_address("  4202 E  Fowler Ave,   Tampa, FL, USA "),
            "4202 E Fowler Ave, Tampa, FL"
        );
        assert_eq!(clean_address("1 Main St, Austin, TX, United States"), "1 Main St, Austin, TX");
        assert_eq!(clean_address("1 Main St, Austin, TX, US"), "1 Main St, Austin, TX");
        assert_eq!(clean_address("1 Main St, Austin, TX"), "1 Main St, Austin, TX");
    }

    #[test]
    fn block_geoid_fills_missing_tract() {
        let geographies: Geographies = serde_json::from_value(json!({
            "Census Blocks": [{"GEOID": "120570126071000"}]
        }))
        .unwrap();
        let codes = geographies.codes();
        assert_eq!(codes.geoid.as_deref(), Some("12057012607"));
        assert_eq!(codes.state.as_deref(), Some("12"));
        assert_eq!(codes.county.as_deref(), Some("057"));
        assert_eq!(codes.tract.as_deref(), Some("012607"));
        assert_eq!(codes.block.as_deref(), Some("1000"));
    }

    #[test]
    fn county_and_state_geographies_are_fallbacks() {
        let geographies: Geographies = serde_json::from_value(json!({
            "Counties": [{"GEOID": "12057"}],
            "States": [{"GEOID": "12"}]
        }))
        .unwrap();
        let codes = geographies.codes();
        assert_eq!(codes.geoid, None);
        assert_eq!(codes.state.as_deref(), Some("12"));
        assert_eq!(codes.county.as_deref(), Some("057"));
        assert_eq!(codes.tract, None);
    }

    #[test]
    fn area_label_avoids_double_county() {
        assert_eq!(
            area_label(Some("Hillsborough County"), Some("Florida")),
            "Hillsborough County, Florida"
        );
        assert_eq!(area_label(Some("Orleans Parish"), None), "Orleans Parish County, Unknown");
        assert_eq!(area_label(None, None), "Unknown County, Unknown");
    }

    #[tokio::test]
    async fn forward_geocode_parses_match() {
        let (geocoder, _) = census(0).await;
        let result = geocoder
            .geocode_address("4202 E Fowler Ave, Tampa, FL, USA")
            .await
            .unwrap();

        assert_eq!(result.geoid.as_deref(), Some("12057012607"));
        assert_eq!(result.lat, 28.0587);
        assert_eq!(result.lng, -82.4139);
        assert_eq!(result.state.as_deref(), Some("12"));
        assert_eq!(result.county.as_deref(), Some("057"));
        assert_eq!(result.tract.as_deref(), Some("012607"));
        assert_eq!(result.block.as_deref(), Some("1000"));
        assert_eq!(result.tract_name.as_deref(), Some("Census Tract 126.07"));
        assert_eq!(
            result.matched_address.as_deref(),
            Some("4202 E FOWLER AVE, TAMPA, FL, 33620")
        );
    }

    #[tokio::test]
    async fn forward_geocode_retries_http_errors() {
        let (geocoder, hits) = census(1).await;
        let result = geocoder
            .geocode_address("4202 E Fowler Ave, Tampa, FL")
            .await
            .unwrap();
        assert_eq!(result.geoid.as_deref(), Some("12057012607"));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhausted_retries_without_fallback_is_generic_unavailable() {
        let (geocoder, hits) = census(5).await;
        let err = geocoder
            .geocode_address("4202 E Fowler Ave, Tampa, FL")
            .await
            .unwrap_err();
        assert_eq!(err, GeocodeError::Unavailable(GENERIC_MESSAGE.to_string()));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        // Proxies that drop errorKind must land on the same variant.
        assert_eq!(GeocodeError::classify(GENERIC_MESSAGE), err);
    }

    #[tokio::test]
    async fn no_match_for_street_address() {
        let (geocoder, _) = census(0).await;
        let err = geocoder
            .geocode_address("1 Unknown Road, Nowhere, ZZ")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoMatch);
    }

    #[tokio::test]
    async fn no_match_for_landmark_name() {
        let (geocoder, _) = census(0).await;
        let err = geocoder
            .geocode_address("Marshall Student Center")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Landmark);
    }

    #[tokio::test]
    async fn landmark_check_sees_raw_input() {
        let (geocoder, _) = census(0).await;
        let err = geocoder
            .geocode_address("  12 Nowhere Rd, ZZ")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Landmark);
    }

    #[tokio::test]
    async fn google_fallback_reverse_geocodes_through_census() {
        let (geocoder, _) = census(0).await;
        let google = GoogleGeocoder::new(Client::new(), geocoder.base_url.clone(), "key");
        let geocoder = geocoder.google_fallback(google);

        let result = geocoder
            .geocode_address("Marshall Student Center, Tampa")
            .await
            .unwrap();
        assert_eq!(result.geoid.as_deref(), Some("12057012607"));
        assert_eq!(
            result.matched_address.as_deref(),
            Some("Hillsborough County, Florida")
        );
        assert_eq!(result.lat, 28.0638);
    }

    #[tokio::test]
    async fn reverse_geocode_without_tract_or_block() {
        let (geocoder, _) = census(0).await;
        let err = geocoder
            .reverse_geocode(Coordinates::new(30.0, -90.0))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GeocodeError::Failed("No census tract found for coordinates".to_string())
        );
    }

    #[tokio::test]
    async fn reverse_geocode_without_geographies() {
        let (geocoder, _) = census(0).await;
        let err = geocoder
            .reverse_geocode(Coordinates::new(40.0, -100.0))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GeocodeError::Failed("No geographic data found for coordinates".to_string())
        );
    }
}

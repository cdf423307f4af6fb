//! Opportunity Zone membership checker.
//!
//! [`OzChecker`] glues the lookup table to a [`Geocoder`]: geocode the input,
//! then test the tract GEOID for membership. Failures never cross the facade
//! as `Err`; they are reported inside the [`OzCheckResult`].

use std::sync::Arc;

use serde::{Serialize, Serializer};
use tracing::{debug, info};

use crate::error::{CheckError, CheckResult, ErrorKind};
use crate::geocode::{Coordinates, GeocodeResult, Geocoder};
use crate::lookup::{OzTractSet, OzTractStore, TractStats};

const NO_TRACT_FOR_ADDRESS: &str = "Could not determine census tract for this address";
const NO_TRACT_FOR_COORDINATES: &str = "Could not determine census tract for these coordinates";

/// What was checked.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckQuery {
    Address(String),
    Coordinates(Coordinates),
}

/// Census codes of the matched location.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CensusData {
    pub state: Option<String>,
    pub county: Option<String>,
    pub tract: Option<String>,
    pub block: Option<String>,
}

/// A successfully resolved check.
#[derive(Debug, Clone, PartialEq)]
pub struct OzMatch {
    pub geoid: String,
    pub is_opportunity_zone: bool,
    pub coordinates: Coordinates,
    pub census_data: CensusData,
    pub matched_address: Option<String>,
}

impl OzMatch {
    fn new(geoid: String, is_opportunity_zone: bool, coordinates: Coordinates, geo: GeocodeResult) -> Self {
        Self {
            geoid,
            is_opportunity_zone,
            coordinates,
            census_data: CensusData {
                state: geo.state,
                county: geo.county,
                tract: geo.tract,
                block: geo.block,
            },
            matched_address: geo.matched_address,
        }
    }
}

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq)]
pub struct OzCheckResult {
    pub query: CheckQuery,
    pub outcome: Result<OzMatch, CheckError>,
}

impl OzCheckResult {
    fn new(query: CheckQuery, outcome: Result<OzMatch, CheckError>) -> Self {
        Self { query, outcome }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// `true` only for a successful check whose tract is an OZ.
    pub fn is_opportunity_zone(&self) -> bool {
        matches!(&self.outcome, Ok(m) if m.is_opportunity_zone)
    }

    pub fn matched(&self) -> Option<&OzMatch> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&CheckError> {
        self.outcome.as_ref().err()
    }

    pub fn address(&self) -> Option<&str> {
        match &self.query {
            CheckQuery::Address(a) => Some(a),
            CheckQuery::Coordinates(_) => None,
        }
    }

    /// Resolved coordinates on success, otherwise the queried ones (if any).
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (&self.outcome, &self.query) {
            (Ok(m), _) => Some(m.coordinates),
            (Err(_), CheckQuery::Coordinates(c)) => Some(*c),
            (Err(_), CheckQuery::Address(_)) => None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireResult<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    coordinates: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    geoid: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_opportunity_zone: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    census_data: Option<&'a CensusData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    matched_address: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<ErrorKind>,
}

impl Serialize for OzCheckResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let matched = self.matched();
        WireResult {
            success: self.is_success(),
            address: self.address(),
            coordinates: self.coordinates(),
            geoid: matched.map(|m| m.geoid.as_str()),
            is_opportunity_zone: matched.map(|m| m.is_opportunity_zone),
            census_data: matched.map(|m| &m.census_data),
            matched_address: matched.and_then(|m| m.matched_address.as_deref()),
            error: self.error().map(ToString::to_string),
            error_kind: self.error().map(CheckError::kind),
        }
        .serialize(serializer)
    }
}

/// Membership checker over a lookup table and a geocoder.
pub struct OzChecker {
    geocoder: Arc<dyn Geocoder>,
    store: OzTractStore,
}

impl OzChecker {
    pub fn new(geocoder: Arc<dyn Geocoder>, store: OzTractStore) -> Self {
        Self { geocoder, store }
    }

    /// Load the OZ table. Idempotent; concurrent callers share one load.
    pub async fn initialize(&self) -> CheckResult<Arc<OzTractSet>> {
        self.store.initialize().await
    }

    pub fn is_loaded(&self) -> bool {
        self.store.is_loaded()
    }

    /// Membership of a tract GEOID. Fails before [`initialize`](Self::initialize).
    pub fn is_oz(&self, geoid: &str) -> CheckResult<bool> {
        self.store.is_member(geoid)
    }

    pub fn stats(&self) -> TractStats {
        self.store.stats()
    }

    pub fn store(&self) -> &OzTractStore {
        &self.store
    }

    /// Release the loaded table.
    pub fn dispose(&mut self) {
        self.store.dispose();
    }

    /// Geocode an address and test its tract.
    pub async fn check_address(&self, address: &str) -> OzCheckResult {
        let query = CheckQuery::Address(address.to_string());
        OzCheckResult::new(query, self.resolve_address(address).await)
    }

    /// Reverse-geocode a point and test its tract.
    ///
    /// Points outside the continental U.S. are rejected before any load or
    /// network call. The result reports the caller's coordinates.
    pub async fn check_coordinates(&self, lat: f64, lng: f64) -> OzCheckResult {
        let coords = Coordinates::new(lat, lng);
        OzCheckResult::new(CheckQuery::Coordinates(coords), self.resolve_coordinates(coords).await)
    }

    async fn resolve_address(&self, address: &str) -> CheckResult<OzMatch> {
        self.initialize().await?;
        info!("Checking address: {}", address);

        let geo = self.geocoder.geocode_address(address).await?;
        let geoid = geo
            .geoid
            .clone()
            .ok_or_else(|| CheckError::NoTract(NO_TRACT_FOR_ADDRESS.to_string()))?;
        let is_oz = self.is_oz(&geoid)?;
        debug!("GEOID {} in OZ: {}", geoid, is_oz);

        let coords = geo.coordinates();
        Ok(OzMatch::new(geoid, is_oz, coords, geo))
    }

    async fn resolve_coordinates(&self, coords: Coordinates) -> CheckResult<OzMatch> {
        coords.validate()?;
        self.initialize().await?;
        info!("Checking coordinates: {}, {}", coords.lat, coords.lng);

        let geo = self.geocoder.reverse_geocode(coords).await?;
        let geoid = geo
            .geoid
            .clone()
            .ok_or_else(|| CheckError::NoTract(NO_TRACT_FOR_COORDINATES.to_string()))?;
        let is_oz = self.is_oz(&geoid)?;
        debug!("GEOID {} in OZ: {}", geoid, is_oz);

        Ok(OzMatch::new(geoid, is_oz, coords, geo))
    }
}

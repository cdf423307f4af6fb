//! Interactive check session.
//!
//! A [`CheckSession`] drives one address/coordinate form: it owns the
//! user-facing state machine (`Idle -> Loading -> Success | Error`), turns
//! check failures into guidance text, and publishes every transition on a
//! [`watch`] channel so a UI can render it.
//!
//! Each check is stamped with a request sequence number. A completion is only
//! published if no newer check (or `reset`) started in the meantime, so a slow
//! response never overwrites a newer one.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::checker::{CensusData, OzCheckResult, OzChecker};
use crate::error::{CheckError, GeocodeError};
use crate::geocode::Coordinates;

pub const MSG_LOAD_FAILED: &str = "Failed to load OZ data. Please refresh the page.";
pub const MSG_SELECT_ADDRESS: &str = "Please select an address from the suggestions";
pub const MSG_STILL_LOADING: &str = "OZ data is still loading. Please try again in a moment.";
pub const MSG_INVALID_COORDINATES: &str = "Please enter valid latitude and longitude coordinates";
pub const MSG_OUT_OF_BOUNDS: &str = "Coordinates must be within the continental United States";
pub const MSG_UNAVAILABLE: &str = "Service temporarily unavailable. Please try again in a moment.";
pub const MSG_ADDRESS_UNDETERMINED: &str =
    "Unable to determine if this address is in an Opportunity Zone";
pub const MSG_COORDINATES_UNDETERMINED: &str =
    "Unable to determine if these coordinates are in an Opportunity Zone";

pub const MSG_LANDMARK: &str = "Address not found. Building and landmark names don't work well. \
Please try a specific street address with number.

For example:
• \"4202 E Fowler Ave, Tampa, FL\" instead of \"Marshall Student Center\"
• \"123 Main Street, Tampa, FL\" instead of business names";

pub const MSG_NO_MATCH: &str = "Address not found. Please try:
• Including the full street address with number
• Verifying the address exists
• Using a different format (e.g., \"123 Main St\" vs \"123 Main Street\")
• Avoiding business names - use street addresses";

/// A completed check as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OzReport {
    #[serde(rename = "isInOZ")]
    pub is_in_oz: bool,
    pub geoid: String,
    /// The entered address, or `Coordinates: <lat>, <lng>`.
    pub address: String,
    pub coordinates: Coordinates,
    pub census_data: CensusData,
    pub matched_address: Option<String>,
}

/// Session state machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Idle,
    Loading,
    Success(OzReport),
    Error(String),
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn report(&self) -> Option<&OzReport> {
        match self {
            Self::Success(report) => Some(report),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// User-facing guidance for a failed address check.
pub fn guidance(err: &CheckError) -> String {
    match err {
        CheckError::Geocoding(GeocodeError::Landmark(_)) => MSG_LANDMARK.to_string(),
        CheckError::Geocoding(GeocodeError::NoMatch(_)) => MSG_NO_MATCH.to_string(),
        CheckError::Geocoding(GeocodeError::Unavailable(_)) => MSG_UNAVAILABLE.to_string(),
        other => {
            let message = other.to_string();
            if message.is_empty() {
                MSG_ADDRESS_UNDETERMINED.to_string()
            } else {
                message
            }
        }
    }
}

/// Progress of the session's lookup table load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LoadState {
    NotStarted,
    Loading,
    Loaded,
    Failed,
}

impl LoadState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Loading,
            2 => Self::Loaded,
            3 => Self::Failed,
            _ => Self::NotStarted,
        }
    }

    /// Message shown instead of running a check, if checks are blocked.
    fn blocking_message(self) -> Option<&'static str> {
        match self {
            Self::Loaded => None,
            Self::Failed => Some(MSG_LOAD_FAILED),
            Self::NotStarted | Self::Loading => Some(MSG_STILL_LOADING),
        }
    }
}

/// One interactive check form over a shared checker.
pub struct CheckSession {
    checker: Arc<OzChecker>,
    state: watch::Sender<SessionState>,
    sequence: AtomicU64,
    load_state: AtomicU8,
}

impl CheckSession {
    pub fn new(checker: Arc<OzChecker>) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            checker,
            state,
            load_state: AtomicU8::new(LoadState::NotStarted as u8),
            sequence: AtomicU64::new(0),
        }
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn load_state(&self) -> LoadState {
        LoadState::from_u8(self.load_state.load(Ordering::SeqCst))
    }

    pub fn data_loaded(&self) -> bool {
        self.load_state() == LoadState::Loaded
    }

    fn set_load_state(&self, state: LoadState) {
        self.load_state.store(state as u8, Ordering::SeqCst);
    }

    /// Load the OZ table. Calling again after a failure retries the load.
    pub async fn initialize(&self) -> bool {
        if !self.data_loaded() {
            self.set_load_state(LoadState::Loading);
        }

        match self.checker.initialize().await {
            Ok(_) => {
                self.set_load_state(LoadState::Loaded);
                info!("OZ checker initialized successfully");
                true
            }
            Err(e) => {
                self.set_load_state(LoadState::Failed);
                error!("Error initializing OZ checker: {}", e);
                let seq = self.begin();
                self.publish(seq, SessionState::Error(MSG_LOAD_FAILED.to_string()));
                false
            }
        }
    }

    /// Check a selected address and publish the outcome.
    pub async fn check_address(&self, address: &str) {
        let seq = self.begin();
        let address = address.trim();

        if address.is_empty() {
            self.publish(seq, SessionState::Error(MSG_SELECT_ADDRESS.to_string()));
            return;
        }
        if let Some(message) = self.load_state().blocking_message() {
            self.publish(seq, SessionState::Error(message.to_string()));
            return;
        }

        self.publish(seq, SessionState::Loading);
        debug!("Checking address: {}", address);
        let result = self.checker.check_address(address).await;

        let next = match report(&result, address.to_string()) {
            Some(report) => SessionState::Success(report),
            None => {
                let err = result.error();
                error!("OZ check failed: {:?}", err);
                SessionState::Error(
                    err.map(guidance)
                        .unwrap_or_else(|| MSG_ADDRESS_UNDETERMINED.to_string()),
                )
            }
        };
        self.publish(seq, next);
    }

    /// Check a latitude/longitude pair entered as text.
    pub async fn check_coordinates(&self, latitude: &str, longitude: &str) {
        let seq = self.begin();

        let (Some(lat), Some(lng)) = (parse_degrees(latitude), parse_degrees(longitude)) else {
            self.publish(seq, SessionState::Error(MSG_INVALID_COORDINATES.to_string()));
            return;
        };
        if !Coordinates::new(lat, lng).in_continental_us() {
            self.publish(seq, SessionState::Error(MSG_OUT_OF_BOUNDS.to_string()));
            return;
        }
        if let Some(message) = self.load_state().blocking_message() {
            self.publish(seq, SessionState::Error(message.to_string()));
            return;
        }

        self.publish(seq, SessionState::Loading);
        debug!("Checking coordinates: {}, {}", lat, lng);
        let result = self.checker.check_coordinates(lat, lng).await;

        let label = format!("Coordinates: {}, {}", lat, lng);
        let next = match report(&result, label) {
            Some(report) => SessionState::Success(report),
            None => SessionState::Error(
                result
                    .error()
                    .map(ToString::to_string)
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| MSG_COORDINATES_UNDETERMINED.to_string()),
            ),
        };
        self.publish(seq, next);
    }

    /// Clear result and error. In-flight checks are discarded when they finish.
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            self.sequence.fetch_add(1, Ordering::SeqCst);
            *state = SessionState::Idle;
        });
    }

    /// Start a new request and return its sequence number.
    fn begin(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish `next` unless a newer request has started.
    fn publish(&self, seq: u64, next: SessionState) {
        let published = self.state.send_if_modified(|state| {
            if self.sequence.load(Ordering::SeqCst) != seq {
                return false;
            }
            *state = next;
            true
        });
        if !published {
            debug!("Discarding stale check result (request {})", seq);
        }
    }
}

fn parse_degrees(input: &str) -> Option<f64> {
    input.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn report(result: &OzCheckResult, label: String) -> Option<OzReport> {
    let m = result.matched()?;
    Some(OzReport {
        is_in_oz: m.is_opportunity_zone,
        geoid: m.geoid.clone(),
        address: label,
        coordinates: m.coordinates,
        census_data: m.census_data.clone(),
        matched_address: m.matched_address.clone(),
    })
}

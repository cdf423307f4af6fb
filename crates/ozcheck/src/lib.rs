//! ozcheck - Opportunity Zone membership checker.
//!
//! Answers whether a U.S. address or coordinate pair lies in a federally
//! designated Opportunity Zone: geocode the input to a census tract, then look
//! the tract GEOID up in the OZ table.

pub mod checker;
pub mod config;
pub mod data;
pub mod error;
pub mod geocode;
pub mod lookup;
pub mod session;

#[cfg(test)]
mod test_support;

pub use checker::{CensusData, CheckQuery, OzCheckResult, OzChecker, OzMatch};
pub use error::{CheckError, CheckResult, ErrorKind, GeocodeError};
pub use geocode::{Coordinates, GeocodeResult, Geocoder};
pub use lookup::{OzTractSet, OzTractStore, TractSource, TractStats};

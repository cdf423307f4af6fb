//! HTTP request handlers for the web server.

mod api;
pub mod api_types;
mod check;
mod data;
mod geocoder;
pub mod openapi;

pub use api::{health, oz_stats};
pub use check::oz_check;
pub use data::geoid_resource;
pub use geocoder::census_geocoder;
pub use openapi::openapi_spec;

//! Command-line interface for ozcheck.

mod commands;
pub mod icons;

pub use commands::{is_verbose, run};

//! Console output icons.

use console::{style, StyledObject};

/// Success checkmark icon (green ✓).
pub fn success() -> StyledObject<&'static str> {
    style("✓").green()
}

/// Warning icon (yellow !).
pub fn warn() -> StyledObject<&'static str> {
    style("!").yellow()
}

/// Error icon (red ✗).
pub fn error() -> StyledObject<&'static str> {
    style("✗").red()
}

/// Dim arrow for secondary info.
pub fn dim_arrow() -> StyledObject<&'static str> {
    style("→").dim()
}

/// Headline for a membership verdict.
pub fn verdict(in_zone: bool) -> StyledObject<&'static str> {
    if in_zone {
        style("✓ In an Opportunity Zone").green().bold()
    } else {
        style("✗ Not in an Opportunity Zone").red().bold()
    }
}

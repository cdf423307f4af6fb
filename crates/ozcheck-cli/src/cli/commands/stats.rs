//! Lookup table statistics command.

use console::style;

use crate::cli::icons::{dim_arrow, success};
use ozcheck::config::Settings;

/// Load the lookup data and print its statistics.
pub async fn cmd_stats(settings: &Settings, json: bool) -> anyhow::Result<()> {
    let checker = settings.checker()?;
    checker.initialize().await?;
    let stats = checker.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!(
        "{} Loaded {} OZ tracts",
        success(),
        style(stats.total_oz_tracts).bold()
    );
    println!("  {} Source: {}", dim_arrow(), settings.data_source);
    if !stats.sample_geoids.is_empty() {
        println!(
            "  {} Sample: {}",
            dim_arrow(),
            stats.sample_geoids.join(", ")
        );
    }

    Ok(())
}

//! Lookup data maintenance commands.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use console::style;

use crate::cli::icons::{dim_arrow, success, warn};
use ozcheck::config::Settings;
use ozcheck::data::{self, ExtractedGeoids};

const LISTED_DIFFERENCES: usize = 20;

/// Compare the configured lookup file with a full OZ GeoJSON export.
pub async fn cmd_compare(settings: &Settings, geojson: &Path) -> anyhow::Result<()> {
    if !geojson.is_file() {
        anyhow::bail!("Full GeoJSON not found: {}", geojson.display());
    }

    eprintln!(
        "{} Loading checker GEOIDs from {}",
        style("→").cyan(),
        settings.data_source
    );
    let checker = settings.checker()?;
    let table = checker.initialize().await?;
    eprintln!("  {} Checker: {} GEOIDs", dim_arrow(), table.geoids().len());

    eprintln!(
        "{} Loading full GeoJSON: {}",
        style("→").cyan(),
        geojson.display()
    );
    let full = read_geojson(geojson)?;
    eprintln!(
        "  {} Full file: {} features, {} unique GEOID10",
        dim_arrow(),
        full.feature_count,
        full.geoids.len()
    );

    let comparison = data::compare(table.geoids(), &full.geoids);

    println!();
    println!("{}", style("=== Comparison ===").bold());
    println!("Checker list count:       {}", comparison.checker_count);
    println!("Full file feature count:  {}", full.feature_count);
    println!("Full file unique GEOID10: {}", full.geoids.len());
    println!("In both:                  {}", comparison.in_both.len());
    println!("Only in checker list:     {}", comparison.only_in_checker.len());
    println!("Only in full GeoJSON:     {}", comparison.only_in_full.len());
    println!();

    print_differences(
        "GEOIDs in checker list but NOT in full GeoJSON",
        &comparison.only_in_checker,
    );
    print_differences(
        "GEOIDs in full GeoJSON but NOT in checker list",
        &comparison.only_in_full,
    );

    if comparison.is_identical() {
        println!(
            "{} Result: Checker list and full GeoJSON have the EXACT same {} zones (same GEOID set).",
            success(),
            comparison.checker_count
        );
    } else {
        println!(
            "{} Result: Checker list and full GeoJSON DIFFER. Consider regenerating oz-geoid-minimal.json from the full GeoJSON.",
            warn()
        );
    }

    Ok(())
}

/// Write the GEOID10 values of a GeoJSON export as a lookup file.
pub async fn cmd_extract(geojson: &Path, output: &Path) -> anyhow::Result<()> {
    if !geojson.is_file() {
        anyhow::bail!("GeoJSON not found: {}", geojson.display());
    }

    let extracted = read_geojson(geojson)?;
    if extracted.geoids.is_empty() {
        anyhow::bail!(
            "No GEOID10 values found in {} ({} features)",
            geojson.display(),
            extracted.feature_count
        );
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(output)?);
    data::write_minimal(&extracted.geoids, &mut writer)?;
    writer.flush()?;

    println!(
        "{} Wrote {} GEOIDs to {}",
        success(),
        extracted.geoids.len(),
        output.display()
    );
    println!(
        "  {} {} features read",
        dim_arrow(),
        extracted.feature_count
    );

    Ok(())
}

fn read_geojson(path: &Path) -> anyhow::Result<ExtractedGeoids> {
    let reader = BufReader::new(File::open(path)?);
    Ok(data::extract_geoids(reader)?)
}

fn print_differences(heading: &str, geoids: &BTreeSet<String>) {
    if geoids.is_empty() {
        return;
    }

    println!("{} (first {}):", heading, LISTED_DIFFERENCES);
    for geoid in geoids.iter().take(LISTED_DIFFERENCES) {
        println!("  {}", geoid);
    }
    if geoids.len() > LISTED_DIFFERENCES {
        println!("  ... and {} more", geoids.len() - LISTED_DIFFERENCES);
    }
    println!();
}

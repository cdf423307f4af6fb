//! Address and coordinate check commands.

use std::sync::Arc;

use console::style;

use crate::cli::icons::{dim_arrow, error, verdict};
use ozcheck::config::Settings;
use ozcheck::session::{CheckSession, OzReport, SessionState};
use ozcheck::{OzCheckResult, OzChecker};

/// Check an address.
pub async fn cmd_check(settings: &Settings, address: &str, json: bool) -> anyhow::Result<()> {
    let checker = Arc::new(settings.checker()?);

    if json {
        let result = checker.check_address(address).await;
        return print_json(&result);
    }

    let session = open_session(checker).await?;
    session.check_address(address).await;
    render(session.state())
}

/// Check a latitude/longitude pair.
pub async fn cmd_coords(settings: &Settings, lat: &str, lng: &str, json: bool) -> anyhow::Result<()> {
    let checker = Arc::new(settings.checker()?);

    if json {
        let (lat, lng) = match (lat.trim().parse::<f64>(), lng.trim().parse::<f64>()) {
            (Ok(lat), Ok(lng)) => (lat, lng),
            _ => anyhow::bail!("Invalid coordinates: {}, {}", lat, lng),
        };
        let result = checker.check_coordinates(lat, lng).await;
        return print_json(&result);
    }

    let session = open_session(checker).await?;
    session.check_coordinates(lat, lng).await;
    render(session.state())
}

/// Load the lookup data, reporting the underlying cause if it cannot be read.
async fn open_session(checker: Arc<OzChecker>) -> anyhow::Result<CheckSession> {
    checker.initialize().await?;

    let session = CheckSession::new(checker);
    if !session.initialize().await {
        render(session.state())?;
    }
    Ok(session)
}

fn print_json(result: &OzCheckResult) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    if !result.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn render(state: SessionState) -> anyhow::Result<()> {
    match state {
        SessionState::Success(report) => {
            print_report(&report);
            Ok(())
        }
        SessionState::Error(message) => {
            eprintln!("{} {}", error(), message);
            std::process::exit(1);
        }
        SessionState::Idle | SessionState::Loading => {
            anyhow::bail!("Check did not complete")
        }
    }
}

fn print_report(report: &OzReport) {
    println!("{}", verdict(report.is_in_oz));
    println!("  {} {}", style("Address:").bold(), report.address);
    if let Some(ref matched) = report.matched_address {
        println!("  {} {}", style("Matched:").bold(), matched);
    }
    println!("  {} {}", style("Tract GEOID:").bold(), report.geoid);
    println!(
        "  {} {:.6}, {:.6}",
        style("Coordinates:").bold(),
        report.coordinates.lat,
        report.coordinates.lng
    );

    let census = &report.census_data;
    let codes: Vec<String> = [
        ("state", &census.state),
        ("county", &census.county),
        ("tract", &census.tract),
        ("block", &census.block),
    ]
    .into_iter()
    .filter_map(|(label, code)| code.as_ref().map(|c| format!("{} {}", label, c)))
    .collect();
    if !codes.is_empty() {
        println!("  {} {}", dim_arrow(), style(codes.join(", ")).dim());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_lookup_file_reports_load_cause() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            data_source: dir.path().join("missing.json").display().to_string(),
            ..Settings::default()
        };

        let err = open_session(Arc::new(settings.checker().unwrap()))
            .await
            .err()
            .unwrap();
        let message = err.to_string();
        assert!(message.starts_with("Failed to load OZ data"), "{}", message);
        assert!(message.contains("missing.json"), "{}", message);
    }
}

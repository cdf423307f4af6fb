//! Address autocomplete command.

use console::style;

use crate::cli::icons::warn;
use ozcheck::config::Settings;

/// Print address suggestions for partial input.
pub async fn cmd_suggest(settings: &Settings, input: &str) -> anyhow::Result<()> {
    let client = settings.http_client()?;
    let Some(places) = settings.places_client(client) else {
        anyhow::bail!(
            "No Google Maps API key configured. Set GOOGLE_MAPS_API_KEY or google_api_key in the config file."
        );
    };

    let predictions = places.suggest(input).await;
    if predictions.is_empty() {
        eprintln!("{} No suggestions for '{}'", warn(), input);
        return Ok(());
    }

    for prediction in predictions {
        println!(
            "{}  {}",
            prediction.description,
            style(&prediction.place_id).dim()
        );
    }

    Ok(())
}

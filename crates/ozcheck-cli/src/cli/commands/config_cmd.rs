//! Configuration management commands.

use console::style;
use serde_json::json;

use crate::cli::icons::dim_arrow;
use ozcheck::config::{Config, Settings};

/// Show the effective settings.
pub fn cmd_config_show(settings: &Settings, config: &Config, json: bool) -> anyhow::Result<()> {
    let source = config
        .source_path
        .as_ref()
        .map(|p| p.display().to_string());
    let api_key = settings.google_api_key.as_deref().map(mask);

    if json {
        let value = json!({
            "configFile": source,
            "dataSource": settings.data_source,
            "proxyUrl": settings.proxy_url,
            "censusBaseUrl": settings.census_base_url,
            "googleBaseUrl": settings.google_base_url,
            "placesBaseUrl": settings.places_base_url,
            "googleApiKey": api_key,
            "requestTimeout": settings.request_timeout,
            "geocodeRetries": settings.geocode_retries,
            "retryDelayMs": settings.retry_delay_ms,
            "userAgent": settings.user_agent,
            "host": settings.host,
            "port": settings.port,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match source {
        Some(path) => println!("{} {}", style("Config file:").bold(), path),
        None => println!(
            "{} {}",
            style("Config file:").bold(),
            style("none (using defaults and environment)").dim()
        ),
    }

    let rows = [
        ("data_source", settings.data_source.clone()),
        (
            "proxy_url",
            settings
                .proxy_url
                .clone()
                .unwrap_or_else(|| "(direct Census API)".to_string()),
        ),
        ("census_base_url", settings.census_base_url.clone()),
        ("google_base_url", settings.google_base_url.clone()),
        ("places_base_url", settings.places_base_url.clone()),
        (
            "google_api_key",
            api_key.unwrap_or_else(|| "(not set)".to_string()),
        ),
        ("request_timeout", format!("{}s", settings.request_timeout)),
        ("geocode_retries", settings.geocode_retries.to_string()),
        ("retry_delay_ms", settings.retry_delay_ms.to_string()),
        ("user_agent", settings.user_agent.clone()),
        ("bind", format!("{}:{}", settings.host, settings.port)),
    ];
    for (name, value) in rows {
        println!("  {} {:<16} {}", dim_arrow(), name, value);
    }

    Ok(())
}

/// Keep the last four characters of a secret.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

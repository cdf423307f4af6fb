//! ozcheck - Opportunity Zone membership checker.
//!
//! Checks whether a U.S. address or coordinate pair lies in a federally
//! designated Opportunity Zone, and serves the same checks over HTTP.

mod cli;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    let default_filter = if cli::is_verbose() {
        "ozcheck=info,ozcheck_server=info"
    } else {
        "ozcheck=warn,ozcheck_server=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    cli::run().await
}

//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod check;
mod config_cmd;
mod data;
mod serve;
mod stats;
mod suggest;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ozcheck::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "ozcheck")]
#[command(about = "Check whether U.S. addresses are in Opportunity Zones")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// OZ GEOID lookup file or URL (overrides config file)
    #[arg(long, short = 'd', global = true, env = "OZCHECK_DATA")]
    data: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether an address is in an Opportunity Zone
    Check {
        /// Street address, e.g. "4202 E Fowler Ave, Tampa, FL"
        address: String,
        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether a latitude/longitude pair is in an Opportunity Zone
    #[command(allow_negative_numbers = true)]
    Coords {
        /// Latitude in decimal degrees
        lat: String,
        /// Longitude in decimal degrees
        lng: String,
        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Suggest U.S. street addresses for partial input (needs a Google API key)
    Suggest {
        /// Partial address
        input: String,
    },

    /// Load the lookup data and show statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP server (geocoder proxy, lookup data, check API)
    Serve {
        /// Bind address: PORT, HOST, or HOST:PORT (defaults to config or 127.0.0.1:3030)
        bind: Option<String>,
    },

    /// Compare the lookup file with the GEOID10 values of a full OZ GeoJSON
    Compare {
        /// Full Opportunity Zones GeoJSON export
        geojson: PathBuf,
    },

    /// Extract GEOID10 values from a GeoJSON into a lookup file
    Extract {
        /// Full Opportunity Zones GeoJSON export
        geojson: PathBuf,
        /// Output lookup file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective settings and where they came from
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
        data: cli.data,
    };
    let (settings, config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Check { address, json } => check::cmd_check(&settings, &address, json).await,
        Commands::Coords { lat, lng, json } => {
            check::cmd_coords(&settings, &lat, &lng, json).await
        }
        Commands::Suggest { input } => suggest::cmd_suggest(&settings, &input).await,
        Commands::Stats { json } => stats::cmd_stats(&settings, json).await,
        Commands::Serve { bind } => serve::cmd_serve(&settings, bind.as_deref()).await,
        Commands::Compare { geojson } => data::cmd_compare(&settings, &geojson).await,
        Commands::Extract { geojson, output } => data::cmd_extract(&geojson, &output).await,
        Commands::Config { command } => match command {
            ConfigCommands::Show { json } => config_cmd::cmd_config_show(&settings, &config, json),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn coords_accept_negative_longitude() {
        let cli = Cli::try_parse_from(["ozcheck", "coords", "28.0587", "-82.4139"]).unwrap();
        match cli.command {
            Commands::Coords { lat, lng, json } => {
                assert_eq!(lat, "28.0587");
                assert_eq!(lng, "-82.4139");
                assert!(!json);
            }
            _ => panic!("expected coords"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ozcheck",
            "check",
            "4202 E Fowler Ave, Tampa, FL",
            "--data",
            "oz.json",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.data.as_deref(), Some("oz.json"));
        assert!(cli.verbose);
    }
}

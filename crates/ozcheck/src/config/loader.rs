//! Configuration loading and merging logic.

use std::path::{Path, PathBuf};

use super::{is_url, Config, Settings};

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Use CWD for relative paths instead of config file directory.
    pub use_cwd: bool,
    /// Lookup resource override (--data flag): a file path or URL.
    pub data: Option<String>,
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Non-empty environment variable.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

async fn load_file_config(options: &LoadOptions) -> Config {
    if let Some(ref config_path) = options.config_path {
        return Config::load_from_path(config_path)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("{}", e);
                Config::default()
            });
    }

    Config::load().await
}

/// Resolve a `--data` override: URLs are kept, paths made absolute.
fn resolve_data_override(data: &str) -> String {
    if is_url(data) {
        return data.to_string();
    }
    let expanded = shellexpand::tilde(data);
    let path = Path::new(expanded.as_ref());
    if path.is_absolute() {
        path.display().to_string()
    } else {
        current_dir().join(path).display().to_string()
    }
}

/// Environment variables take precedence over config files.
fn apply_env_overrides(settings: &mut Settings) {
    if let Some(data) = env_var("OZCHECK_DATA") {
        tracing::debug!("Using OZCHECK_DATA from environment: {}", data);
        settings.data_source = resolve_data_override(&data);
    }
    if let Some(proxy) = env_var("OZCHECK_PROXY_URL") {
        tracing::debug!("Using OZCHECK_PROXY_URL from environment: {}", proxy);
        settings.proxy_url = Some(proxy);
    }
    if let Some(census) = env_var("OZCHECK_CENSUS_URL") {
        settings.census_base_url = census;
    }
    if let Some(key) =
        env_var("GOOGLE_MAPS_API_KEY").or_else(|| env_var("NEXT_PUBLIC_GOOGLE_MAPS_API_KEY"))
    {
        settings.google_api_key = Some(key);
    }
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    let config = load_file_config(&options).await;

    let mut settings = Settings::default();

    let base_dir = if options.use_cwd {
        current_dir()
    } else {
        config.base_dir().unwrap_or_else(current_dir)
    };

    config.apply_to_settings(&mut settings, &base_dir);
    apply_env_overrides(&mut settings);

    // --data takes precedence over everything
    if let Some(ref data) = options.data {
        settings.data_source = resolve_data_override(data);
    }

    (settings, config)
}

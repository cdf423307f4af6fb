//! Configuration management for ozcheck using the prefer crate.

mod loader;
mod settings;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use loader::{load_settings_with_options, LoadOptions};
pub use settings::Settings;

/// Default location of the GEOID lookup resource.
pub const DEFAULT_DATA_SOURCE: &str = "data/oz-geoid-minimal.json";

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// GEOID lookup resource: a file path or an http(s) URL.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "data")]
    pub data_source: Option<String>,
    /// Census-geocoder proxy endpoint. When set, checks go through the proxy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub census_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub places_base_url: Option<String>,
    /// Google Maps API key, used for the geocoding fallback and suggestions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_api_key: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Forward geocoding attempts against the Census API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocode_retries: Option<u32>,
    /// Delay between attempts in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Server bind address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer for discovery.
    pub async fn load() -> Self {
        match prefer::load("ozcheck").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_from_path(path).await.unwrap_or_else(|e| {
                    tracing::warn!("{}", e);
                    Self::default()
                }),
                None => Self::default(),
            },
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// JSON, TOML and YAML are chosen by file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Directory of the config file, for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to `base_dir`. `~` is expanded.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref source) = self.data_source {
            settings.data_source = if is_url(source) {
                source.clone()
            } else {
                self.resolve_path(source, base_dir).display().to_string()
            };
        }
        if let Some(ref url) = self.proxy_url {
            settings.proxy_url = Some(url.clone());
        }
        if let Some(ref url) = self.census_base_url {
            settings.census_base_url = url.clone();
        }
        if let Some(ref url) = self.google_base_url {
            settings.google_base_url = url.clone();
        }
        if let Some(ref url) = self.places_base_url {
            settings.places_base_url = url.clone();
        }
        if let Some(ref key) = self.google_api_key {
            settings.google_api_key = Some(key.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(retries) = self.geocode_retries {
            settings.geocode_retries = retries;
        }
        if let Some(delay) = self.retry_delay_ms {
            settings.retry_delay_ms = delay;
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        if let Some(ref host) = self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
    }
}

pub(crate) fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_relative_data_source_resolves_against_base() {
        let config = Config {
            data_source: Some("data/oz.json".to_string()),
            ..Config::default()
        };
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, Path::new("/srv/site"));

        assert_eq!(settings.data_source, "/srv/site/data/oz.json");
    }

    #[test]
    fn apply_url_data_source_is_kept() {
        let config = Config {
            data_source: Some("https://example.com/data/oz-geoid-minimal.json".to_string()),
            ..Config::default()
        };
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, Path::new("/srv/site"));

        assert_eq!(
            settings.data_source,
            "https://example.com/data/oz-geoid-minimal.json"
        );
    }

    #[test]
    fn apply_empty_config_leaves_defaults() {
        let mut settings = Settings::default();
        Config::default().apply_to_settings(&mut settings, Path::new("/tmp"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn apply_overrides_scalars() {
        let config = Config {
            proxy_url: Some("http://localhost:3000/api/census-geocoder".to_string()),
            request_timeout: Some(3),
            geocode_retries: Some(4),
            port: Some(8080),
            ..Config::default()
        };
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, Path::new("/tmp"));

        assert_eq!(
            settings.proxy_url.as_deref(),
            Some("http://localhost:3000/api/census-geocoder")
        );
        assert_eq!(settings.request_timeout, 3);
        assert_eq!(settings.geocode_retries, 4);
        assert_eq!(settings.port, 8080);
    }

    #[tokio::test]
    async fn load_from_path_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("ozcheck.toml");
        std::fs::write(&toml_path, "data_source = \"oz.json\"\nport = 4000\n").unwrap();
        let config = Config::load_from_path(&toml_path).await.unwrap();
        assert_eq!(config.data_source.as_deref(), Some("oz.json"));
        assert_eq!(config.port, Some(4000));
        assert_eq!(config.base_dir().as_deref(), Some(dir.path()));

        let yaml_path = dir.path().join("ozcheck.yaml");
        std::fs::write(&yaml_path, "geocode_retries: 3\n").unwrap();
        let config = Config::load_from_path(&yaml_path).await.unwrap();
        assert_eq!(config.geocode_retries, Some(3));

        let json_path = dir.path().join("ozcheck.json");
        std::fs::write(&json_path, r#"{"data": "https://example.com/oz.json"}"#).unwrap();
        let config = Config::load_from_path(&json_path).await.unwrap();
        assert_eq!(config.data_source.as_deref(), Some("https://example.com/oz.json"));
    }

    #[tokio::test]
    async fn load_from_path_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ozcheck.toml");
        std::fs::write(&path, "port = \"not a number\"").unwrap();

        let err = Config::load_from_path(&path).await.unwrap_err();
        assert!(err.starts_with("Failed to parse TOML config"));
    }
}

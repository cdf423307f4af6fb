//! Runtime settings.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::checker::OzChecker;
use crate::geocode::{CensusGeocoder, Geocoder, GoogleGeocoder, PlacesClient, ProxyGeocoder};
use crate::lookup::{from_location, OzTractStore, TractSource};

use super::DEFAULT_DATA_SOURCE;

/// Application settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// GEOID lookup resource: a file path or an http(s) URL.
    pub data_source: String,
    /// Census-geocoder proxy endpoint. `None` talks to the Census API directly.
    pub proxy_url: Option<String>,
    pub census_base_url: String,
    pub google_base_url: String,
    pub places_base_url: String,
    pub google_api_key: Option<String>,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Forward geocoding attempts against the Census API.
    pub geocode_retries: u32,
    /// Delay between attempts in milliseconds.
    pub retry_delay_ms: u64,
    pub user_agent: String,
    pub host: String,
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_source: DEFAULT_DATA_SOURCE.to_string(),
            proxy_url: None,
            census_base_url: "https://geocoding.geo.census.gov".to_string(),
            google_base_url: "https://maps.googleapis.com".to_string(),
            places_base_url: "https://places.googleapis.com".to_string(),
            google_api_key: None,
            request_timeout: 8,
            geocode_retries: 2,
            retry_delay_ms: 1000,
            user_agent: format!("ozcheck/{}", env!("CARGO_PKG_VERSION")),
            host: "127.0.0.1".to_string(),
            port: 3030,
        }
    }
}

impl Settings {
    /// Shared HTTP client for every outbound request.
    pub fn http_client(&self) -> reqwest::Result<Client> {
        Client::builder()
            .user_agent(&self.user_agent)
            .timeout(Duration::from_secs(self.request_timeout))
            .build()
    }

    pub fn tract_source(&self, client: Client) -> Arc<dyn TractSource> {
        from_location(&self.data_source, client)
    }

    /// Direct Census geocoder, with the Google fallback when a key is configured.
    pub fn census_geocoder(&self, client: Client) -> CensusGeocoder {
        let census = CensusGeocoder::new(client.clone(), &self.census_base_url)
            .timeout(Duration::from_secs(self.request_timeout))
            .retries(
                self.geocode_retries,
                Duration::from_millis(self.retry_delay_ms),
            );

        match self.google_api_key {
            Some(ref key) => census.google_fallback(GoogleGeocoder::new(
                client,
                &self.google_base_url,
                key,
            )),
            None => census,
        }
    }

    /// The geocoder checks should use: the proxy when configured, else Census.
    pub fn geocoder(&self, client: Client) -> Arc<dyn Geocoder> {
        match self.proxy_url {
            Some(ref url) => Arc::new(ProxyGeocoder::new(client, url)),
            None => Arc::new(self.census_geocoder(client)),
        }
    }

    /// Places autocomplete, if an API key is configured.
    pub fn places_client(&self, client: Client) -> Option<PlacesClient> {
        self.google_api_key
            .as_ref()
            .map(|key| PlacesClient::new(client, &self.places_base_url, key))
    }

    /// Build a checker over the configured lookup resource and geocoder.
    pub fn checker(&self) -> reqwest::Result<OzChecker> {
        let client = self.http_client()?;
        let store = OzTractStore::new(self.tract_source(client.clone()));
        Ok(OzChecker::new(self.geocoder(client), store))
    }
}

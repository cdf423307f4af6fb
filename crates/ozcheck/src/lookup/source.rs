//! Where the GEOID lookup table comes from.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::{CheckError, CheckResult};

/// A fetchable copy of the `{ "geoids": [...] }` resource.
#[async_trait]
pub trait TractSource: Send + Sync {
    /// Fetch the raw resource bytes.
    async fn fetch(&self) -> CheckResult<Vec<u8>>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// Resolve a configured location to a source.
/// `http://` and `https://` locations are fetched over HTTP; anything else is a file path.
pub fn from_location(location: &str, client: Client) -> Arc<dyn TractSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Arc::new(HttpTractSource::new(client, location))
    } else {
        Arc::new(FileTractSource::new(location))
    }
}

/// Resource served over HTTP (the site's `/data/oz-geoid-minimal.json`).
pub struct HttpTractSource {
    client: Client,
    url: String,
}

impl HttpTractSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl TractSource for HttpTractSource {
    async fn fetch(&self) -> CheckResult<Vec<u8>> {
        debug!("GET {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| CheckError::DataLoad(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CheckError::DataLoad(format!(
                "HTTP {}",
                response.status().as_u16()
            )));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| CheckError::DataLoad(e.to_string()))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Resource read from the local filesystem.
pub struct FileTractSource {
    path: PathBuf,
}

impl FileTractSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TractSource for FileTractSource {
    async fn fetch(&self) -> CheckResult<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| CheckError::DataLoad(format!("{}: {}", self.path.display(), e)))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{http::StatusCode, routing::get, Router};

    use crate::test_support::spawn;

    #[test]
    fn from_location_picks_backend_by_scheme() {
        let client = Client::new();
        let http = from_location("https://example.com/data/oz.json", client.clone());
        assert_eq!(http.describe(), "https://example.com/data/oz.json");

        let file = from_location("data/oz-geoid-minimal.json", client);
        assert_eq!(file.describe(), "data/oz-geoid-minimal.json");
    }

    #[tokio::test]
    async fn file_source_reads_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oz.json");
        std::fs::write(&path, br#"{"geoids":["12057012607"]}"#).unwrap();

        let bytes = FileTractSource::new(&path).fetch().await.unwrap();
        assert_eq!(bytes, br#"{"geoids":["12057012607"]}"#);
    }

    #[tokio::test]
    async fn file_source_missing_file_is_data_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileTractSource::new(dir.path().join("missing.json"))
            .fetch()
            .await
            .unwrap_err();
        assert!(matches!(err, CheckError::DataLoad(_)));
    }

    #[tokio::test]
    async fn http_source_fetches_body() {
        let app = Router::new().route(
            "/data/oz.json",
            get(|| async { r#"{"geoids":["06037206020"]}"# }),
        );
        let base = spawn(app).await;

        let source = HttpTractSource::new(Client::new(), format!("{}/data/oz.json", base));
        let bytes = source.fetch().await.unwrap();
        assert_eq!(bytes, br#"{"geoids":["06037206020"]}"#);
    }

    #[tokio::test]
    async fn http_source_non_success_is_data_load_error() {
        let app = Router::new().route("/data/oz.json", get(|| async { StatusCode::NOT_FOUND }));
        let base = spawn(app).await;

        let source = HttpTractSource::new(Client::new(), format!("{}/data/oz.json", base));
        let err = source.fetch().await.unwrap_err();
        assert_eq!(err, CheckError::DataLoad("HTTP 404".to_string()));
    }
}

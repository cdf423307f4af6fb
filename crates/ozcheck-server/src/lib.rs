//! Web server for Opportunity Zone checks.
//!
//! Serves:
//! - the census-geocoder proxy endpoint that `ProxyGeocoder` clients call
//! - the static GEOID lookup resource
//! - a combined geocode-and-lookup check endpoint
//! - health, table statistics and the OpenAPI document

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use ozcheck::config::Settings;
use ozcheck::{Geocoder, OzChecker, OzTractStore};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub checker: Arc<OzChecker>,
    /// Direct Census geocoder behind the proxy endpoint.
    pub geocoder: Arc<dyn Geocoder>,
}

impl AppState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let client = settings.http_client()?;
        // The server is the proxy, so it never geocodes through one.
        let geocoder: Arc<dyn Geocoder> = Arc::new(settings.census_geocoder(client.clone()));
        let store = OzTractStore::new(settings.tract_source(client));

        Ok(Self {
            checker: Arc::new(OzChecker::new(geocoder.clone(), store)),
            geocoder,
        })
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;
    if let Err(e) = state.checker.initialize().await {
        tracing::warn!("OZ data not loaded at startup, will retry on demand: {}", e);
    }
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

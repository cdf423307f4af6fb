//! Opportunity Zone tract lookup table.
//!
//! The table is the full list of OZ census-tract GEOIDs, loaded once from a
//! static `{ "geoids": [...] }` resource. Loading is single-flight: callers
//! that arrive while a load is in progress await that load instead of
//! starting another one. A failed load is not cached, so the next call
//! retries.

mod source;

pub use source::{from_location, FileTractSource, HttpTractSource, TractSource};

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::error::{CheckError, CheckResult};

/// Number of GEOIDs reported in [`TractStats::sample_geoids`].
const SAMPLE_SIZE: usize = 5;

/// On-disk shape of the lookup resource.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GeoidFile {
    pub geoids: Vec<String>,
}

/// Immutable set of OZ tract GEOIDs.
#[derive(Debug, Clone)]
pub struct OzTractSet {
    /// Resource order, kept for stats.
    geoids: Vec<String>,
    set: HashSet<String>,
}

impl OzTractSet {
    /// Parse the `{ "geoids": [...] }` resource.
    pub fn from_json(bytes: &[u8]) -> CheckResult<Self> {
        let file: GeoidFile = serde_json::from_slice(bytes)
            .map_err(|e| CheckError::DataLoad(format!("invalid GEOID data: {}", e)))?;
        Ok(Self::from_geoids(file.geoids))
    }

    pub fn from_geoids<I, S>(geoids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let geoids: Vec<String> = geoids.into_iter().map(Into::into).collect();
        let set = geoids.iter().cloned().collect();
        Self { geoids, set }
    }

    pub fn contains(&self, geoid: &str) -> bool {
        self.set.contains(geoid)
    }

    /// Number of entries in the resource (duplicates included).
    pub fn len(&self) -> usize {
        self.geoids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geoids.is_empty()
    }

    pub fn geoids(&self) -> &[String] {
        &self.geoids
    }

    /// Unique GEOIDs.
    pub fn as_set(&self) -> &HashSet<String> {
        &self.set
    }
}

/// Summary of the loaded table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TractStats {
    #[serde(rename = "totalOZTracts")]
    pub total_oz_tracts: usize,
    pub loaded: bool,
    #[serde(rename = "sampleGeoids")]
    pub sample_geoids: Vec<String>,
}

impl TractStats {
    fn unloaded() -> Self {
        Self {
            total_oz_tracts: 0,
            loaded: false,
            sample_geoids: Vec::new(),
        }
    }
}

/// Lazily loaded, shareable lookup table.
pub struct OzTractStore {
    source: Arc<dyn TractSource>,
    cell: OnceCell<Arc<OzTractSet>>,
}

impl OzTractStore {
    pub fn new(source: Arc<dyn TractSource>) -> Self {
        Self {
            source,
            cell: OnceCell::new(),
        }
    }

    /// Load the table if it is not loaded yet.
    ///
    /// Concurrent callers share one fetch. Calling again after success is a no-op.
    pub async fn initialize(&self) -> CheckResult<Arc<OzTractSet>> {
        self.cell
            .get_or_try_init(|| async {
                info!("Loading OZ GEOID lookup data from {}", self.source.describe());
                let result = self
                    .source
                    .fetch()
                    .await
                    .and_then(|bytes| OzTractSet::from_json(&bytes));

                match result {
                    Ok(set) => {
                        info!("Loaded {} OZ GEOIDs for lookup", set.len());
                        Ok(Arc::new(set))
                    }
                    Err(e) => {
                        error!("Failed to initialize OZ checker: {}", e);
                        Err(e)
                    }
                }
            })
            .await
            .cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// The loaded table, or [`CheckError::Uninitialized`].
    pub fn loaded(&self) -> CheckResult<&Arc<OzTractSet>> {
        self.cell.get().ok_or(CheckError::Uninitialized)
    }

    /// Test whether a GEOID is an Opportunity Zone tract.
    ///
    /// Fails with [`CheckError::Uninitialized`] before a successful
    /// [`initialize`](Self::initialize); it never answers `false` for an
    /// unloaded table.
    pub fn is_member(&self, geoid: &str) -> CheckResult<bool> {
        Ok(self.loaded()?.contains(geoid))
    }

    pub fn stats(&self) -> TractStats {
        match self.cell.get() {
            Some(set) => TractStats {
                total_oz_tracts: set.len(),
                loaded: true,
                sample_geoids: set.geoids().iter().take(SAMPLE_SIZE).cloned().collect(),
            },
            None => TractStats::unloaded(),
        }
    }

    /// Drop the loaded table. The next `initialize` fetches it again.
    pub fn dispose(&mut self) {
        if self.cell.take().is_some() {
            info!("Released OZ GEOID lookup data");
        }
    }
}

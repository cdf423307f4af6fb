//! Tooling for the GEOID lookup resource.
//!
//! The lookup table is derived from the Opportunity Zone GeoJSON published
//! by the CDFI Fund: every feature carries its tract in
//! `properties.GEOID10`. These helpers extract that list, compare it with an
//! existing lookup file and write the minimal `{ "geoids": [...] }` resource.

use std::collections::BTreeSet;
use std::io::{Read, Write};

use serde::Deserialize;
use thiserror::Error;

use crate::lookup::GeoidFile;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<Properties>,
}

#[derive(Debug, Deserialize)]
struct Properties {
    #[serde(rename = "GEOID10", default)]
    geoid10: Option<GeoidValue>,
}

/// GEOID10 is a string in most exports, a bare number in some.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeoidValue {
    Text(String),
    Number(serde_json::Number),
}

impl GeoidValue {
    fn normalized(self) -> Option<String> {
        let raw = match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        };
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

/// GEOIDs found in a GeoJSON feature collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedGeoids {
    pub feature_count: usize,
    /// Unique, sorted.
    pub geoids: BTreeSet<String>,
}

/// Read `features[].properties.GEOID10` from a GeoJSON document.
pub fn extract_geoids<R: Read>(reader: R) -> Result<ExtractedGeoids, DataError> {
    let collection: FeatureCollection = serde_json::from_reader(reader)?;
    let feature_count = collection.features.len();
    let geoids = collection
        .features
        .into_iter()
        .filter_map(|f| f.properties?.geoid10?.normalized())
        .collect();

    Ok(ExtractedGeoids {
        feature_count,
        geoids,
    })
}

/// Set difference between a lookup file and a full GeoJSON export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoidComparison {
    /// Entries in the lookup file (duplicates included).
    pub checker_count: usize,
    pub in_both: BTreeSet<String>,
    pub only_in_checker: BTreeSet<String>,
    pub only_in_full: BTreeSet<String>,
}

impl GeoidComparison {
    /// Same GEOID set, and no duplicates in the lookup file.
    pub fn is_identical(&self) -> bool {
        self.only_in_checker.is_empty()
            && self.only_in_full.is_empty()
            && self.checker_count == self.in_both.len()
    }
}

/// Compare the lookup file's GEOIDs against a full list.
pub fn compare<'a, C>(checker: C, full: &BTreeSet<String>) -> GeoidComparison
where
    C: IntoIterator<Item = &'a String>,
{
    let mut checker_count = 0;
    let mut checker_set = BTreeSet::new();
    for geoid in checker {
        checker_count += 1;
        checker_set.insert(geoid.clone());
    }

    GeoidComparison {
        checker_count,
        in_both: checker_set.intersection(full).cloned().collect(),
        only_in_checker: checker_set.difference(full).cloned().collect(),
        only_in_full: full.difference(&checker_set).cloned().collect(),
    }
}

/// Write the `{ "geoids": [...] }` lookup resource.
pub fn write_minimal<'a, I, W>(geoids: I, writer: W) -> Result<(), DataError>
where
    I: IntoIterator<Item = &'a String>,
    W: Write,
{
    let file = GeoidFile {
        geoids: geoids.into_iter().cloned().collect(),
    };
    serde_json::to_writer(writer, &file)?;
    Ok(())
}

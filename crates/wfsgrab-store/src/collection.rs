//! GeoJSON FeatureCollection encoding shared by the sink and chunk files.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;
use crate::naming::crs_urn;

#[derive(Debug, Serialize)]
struct FeatureCollectionOut<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    crs: Option<NamedCrs>,
    features: &'a [Value],
}

#[derive(Debug, Serialize)]
struct NamedCrs {
    #[serde(rename = "type")]
    kind: &'static str,
    properties: CrsProperties,
}

#[derive(Debug, Serialize)]
struct CrsProperties {
    name: String,
}

#[derive(Debug, Deserialize)]
struct FeatureCollectionIn {
    #[serde(default)]
    features: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct FeatureCount {
    #[serde(default)]
    features: Option<Vec<IgnoredAny>>,
}

/// Serializes `features` as a FeatureCollection.
///
/// `crs`, when given, is written as a named CRS member; it is a declaration
/// only and nothing is reprojected.
pub fn write_feature_collection<W: Write>(
    writer: W,
    name: Option<&str>,
    crs: Option<&str>,
    features: &[Value],
) -> serde_json::Result<()> {
    let collection = FeatureCollectionOut {
        kind: "FeatureCollection",
        name,
        crs: crs.map(|crs| NamedCrs {
            kind: "name",
            properties: CrsProperties { name: crs_urn(crs) },
        }),
        features,
    };
    serde_json::to_writer(writer, &collection)
}

/// Writes a bare FeatureCollection to `path`, creating or truncating it.
pub fn write_features(path: &Path, features: &[Value]) -> Result<(), StoreError> {
    let file = File::create(path).map_err(|error| StoreError::io(path, error))?;
    let mut writer = BufWriter::new(file);
    write_feature_collection(&mut writer, None, None, features)
        .map_err(|error| StoreError::serialization(path, error))?;
    writer.flush().map_err(|error| StoreError::io(path, error))
}

/// Reads every feature of the collection stored at `path`.
pub fn read_features(path: &Path) -> Result<Vec<Value>, StoreError> {
    let file = File::open(path).map_err(|error| StoreError::io(path, error))?;
    let collection: FeatureCollectionIn = serde_json::from_reader(BufReader::new(file))
        .map_err(|error| StoreError::serialization(path, error))?;
    Ok(collection.features.unwrap_or_default())
}

/// Counts the features stored at `path` without keeping them in memory.
pub fn count_features(path: &Path) -> Result<u64, StoreError> {
    let file = File::open(path).map_err(|error| StoreError::io(path, error))?;
    let counted: FeatureCount = serde_json::from_reader(BufReader::new(file))
        .map_err(|error| StoreError::serialization(path, error))?;
    Ok(counted.features.map_or(0, |features| features.len() as u64))
}

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::collection::{count_features, write_feature_collection};
use crate::error::StoreError;
use crate::naming::{local_layer_name, output_stem};

const OUTPUT_EXTENSION: &str = "geojson";

/// Persistence boundary for assembled layers.
pub trait FeatureSink: Send + Sync {
    /// Stores the full, ordered feature set of `layer`, replacing any
    /// previous output for it. Returns where the output now lives.
    fn write(&self, layer: &str, features: &[Value], target_crs: &str)
        -> Result<PathBuf, StoreError>;

    /// Number of features persisted for `layer`, or `None` when nothing has
    /// been written for it yet.
    fn read_count(&self, layer: &str) -> Result<Option<u64>, StoreError>;
}

/// Writes one GeoJSON FeatureCollection per layer into a directory.
#[derive(Debug, Clone)]
pub struct GeoJsonSink {
    output_dir: PathBuf,
}

impl GeoJsonSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn output_path(&self, layer: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{OUTPUT_EXTENSION}", output_stem(layer)))
    }
}

impl FeatureSink for GeoJsonSink {
    fn write(
        &self,
        layer: &str,
        features: &[Value],
        target_crs: &str,
    ) -> Result<PathBuf, StoreError> {
        std::fs::create_dir_all(&self.output_dir)
            .map_err(|error| StoreError::io(&self.output_dir, error))?;

        let path = self.output_path(layer);

        // Written next to the target so the final rename stays on one filesystem.
        let mut staged = NamedTempFile::new_in(&self.output_dir)
            .map_err(|error| StoreError::io(&self.output_dir, error))?;
        {
            let mut writer = BufWriter::new(staged.as_file_mut());
            write_feature_collection(
                &mut writer,
                Some(local_layer_name(layer)),
                Some(target_crs),
                features,
            )
            .map_err(|error| StoreError::serialization(&path, error))?;
            writer
                .flush()
                .map_err(|error| StoreError::io(&path, error))?;
        }

        staged.persist(&path).map_err(|error| StoreError::Persist {
            path: path.clone(),
            source: error.error,
        })?;

        debug!(layer, path = %path.display(), features = features.len(), "output written");
        Ok(path)
    }

    fn read_count(&self, layer: &str) -> Result<Option<u64>, StoreError> {
        let path = self.output_path(layer);
        if !path.exists() {
            return Ok(None);
        }
        count_features(&path).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn output_path_is_derived_from_layer_name() {
        let sink = GeoJsonSink::new("/data/out");
        assert_eq!(
            sink.output_path("govmap:parcels"),
            PathBuf::from("/data/out/govmap_parcels.geojson")
        );
    }

    #[test]
    fn missing_output_reports_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = GeoJsonSink::new(dir.path());

        assert_eq!(sink.read_count("ns:absent").expect("read"), None);
    }

    #[test]
    fn written_layer_reports_its_count() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = GeoJsonSink::new(dir.path().join("nested"));
        let features: Vec<Value> = (0..3).map(|id| json!({"id": id})).collect();

        let path = sink.write("ns:roads", &features, "EPSG:3857").expect("write");

        assert!(path.ends_with("ns_roads.geojson"));
        assert_eq!(sink.read_count("ns:roads").expect("read"), Some(3));
    }

    #[test]
    fn rewrite_replaces_previous_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = GeoJsonSink::new(dir.path());
        let first: Vec<Value> = (0..10).map(|id| json!({"id": id})).collect();
        let second: Vec<Value> = (0..4).map(|id| json!({"id": id})).collect();

        sink.write("ns:roads", &first, "EPSG:3857").expect("first write");
        sink.write("ns:roads", &second, "EPSG:3857").expect("second write");

        assert_eq!(sink.read_count("ns:roads").expect("read"), Some(4));
        let leftovers = std::fs::read_dir(dir.path()).expect("list").count();
        assert_eq!(leftovers, 1, "staging files must not be left behind");
    }

    #[test]
    fn corrupt_output_surfaces_as_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = GeoJsonSink::new(dir.path());
        std::fs::write(sink.output_path("ns:roads"), "garbage").expect("write");

        assert!(sink.read_count("ns:roads").is_err());
    }
}

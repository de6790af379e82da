use tracing::{info, warn};

use wfsgrab_store::FeatureSink;

use crate::domain::LayerName;

/// Whether a previous run already persisted exactly `expected` features for
/// `layer`.
///
/// Missing or unreadable output counts as incomplete, so the layer is
/// downloaded again; read errors are logged and never propagated.
pub fn is_complete(sink: &dyn FeatureSink, layer: &LayerName, expected: u64) -> bool {
    match sink.read_count(layer.as_str()) {
        Ok(Some(actual)) if actual == expected => {
            info!(%layer, actual, "existing output matches upstream count, skipping");
            true
        }
        Ok(Some(actual)) => {
            info!(%layer, actual, expected, "existing output is stale, re-downloading");
            false
        }
        Ok(None) => false,
        Err(error) => {
            warn!(%layer, %error, "could not read existing output");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::Value;
    use wfsgrab_store::{GeoJsonSink, StoreError};

    use super::*;

    struct UnreadableSink;

    impl FeatureSink for UnreadableSink {
        fn write(&self, _: &str, _: &[Value], _: &str) -> Result<PathBuf, StoreError> {
            unreachable!("existing-output check never writes")
        }

        fn read_count(&self, layer: &str) -> Result<Option<u64>, StoreError> {
            let path = PathBuf::from(format!("{layer}.geojson"));
            let source = serde_json::from_str::<Value>("{").expect_err("truncated json");
            Err(StoreError::Serialization { path, source })
        }
    }

    fn layer() -> LayerName {
        LayerName::parse("ns:roads").expect("valid layer")
    }

    #[test]
    fn exact_match_is_complete() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = GeoJsonSink::new(dir.path());
        let features: Vec<Value> = (0..4).map(|id| serde_json::json!({ "id": id })).collect();
        sink.write("ns:roads", &features, "EPSG:3857").expect("write");

        assert!(is_complete(&sink, &layer(), 4));
        assert!(!is_complete(&sink, &layer(), 5));
    }

    #[test]
    fn missing_output_is_incomplete() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = GeoJsonSink::new(dir.path());

        assert!(!is_complete(&sink, &layer(), 0));
    }

    #[test]
    fn read_error_is_incomplete() {
        assert!(!is_complete(&UnreadableSink, &layer(), 10));
    }
}

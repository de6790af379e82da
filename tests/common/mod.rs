//! Shared fixtures for the behavior tests: a scripted upstream and sinks with
//! controllable failures.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde_json::{json, Value};
use wfsgrab_core::{
    FeaturePage, FeatureSink, FeatureSource, GeoJsonSink, HarvestConfig, LayerName, PageRequest,
    SourceError, SourceFuture, StoreError, Window,
};

/// In-process upstream whose answers are scripted per layer and window.
///
/// Every record is `{"id": <offset>}`, so ordering and completeness can be
/// checked from the ids alone.
#[derive(Default)]
pub struct ScriptedSource {
    totals: HashMap<String, Option<u64>>,
    count_failures: Vec<String>,
    timeouts: Mutex<HashMap<Window, u32>>,
    timeout_zones: Vec<Window>,
    unreachable: Vec<Window>,
    page_calls: Mutex<Vec<PageRequest>>,
    count_calls: Mutex<u64>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, layer: &str, total: u64) -> Self {
        self.totals.insert(layer.to_owned(), Some(total));
        self
    }

    /// Count query answers without a usable total.
    pub fn with_unknown_total(mut self, layer: &str) -> Self {
        self.totals.insert(layer.to_owned(), None);
        self
    }

    /// Count query fails outright.
    pub fn with_count_failure(mut self, layer: &str) -> Self {
        self.count_failures.push(layer.to_owned());
        self
    }

    /// `window`, requested exactly, times out `times` times before answering.
    pub fn timing_out(self, window: Window, times: u32) -> Self {
        self.timeouts
            .lock()
            .expect("lock")
            .insert(window, times);
        self
    }

    /// Any request lying inside `zone` times out, whatever its size.
    pub fn always_timing_out(mut self, zone: Window) -> Self {
        self.timeout_zones.push(zone);
        self
    }

    /// `window`, requested exactly, fails with a connection error.
    pub fn unreachable(mut self, window: Window) -> Self {
        self.unreachable.push(window);
        self
    }

    pub fn page_calls(&self) -> Vec<Window> {
        self.page_calls
            .lock()
            .expect("lock")
            .iter()
            .map(|request| request.window)
            .collect()
    }

    pub fn page_call_count(&self) -> usize {
        self.page_calls.lock().expect("lock").len()
    }

    pub fn page_calls_for(&self, layer: &str) -> usize {
        self.page_calls
            .lock()
            .expect("lock")
            .iter()
            .filter(|request| request.layer.as_str() == layer)
            .count()
    }

    pub fn count_call_count(&self) -> u64 {
        *self.count_calls.lock().expect("lock")
    }

    fn answer(&self, request: &PageRequest) -> Result<FeaturePage, SourceError> {
        let window = request.window;
        if self
            .timeout_zones
            .iter()
            .any(|zone| window.start >= zone.start && window.end() <= zone.end())
        {
            return Err(SourceError::timeout(format!("read timed out for {window}")));
        }

        if let Some(remaining) = self.timeouts.lock().expect("lock").get_mut(&window) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(SourceError::timeout(format!("read timed out for {window}")));
            }
        }

        if self.unreachable.contains(&window) {
            return Err(SourceError::connect("connection refused"));
        }

        let total = self
            .totals
            .get(request.layer.as_str())
            .copied()
            .flatten()
            .unwrap_or(0);
        let end = window.end().min(total);
        Ok(FeaturePage::new(
            (window.start..end).map(|id| json!({ "id": id })).collect(),
        ))
    }
}

impl FeatureSource for ScriptedSource {
    fn count_features<'a>(&'a self, layer: &'a LayerName) -> SourceFuture<'a, Option<u64>> {
        Box::pin(async move {
            *self.count_calls.lock().expect("lock") += 1;
            if self.count_failures.iter().any(|name| name == layer.as_str()) {
                return Err(SourceError::rejected("status 503 Service Unavailable"));
            }
            Ok(self.totals.get(layer.as_str()).copied().flatten())
        })
    }

    fn fetch_page<'a>(&'a self, request: &'a PageRequest) -> SourceFuture<'a, FeaturePage> {
        Box::pin(async move {
            self.page_calls.lock().expect("lock").push(request.clone());
            self.answer(request)
        })
    }

    fn page_url(&self, request: &PageRequest) -> String {
        format!(
            "https://wfs.test/wfs?typeNames={}&startIndex={}&count={}",
            request.layer, request.window.start, request.window.count
        )
    }
}

/// GeoJSON sink that refuses to write the listed layers.
pub struct FlakySink {
    inner: GeoJsonSink,
    refuse: Vec<String>,
}

impl FlakySink {
    pub fn new(inner: GeoJsonSink, refuse: &[&str]) -> Self {
        Self {
            inner,
            refuse: refuse.iter().map(|layer| (*layer).to_owned()).collect(),
        }
    }
}

impl FeatureSink for FlakySink {
    fn write(&self, layer: &str, features: &[Value], target_crs: &str) -> Result<PathBuf, StoreError> {
        if self.refuse.iter().any(|name| name == layer) {
            return Err(StoreError::Io {
                path: self.inner.output_path(layer),
                source: std::io::Error::other("disk full"),
            });
        }
        self.inner.write(layer, features, target_crs)
    }

    fn read_count(&self, layer: &str) -> Result<Option<u64>, StoreError> {
        self.inner.read_count(layer)
    }
}

pub fn layer(name: &str) -> LayerName {
    LayerName::parse(name).expect("valid layer name")
}

/// Config with no delays, writing under `output_dir`.
pub fn quick_config(output_dir: impl Into<PathBuf>) -> HarvestConfig {
    HarvestConfig {
        chunk_delay_ms: 0,
        layer_delay_ms: 0,
        output_dir: output_dir.into(),
        ..HarvestConfig::default()
    }
}

/// Ids of `features`, in order.
pub fn ids(features: &[Value]) -> Vec<u64> {
    features
        .iter()
        .map(|feature| feature["id"].as_u64().expect("numeric id"))
        .collect()
}

/// True when `ids` is exactly `start, start+1, ..` with no gap or repeat.
pub fn is_contiguous_from(ids: &[u64], start: u64) -> bool {
    ids.iter()
        .enumerate()
        .all(|(index, id)| *id == start + index as u64)
}

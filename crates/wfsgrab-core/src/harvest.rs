//! Run driver over a list of layers.

use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{error, info};
use uuid::Uuid;

use wfsgrab_store::{FeatureSink, GeoJsonSink};

use crate::adapters::WfsSource;
use crate::config::HarvestConfig;
use crate::counter::{LayerCount, LayerCounter};
use crate::domain::LayerName;
use crate::downloader::LayerDownloader;
use crate::error::CoreError;
use crate::feature_source::FeatureSource;
use crate::http_client::ReqwestHttpClient;
use crate::outcome::{LayerOutcome, LayerReport, RunReport};

/// Upstream total for one layer, as reported by `count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerTotal {
    pub layer: LayerName,
    pub count: LayerCount,
}

/// Drives layers one after another against a source and a sink.
pub struct Harvester {
    source: Arc<dyn FeatureSource>,
    sink: Arc<dyn FeatureSink>,
    config: HarvestConfig,
}

impl Harvester {
    pub fn new(
        source: Arc<dyn FeatureSource>,
        sink: Arc<dyn FeatureSink>,
        config: HarvestConfig,
    ) -> Self {
        Self {
            source,
            sink,
            config,
        }
    }

    /// WFS over reqwest into a GeoJSON directory, both taken from `config`.
    pub fn from_config(config: HarvestConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let http_client = Arc::new(ReqwestHttpClient::new()?);
        let source = Arc::new(WfsSource::from_config(&config, http_client));
        let sink = Arc::new(GeoJsonSink::new(config.output_dir.clone()));
        Ok(Self::new(source, sink, config))
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Processes `layers` in order. A layer that fails is reported and the
    /// run moves on.
    pub async fn run(&self, layers: &[LayerName]) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = OffsetDateTime::now_utc();
        let pacing = self.config.pacing();
        info!(%run_id, layers = layers.len(), "harvest started");

        let downloader = LayerDownloader::new(&*self.source, &*self.sink, &self.config);
        let mut reports = Vec::with_capacity(layers.len());

        for (index, layer) in layers.iter().enumerate() {
            if index > 0 {
                pacing.pause_between_layers().await;
            }

            let outcome = match downloader.download(layer).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(%layer, error = %err, "error processing layer");
                    LayerOutcome::Failed {
                        expected: err.expected(),
                        collected: err.collected(),
                        error: err.to_string(),
                    }
                }
            };
            reports.push(LayerReport {
                layer: layer.clone(),
                outcome,
            });
        }

        let report = RunReport::new(run_id, started_at, OffsetDateTime::now_utc(), reports);
        info!(
            %run_id,
            complete = report.totals.complete,
            partial = report.totals.partial_with_gaps,
            skipped = report.totals.skipped,
            failed = report.totals.failed,
            "harvest finished"
        );
        report
    }

    /// Upstream totals only; nothing is fetched or written.
    pub async fn count(&self, layers: &[LayerName]) -> Vec<LayerTotal> {
        let counter = LayerCounter::new(&*self.source);
        let mut totals = Vec::with_capacity(layers.len());
        for layer in layers {
            totals.push(LayerTotal {
                layer: layer.clone(),
                count: counter.count(layer).await,
            });
        }
        totals
    }
}

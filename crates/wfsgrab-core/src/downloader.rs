//! One layer, end to end: count, skip check, paged fetch, assembly, persist.

use std::pin::pin;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

use wfsgrab_store::FeatureSink;

use crate::assembly::Assembly;
use crate::config::HarvestConfig;
use crate::counter::{LayerCount, LayerCounter};
use crate::domain::{coalesce, LayerName, UnresolvedRange, Window};
use crate::error::DownloadError;
use crate::existing::is_complete;
use crate::feature_source::{FeatureSource, PageRequest};
use crate::fetcher::AdaptiveFetcher;
use crate::outcome::{DownloadSummary, LayerOutcome, SkipReason};

pub struct LayerDownloader<'a> {
    source: &'a dyn FeatureSource,
    sink: &'a dyn FeatureSink,
    config: &'a HarvestConfig,
}

#[derive(Default)]
struct Tally {
    unresolved: Vec<Window>,
    empty: Vec<Window>,
    rejected: Vec<Window>,
    calls: u64,
}

impl<'a> LayerDownloader<'a> {
    pub fn new(
        source: &'a dyn FeatureSource,
        sink: &'a dyn FeatureSink,
        config: &'a HarvestConfig,
    ) -> Self {
        Self {
            source,
            sink,
            config,
        }
    }

    /// Downloads `layer` and persists whatever could be collected.
    ///
    /// Upstream trouble shows up in the returned outcome; only a failed sink
    /// write is an error.
    pub async fn download(&self, layer: &LayerName) -> Result<LayerOutcome, DownloadError> {
        info!(%layer, "processing layer");

        let expected = match LayerCounter::new(self.source).count(layer).await {
            LayerCount::Known(0) => {
                warn!(%layer, "no features found, skipping");
                return Ok(LayerOutcome::Skipped {
                    reason: SkipReason::NoFeatures,
                });
            }
            LayerCount::Known(total) => total,
            LayerCount::Unavailable(detail) => {
                warn!(%layer, %detail, "feature count unavailable, skipping");
                return Ok(LayerOutcome::Skipped {
                    reason: SkipReason::CountUnavailable { detail },
                });
            }
        };

        if !self.config.force_overwrite && is_complete(self.sink, layer, expected) {
            return Ok(LayerOutcome::Skipped {
                reason: SkipReason::AlreadyComplete { count: expected },
            });
        }

        let windows = Window::partition(expected, self.config.chunk_size);
        let window_count = windows.remaining();
        info!(
            %layer,
            expected,
            windows = window_count,
            chunk_size = self.config.chunk_size,
            "downloading"
        );

        let fetcher = AdaptiveFetcher::new(self.source, self.config.shrink_policy());
        let fetcher = &fetcher;
        let pacing = self.config.pacing();
        let mut results = pin!(stream::iter(windows.zip(1..))
            .map(move |(window, position)| async move {
                let result = fetcher.fetch(layer, window).await;
                if position < window_count {
                    pacing.pause_after_window().await;
                }
                (window, result)
            })
            .buffered(pacing.max_concurrent_windows));

        let mut assembly = Assembly::new(layer.clone(), self.config.spool_dir.clone());
        let mut tally = Tally::default();

        while let Some((window, result)) = results.next().await {
            match result {
                Ok(fetch) => {
                    debug!(
                        %layer,
                        %window,
                        records = fetch.len(),
                        calls = fetch.calls,
                        depth = fetch.max_depth,
                        "window done"
                    );
                    tally.calls += fetch.calls;
                    tally.unresolved.extend(fetch.unresolved);
                    tally.empty.extend(fetch.empty);
                    tally.rejected.extend(fetch.rejected);
                    assembly.push(window, fetch.features);
                }
                Err(error) => {
                    error!(%layer, %window, %error, "upstream unreachable, window left unresolved");
                    tally.calls += 1;
                    tally.unresolved.push(window);
                }
            }
            info!(%layer, collected = assembly.collected(), expected, "progress");
        }

        let assembled = assembly.finish();
        tally.unresolved.extend(assembled.lost);
        let features = assembled.features;
        let collected = features.len() as u64;

        let unresolved: Vec<UnresolvedRange> = coalesce(tally.unresolved)
            .into_iter()
            .map(|window| UnresolvedRange {
                start: window.start,
                count: window.count,
                refetch_url: self
                    .source
                    .page_url(&PageRequest::new(layer.clone(), window)),
            })
            .collect();

        let output = if features.is_empty() {
            warn!(%layer, "no features collected, nothing written");
            None
        } else {
            let path = self
                .sink
                .write(layer.as_str(), &features, &self.config.target_crs)
                .map_err(|source| DownloadError::Sink {
                    expected,
                    collected,
                    source,
                })?;
            info!(%layer, collected, path = %path.display(), "layer saved");
            Some(path)
        };

        for window in &tally.empty {
            warn!(%layer, %window, "window returned no features");
        }
        for window in &tally.rejected {
            warn!(%layer, %window, "window failed and was treated as empty");
        }
        if !unresolved.is_empty() {
            warn!(%layer, ranges = unresolved.len(), "layer has missing ranges");
            for range in &unresolved {
                warn!(
                    %layer,
                    start = range.start,
                    count = range.count,
                    url = %range.refetch_url,
                    "missing range"
                );
            }
        }

        let summary = DownloadSummary {
            layer: layer.clone(),
            expected,
            collected,
            unresolved,
            empty_windows: tally.empty,
            rejected_windows: tally.rejected,
            fetch_calls: tally.calls,
            output,
        };
        let outcome = LayerOutcome::from_summary(summary);
        info!(%layer, status = outcome.label(), collected, expected, "layer finished");
        Ok(outcome)
    }
}

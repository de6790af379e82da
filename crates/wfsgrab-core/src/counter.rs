//! Upstream totals per layer.

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::LayerName;
use crate::feature_source::FeatureSource;

/// Result of asking upstream how many features a layer has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LayerCount {
    Known(u64),
    /// The count query failed or carried no total.
    Unavailable(String),
}

impl LayerCount {
    /// Total with a lossy fallback: unavailable counts as 0.
    pub fn total(&self) -> u64 {
        match self {
            Self::Known(total) => *total,
            Self::Unavailable(_) => 0,
        }
    }
}

/// Asks a [`FeatureSource`] for layer totals.
pub struct LayerCounter<'a> {
    source: &'a dyn FeatureSource,
}

impl<'a> LayerCounter<'a> {
    pub fn new(source: &'a dyn FeatureSource) -> Self {
        Self { source }
    }

    /// Never fails: problems are logged and reported as
    /// [`LayerCount::Unavailable`].
    pub async fn count(&self, layer: &LayerName) -> LayerCount {
        match self.source.count_features(layer).await {
            Ok(Some(total)) => {
                info!(%layer, total, "feature count");
                LayerCount::Known(total)
            }
            Ok(None) => {
                warn!(%layer, "numberMatched missing from count response");
                LayerCount::Unavailable(String::from(
                    "count response carried no numberMatched total",
                ))
            }
            Err(error) => {
                warn!(%layer, %error, "failed to get feature count");
                LayerCount::Unavailable(error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_source::{FeaturePage, PageRequest, SourceError, SourceFuture};

    struct FixedCount(Result<Option<u64>, SourceError>);

    impl FeatureSource for FixedCount {
        fn count_features<'a>(&'a self, _layer: &'a LayerName) -> SourceFuture<'a, Option<u64>> {
            Box::pin(async move { self.0.clone() })
        }

        fn fetch_page<'a>(&'a self, _request: &'a PageRequest) -> SourceFuture<'a, FeaturePage> {
            Box::pin(async { Ok(FeaturePage::default()) })
        }

        fn page_url(&self, _request: &PageRequest) -> String {
            String::new()
        }
    }

    async fn count(answer: Result<Option<u64>, SourceError>) -> LayerCount {
        let source = FixedCount(answer);
        let layer = LayerName::parse("ns:roads").expect("valid");
        LayerCounter::new(&source).count(&layer).await
    }

    #[tokio::test]
    async fn known_total_is_passed_through() {
        assert_eq!(count(Ok(Some(48_213))).await, LayerCount::Known(48_213));
    }

    #[tokio::test]
    async fn missing_total_and_failures_are_unavailable() {
        let missing = count(Ok(None)).await;
        let failed = count(Err(SourceError::timeout("slow"))).await;

        assert!(matches!(missing, LayerCount::Unavailable(_)));
        assert!(matches!(failed, LayerCount::Unavailable(ref detail) if detail.contains("slow")));
        assert_eq!(failed.total(), 0);
    }
}

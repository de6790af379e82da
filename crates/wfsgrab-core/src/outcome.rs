//! Per-layer and per-run results.

use std::path::PathBuf;

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::{LayerName, UnresolvedRange, Window};

/// What a layer download produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadSummary {
    /// Carried by the enclosing [`LayerReport`] when serialized.
    #[serde(skip_serializing)]
    pub layer: LayerName,
    /// Total advertised by upstream before paging started.
    pub expected: u64,
    pub collected: u64,
    /// Coalesced ranges that never yielded data.
    pub unresolved: Vec<UnresolvedRange>,
    /// Windows upstream answered with an empty page.
    pub empty_windows: Vec<Window>,
    /// Windows upstream refused or answered unreadably; counted as empty.
    pub rejected_windows: Vec<Window>,
    pub fetch_calls: u64,
    pub output: Option<PathBuf>,
}

impl DownloadSummary {
    pub fn missing(&self) -> u64 {
        self.expected.saturating_sub(self.collected)
    }

    pub fn unresolved_records(&self) -> u64 {
        self.unresolved.iter().map(|range| range.count).sum()
    }

    pub fn is_gap_free(&self) -> bool {
        self.unresolved.is_empty() && self.collected == self.expected
    }
}

/// Why a layer was not downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Persisted output already holds the upstream total.
    AlreadyComplete { count: u64 },
    /// Upstream reports zero features.
    NoFeatures,
    /// The total could not be determined.
    CountUnavailable { detail: String },
}

/// Tagged per-layer result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LayerOutcome {
    Complete(DownloadSummary),
    PartialWithGaps(DownloadSummary),
    Skipped {
        reason: SkipReason,
    },
    Failed {
        expected: u64,
        collected: u64,
        error: String,
    },
}

impl LayerOutcome {
    pub fn from_summary(summary: DownloadSummary) -> Self {
        if summary.is_gap_free() {
            Self::Complete(summary)
        } else {
            Self::PartialWithGaps(summary)
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Complete(_) => "complete",
            Self::PartialWithGaps(_) => "partial_with_gaps",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn summary(&self) -> Option<&DownloadSummary> {
        match self {
            Self::Complete(summary) | Self::PartialWithGaps(summary) => Some(summary),
            Self::Skipped { .. } | Self::Failed { .. } => None,
        }
    }

    /// True when a re-run could recover more data for this layer.
    pub const fn needs_attention(&self) -> bool {
        matches!(self, Self::PartialWithGaps(_) | Self::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerReport {
    pub layer: LayerName,
    #[serde(flatten)]
    pub outcome: LayerOutcome,
}

/// Counts of layer outcomes in a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunTotals {
    pub complete: usize,
    pub partial_with_gaps: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Everything a harvest run did, in layer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
    pub totals: RunTotals,
    pub layers: Vec<LayerReport>,
}

impl RunReport {
    pub fn new(
        run_id: Uuid,
        started_at: OffsetDateTime,
        finished_at: OffsetDateTime,
        layers: Vec<LayerReport>,
    ) -> Self {
        let mut totals = RunTotals::default();
        for report in &layers {
            match report.outcome {
                LayerOutcome::Complete(_) => totals.complete += 1,
                LayerOutcome::PartialWithGaps(_) => totals.partial_with_gaps += 1,
                LayerOutcome::Skipped { .. } => totals.skipped += 1,
                LayerOutcome::Failed { .. } => totals.failed += 1,
            }
        }

        Self {
            run_id,
            started_at,
            finished_at,
            totals,
            layers,
        }
    }

    pub fn has_gaps(&self) -> bool {
        self.layers
            .iter()
            .any(|report| report.outcome.needs_attention())
    }
}

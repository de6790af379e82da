//! Adaptive window fetching.
//!
//! A window that times out is re-requested as ten consecutive pieces, each of
//! which may in turn be split again, until either a piece succeeds or the
//! [`ShrinkPolicy`] floor is reached. The work is driven by an explicit stack
//! rather than recursion; pieces are pushed in reverse so they are issued, and
//! their records concatenated, in ascending offset order.

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::domain::{LayerName, Window};
use crate::feature_source::{FeatureSource, PageRequest, SourceError, SourceErrorKind};
use crate::shrink::ShrinkPolicy;

/// Everything learned while fetching one top-level window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowFetch {
    pub window: Window,
    /// Records in ascending offset order.
    pub features: Vec<Value>,
    /// Pieces that still timed out at the floor size, or whose upstream was
    /// unreachable.
    pub unresolved: Vec<Window>,
    /// Pieces for which upstream explicitly returned no records.
    pub empty: Vec<Window>,
    /// Pieces upstream refused or answered with garbage; treated as empty.
    pub rejected: Vec<Window>,
    /// Upstream page calls issued, the first attempt included.
    pub calls: u64,
    /// Deepest shrink level reached; 0 when the first attempt settled it.
    pub max_depth: u32,
}

impl WindowFetch {
    fn new(window: Window) -> Self {
        Self {
            window,
            features: Vec::new(),
            unresolved: Vec::new(),
            empty: Vec::new(),
            rejected: Vec::new(),
            calls: 0,
            max_depth: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Shrink-and-retry over a [`FeatureSource`] for one window at a time.
pub struct AdaptiveFetcher<'a> {
    source: &'a dyn FeatureSource,
    policy: ShrinkPolicy,
}

impl<'a> AdaptiveFetcher<'a> {
    pub fn new(source: &'a dyn FeatureSource, policy: ShrinkPolicy) -> Self {
        Self { source, policy }
    }

    pub fn policy(&self) -> ShrinkPolicy {
        self.policy
    }

    /// Fetches `window`, shrinking on timeouts.
    ///
    /// Returns `Err` only when the very first request finds the upstream
    /// unreachable; the caller decides what that means for the window. Every
    /// other failure is absorbed into the returned [`WindowFetch`].
    pub async fn fetch(&self, layer: &LayerName, window: Window) -> Result<WindowFetch, SourceError> {
        let mut fetch = WindowFetch::new(window);
        let mut pending = vec![(window, 0_u32)];

        while let Some((current, depth)) = pending.pop() {
            fetch.calls += 1;
            fetch.max_depth = fetch.max_depth.max(depth);

            let request = PageRequest::new(layer.clone(), current);
            match self.source.fetch_page(&request).await {
                Ok(page) => {
                    if page.is_empty() {
                        debug!(%layer, window = %current, "upstream returned no features");
                        fetch.empty.push(current);
                    }
                    fetch.features.extend(page.features);
                }
                Err(err) if err.is_timeout() => match self.policy.shrink(current) {
                    Some(pieces) => {
                        warn!(
                            %layer,
                            window = %current,
                            piece_size = self.policy.piece_size(current.count),
                            depth,
                            "timeout, retrying in smaller pieces"
                        );
                        pending.extend(pieces.into_iter().rev().map(|piece| (piece, depth + 1)));
                    }
                    None => {
                        error!(
                            %layer,
                            window = %current,
                            min_chunk = self.policy.min_chunk,
                            "minimum chunk size reached, skipping"
                        );
                        fetch.unresolved.push(current);
                    }
                },
                Err(err) if err.kind() == SourceErrorKind::Connect => {
                    if depth == 0 {
                        return Err(err);
                    }
                    error!(%layer, window = %current, error = %err, "missing piece, upstream unreachable");
                    fetch.unresolved.push(current);
                }
                Err(err) => {
                    error!(%layer, window = %current, error = %err, "failed to fetch window, treating as empty");
                    fetch.rejected.push(current);
                }
            }
        }

        Ok(fetch)
    }
}

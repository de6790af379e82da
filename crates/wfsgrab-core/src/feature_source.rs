//! Upstream contract and page request/response types.
//!
//! [`FeatureSource`] is the seam between the download algorithm and the
//! network: the fetcher and counter only ever talk to this trait, the WFS
//! adapter in [`crate::adapters`] implements it over HTTP, and tests swap in
//! scripted sources.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::domain::{LayerName, Window};

/// One paged data request. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub layer: LayerName,
    pub window: Window,
}

impl PageRequest {
    pub fn new(layer: LayerName, window: Window) -> Self {
        Self { layer, window }
    }
}

/// Ordered records returned for one window. May be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeaturePage {
    pub features: Vec<Value>,
}

impl FeaturePage {
    pub fn new(features: Vec<Value>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Upstream failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Upstream did not answer in time; worth retrying with a smaller window.
    Timeout,
    /// Upstream unreachable.
    Connect,
    /// Upstream answered with a non-success status.
    Rejected,
    /// Upstream answered with a body that could not be understood.
    Decode,
}

/// Structured upstream error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Timeout, message)
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Connect, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Rejected, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Decode, message)
    }

    fn new(kind: SourceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn is_timeout(&self) -> bool {
        matches!(self.kind, SourceErrorKind::Timeout)
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SourceError {}

pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Paginated feature feed.
///
/// Implementations issue exactly one upstream call per method invocation and
/// never retry; retry policy belongs to the caller.
pub trait FeatureSource: Send + Sync {
    /// Total number of features in `layer`, or `None` when the upstream
    /// answered without a usable total.
    fn count_features<'a>(&'a self, layer: &'a LayerName) -> SourceFuture<'a, Option<u64>>;

    /// Records of one window, ordered by the upstream sort key.
    fn fetch_page<'a>(&'a self, request: &'a PageRequest) -> SourceFuture<'a, FeaturePage>;

    /// Human-usable address of `request`, for re-fetching gaps by hand.
    fn page_url(&self, request: &PageRequest) -> String;
}

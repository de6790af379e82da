use thiserror::Error;

use wfsgrab_store::StoreError;

/// Input and configuration errors exposed by `wfsgrab-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("layer name cannot be empty")]
    EmptyLayerName,
    #[error("layer name contains invalid character {ch:?} at index {index}")]
    LayerNameInvalidChar { ch: char, index: usize },

    #[error("base_url cannot be empty")]
    EmptyBaseUrl,
    #[error("field '{field}' must be greater than zero")]
    ZeroValue { field: &'static str },
    #[error("min_chunk ({min_chunk}) cannot exceed chunk_size ({chunk_size})")]
    MinChunkAboveChunkSize { min_chunk: u64, chunk_size: u64 },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("invalid configuration file: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Failure that ends a single layer's download.
///
/// Upstream problems never produce this; they end up as unresolved ranges in
/// the layer summary instead.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("could not persist {collected} of {expected} features: {source}")]
    Sink {
        expected: u64,
        collected: u64,
        #[source]
        source: StoreError,
    },
}

impl DownloadError {
    pub const fn expected(&self) -> u64 {
        match self {
            Self::Sink { expected, .. } => *expected,
        }
    }

    pub const fn collected(&self) -> u64 {
        match self {
            Self::Sink { collected, .. } => *collected,
        }
    }
}

use std::path::PathBuf;

use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] wfsgrab_core::ValidationError),

    #[error(transparent)]
    Core(#[from] wfsgrab_core::CoreError),

    #[error("no layers given; pass layer names or --layers-file")]
    NoLayers,

    #[error("{path}:{line}: {message}")]
    LayerList {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("cannot open {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::NoLayers | Self::LayerList { .. } => 2,
            Self::Core(error) => match error {
                wfsgrab_core::CoreError::Validation(_) | wfsgrab_core::CoreError::Config(_) => 2,
                wfsgrab_core::CoreError::HttpClient(_) => 10,
            },
            Self::File { .. } | Self::Logging(_) | Self::Serialization(_) | Self::Io(_) => 10,
        }
    }
}

//! Run configuration.
//!
//! A [`HarvestConfig`] is built once (defaults, then an optional TOML file,
//! then CLI overrides), validated, and handed by value to the components that
//! need it. Nothing reads configuration from ambient state.
//!
//! ```toml
//! base_url = "https://maps.example.org/geoserver/wfs"
//! chunk_size = 1000
//! chunk_delay_ms = 250
//! force_overwrite = true
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, ValidationError};
use crate::pacing::Pacing;
use crate::shrink::ShrinkPolicy;

pub const DEFAULT_BASE_URL: &str = "https://www.govmap.gov.il/api/geoserver/wfs";

/// Every tunable of a harvest run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarvestConfig {
    /// WFS endpoint queried for counts and pages.
    pub base_url: String,
    pub wfs_version: String,
    /// Property used as `sortBy` so paging is deterministic.
    pub sort_by: String,
    /// Records requested per top-level window.
    pub chunk_size: u64,
    /// Smallest window the shrink retry will issue.
    pub min_chunk: u64,
    pub chunk_delay_ms: u64,
    pub layer_delay_ms: u64,
    pub page_timeout_ms: u64,
    pub count_timeout_ms: u64,
    /// Re-download even when the existing output already matches upstream.
    pub force_overwrite: bool,
    /// Windows of one layer allowed in flight at once; 1 keeps paging sequential.
    pub max_concurrent_windows: usize,
    /// CRS declared on the written output.
    pub target_crs: String,
    pub output_dir: PathBuf,
    /// When set, fetched windows are parked here as chunk files until assembly.
    pub spool_dir: Option<PathBuf>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            wfs_version: String::from("2.0.0"),
            sort_by: String::from("objectid"),
            chunk_size: 2_000,
            min_chunk: 1,
            chunk_delay_ms: 100,
            layer_delay_ms: 1_000,
            page_timeout_ms: 60_000,
            count_timeout_ms: 30_000,
            force_overwrite: false,
            max_concurrent_windows: 1,
            target_crs: String::from("EPSG:3857"),
            output_dir: PathBuf::from("output"),
            spool_dir: None,
        }
    }
}

impl HarvestConfig {
    /// Parses a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, CoreError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base_url.trim().is_empty() {
            return Err(ValidationError::EmptyBaseUrl);
        }

        let positive = [
            ("chunk_size", self.chunk_size),
            ("min_chunk", self.min_chunk),
            ("page_timeout_ms", self.page_timeout_ms),
            ("count_timeout_ms", self.count_timeout_ms),
            ("max_concurrent_windows", self.max_concurrent_windows as u64),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ValidationError::ZeroValue { field });
            }
        }

        if self.min_chunk > self.chunk_size {
            return Err(ValidationError::MinChunkAboveChunkSize {
                min_chunk: self.min_chunk,
                chunk_size: self.chunk_size,
            });
        }

        Ok(())
    }

    pub fn shrink_policy(&self) -> ShrinkPolicy {
        ShrinkPolicy::new(self.min_chunk)
    }

    pub fn pacing(&self) -> Pacing {
        Pacing::new(
            Duration::from_millis(self.chunk_delay_ms),
            Duration::from_millis(self.layer_delay_ms),
            self.max_concurrent_windows,
        )
    }

    pub const fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms)
    }

    pub const fn count_timeout(&self) -> Duration {
        Duration::from_millis(self.count_timeout_ms)
    }
}

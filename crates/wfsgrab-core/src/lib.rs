//! # wfsgrab Core
//!
//! Bulk download of WFS feature layers whose upstream times out on large
//! pages.
//!
//! ## Overview
//!
//! - **Layer totals** from the `numberMatched` attribute of a hits query
//! - **Fixed-size windows** over `[0, total)`, fetched in ascending order
//! - **Shrink retry**: a timed-out window is re-requested as ten smaller
//!   pieces, down to a configurable floor
//! - **Gap bookkeeping**: ranges that never came back are reported with the
//!   URL needed to fetch them by hand
//! - **Idempotent re-runs**: a layer whose persisted output already matches
//!   the upstream total is skipped
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | WFS implementation of [`FeatureSource`] |
//! | [`assembly`] | Ordered folding of windows, optionally spooled to disk |
//! | [`config`] | [`HarvestConfig`] and its TOML loading |
//! | [`counter`] | Layer totals |
//! | [`domain`] | Layer names, windows, unresolved ranges |
//! | [`downloader`] | Per-layer pipeline |
//! | [`error`] | Core error types |
//! | [`existing`] | Skip check against persisted output |
//! | [`feature_source`] | Upstream contract and its error kinds |
//! | [`fetcher`] | Shrink-and-retry over one window |
//! | [`harvest`] | Run driver over many layers |
//! | [`http_client`] | HTTP client abstraction |
//! | [`outcome`] | Per-layer and per-run reports |
//! | [`pacing`] | Delays and window concurrency |
//! | [`shrink`] | Shrink retry parameters |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Harvester      │  one layer at a time, layer_delay in between
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ LayerDownloader │────▶│ Existing check   │
//! └────────┬────────┘     └──────────────────┘
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ AdaptiveFetcher │────▶│ FeatureSource    │
//! └────────┬────────┘     │ (WFS / reqwest)  │
//!          ▼              └──────────────────┘
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Assembly        │────▶│ FeatureSink      │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wfsgrab_core::{HarvestConfig, Harvester, LayerName};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let harvester = Harvester::from_config(HarvestConfig::default())?;
//!     let report = harvester.run(&[LayerName::parse("govmap:parcels")?]).await;
//!     println!("{}", serde_json::to_string_pretty(&report)?);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod assembly;
pub mod config;
pub mod counter;
pub mod domain;
pub mod downloader;
pub mod error;
pub mod existing;
pub mod feature_source;
pub mod fetcher;
pub mod harvest;
pub mod http_client;
pub mod outcome;
pub mod pacing;
pub mod shrink;

pub use adapters::{parse_number_matched, WfsEndpoint, WfsSource};
pub use assembly::{Assembled, Assembly};
pub use config::{HarvestConfig, DEFAULT_BASE_URL};
pub use counter::{LayerCount, LayerCounter};
pub use domain::{coalesce, LayerName, Pieces, UnresolvedRange, Window};
pub use downloader::LayerDownloader;
pub use error::{CoreError, DownloadError, ValidationError};
pub use existing::is_complete;
pub use feature_source::{
    FeaturePage, FeatureSource, PageRequest, SourceError, SourceErrorKind, SourceFuture,
};
pub use fetcher::{AdaptiveFetcher, WindowFetch};
pub use harvest::{Harvester, LayerTotal};
pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, ReqwestHttpClient,
};
pub use outcome::{DownloadSummary, LayerOutcome, LayerReport, RunReport, RunTotals, SkipReason};
pub use pacing::Pacing;
pub use shrink::{ShrinkPolicy, SHRINK_DIVISOR};

pub use wfsgrab_store::{FeatureSink, GeoJsonSink, StoreError};

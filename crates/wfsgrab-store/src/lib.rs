//! # wfsgrab Store
//!
//! Output side of wfsgrab: every downloaded layer ends up as a single GeoJSON
//! FeatureCollection named after the layer.
//!
//! | Item | Description |
//! |------|-------------|
//! | [`FeatureSink`] | Persistence contract used by the downloader |
//! | [`GeoJsonSink`] | Directory-backed sink, atomic per-layer writes |
//! | [`collection`] | FeatureCollection read/write helpers (also used for chunk files) |
//! | [`naming`] | Storage-safe names derived from layer identifiers |

pub mod collection;
mod error;
pub mod naming;
mod sink;

pub use error::StoreError;
pub use naming::{crs_urn, local_layer_name, output_stem};
pub use sink::{FeatureSink, GeoJsonSink};

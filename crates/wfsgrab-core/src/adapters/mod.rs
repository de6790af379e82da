//! Upstream adapters implementing [`FeatureSource`](crate::FeatureSource).

mod wfs;

pub use wfs::{parse_number_matched, WfsEndpoint, WfsSource};

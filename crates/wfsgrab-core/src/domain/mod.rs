//! # Domain Models
//!
//! | Type | Description |
//! |------|-------------|
//! | [`LayerName`] | Validated namespaced layer identifier |
//! | [`Window`] | Offset range requested in one page call |
//! | [`UnresolvedRange`] | Range that could not be fetched, with its re-fetch URL |

mod layer;
mod window;

pub use layer::LayerName;
pub use window::{coalesce, Pieces, UnresolvedRange, Window};

//! Feature storage for the GeoServices query service.
//!
//! Provides:
//! - A [`Catalog`] mapping `workspace:layer` names to layers
//! - [`FeatureLayer`], an in-memory [`FeatureSource`] loaded from feature set JSON
//! - Filter evaluation against individual features ([`eval::matches`])

pub mod catalog;
pub mod error;
pub mod eval;
pub mod feature;
pub mod layer;

pub use catalog::Catalog;
pub use error::{StoreError, StoreResult};
pub use feature::Feature;
pub use layer::{FeatureLayer, FeatureSource};

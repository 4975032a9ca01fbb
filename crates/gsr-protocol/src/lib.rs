//! GeoServices REST query protocol
//!
//! This crate turns the query parameters of a GeoServices REST `query`
//! request into a [`Filter`] that a feature store can evaluate.
//!
//! The pipeline is linear and request scoped:
//!
//! 1. [`RequestParameters::from_pairs`] validates the raw parameters.
//! 2. [`decode`] turns `geometryType` + `geometry` into a [`CanonicalGeometry`].
//! 3. [`compile`] turns that geometry into a spatial [`Filter`].
//! 4. [`assemble`] conjoins the optional `where` expression.
//!
//! [`QueryPlan::build`] runs all four steps.
//!
//! # Example
//!
//! ```rust
//! use gsr_protocol::QueryPlan;
//!
//! let params = vec![
//!     ("geometryType".to_string(), "GeometryEnvelope".to_string()),
//!     ("geometry".to_string(), "0,0,10,10".to_string()),
//!     ("where".to_string(), "area > 100".to_string()),
//! ];
//!
//! let plan = QueryPlan::build(&params, "the_geom").unwrap();
//! assert!(plan.return_geometry);
//! ```

pub mod cql;
pub mod decode;
pub mod errors;
pub mod featureset;
pub mod filter;
pub mod geometry;
pub mod query;
pub mod responses;

// Re-export commonly used types
pub use cql::CqlError;
pub use decode::{decode, CanonicalGeometry, GeometryTypeTag};
pub use errors::QueryError;
pub use featureset::{FeatureRecord, FeatureSet};
pub use filter::{assemble, compile, ComparisonOp, Expression, Filter, Literal};
pub use geometry::{Envelope, GeometryJsonError};
pub use query::{QueryPlan, RequestParameters};
pub use responses::ExceptionResponse;

/// Query parameter names understood by the query endpoint.
pub mod params {
    /// Selects how `geometry` is decoded.
    pub const GEOMETRY_TYPE: &str = "geometryType";
    /// The geometry payload, compact or JSON.
    pub const GEOMETRY: &str = "geometry";
    /// Optional attribute expression.
    pub const WHERE: &str = "where";
    /// Whether to include geometries in the response.
    pub const RETURN_GEOMETRY: &str = "returnGeometry";
    /// Full-text search; reserved and always rejected.
    pub const TEXT: &str = "text";
    /// Output format.
    pub const FORMAT: &str = "f";
}

/// Geometry type names used on the wire.
pub mod geometry_types {
    pub const ENVELOPE: &str = "GeometryEnvelope";
    pub const POINT: &str = "GeometryPoint";
}

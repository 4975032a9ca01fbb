//! Query error types.

use thiserror::Error;

use crate::cql::CqlError;
use crate::responses::ExceptionResponse;

/// Errors that terminate a query request.
///
/// None of these are retried; each carries the offending parameter name
/// and/or value so the caller can correct the request.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A mandatory parameter is absent.
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    /// A parameter names a feature this service does not implement.
    #[error("Unsupported parameter: {0}")]
    Unsupported(String),

    /// A parameter has a value outside its accepted set.
    #[error("Unrecognized value for {param} parameter: {value}")]
    InvalidValue { param: String, value: String },

    /// No decoding strategy produced a geometry.
    #[error("Can't determine geometry filter from geometryType \"{geometry_type}\" and geometry \"{geometry}\"")]
    GeometryParse {
        geometry_type: String,
        geometry: String,
    },

    /// The `where` expression could not be parsed.
    #[error("where parameter must be valid CQL: {0}")]
    InvalidAttributeExpression(#[from] CqlError),

    /// The layer or table is not in the catalog.
    #[error("No known table or layer with qualified name \"{0}\"")]
    UnknownLayer(String),

    /// Requested output format is not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Feature store or serialization failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl QueryError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            QueryError::MissingParameter(_)
            | QueryError::Unsupported(_)
            | QueryError::InvalidValue { .. }
            | QueryError::GeometryParse { .. }
            | QueryError::InvalidAttributeExpression(_)
            | QueryError::UnsupportedFormat(_) => 400,
            QueryError::UnknownLayer(_) => 404,
            QueryError::Internal(_) => 500,
        }
    }

    /// Short, stable name for metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::MissingParameter(_) => "missing_parameter",
            QueryError::Unsupported(_) => "unsupported",
            QueryError::InvalidValue { .. } => "invalid_value",
            QueryError::GeometryParse { .. } => "geometry_parse",
            QueryError::InvalidAttributeExpression(_) => "invalid_attribute_expression",
            QueryError::UnknownLayer(_) => "unknown_layer",
            QueryError::UnsupportedFormat(_) => "unsupported_format",
            QueryError::Internal(_) => "internal",
        }
    }

    /// Convert to an error response body.
    pub fn to_exception(&self) -> ExceptionResponse {
        let exc = ExceptionResponse::new(self.status_code(), self.to_string());
        match self {
            QueryError::MissingParameter(param) | QueryError::Unsupported(param) => {
                exc.with_detail(format!("parameter: {}", param))
            }
            QueryError::InvalidValue { param, value } => exc
                .with_detail(format!("parameter: {}", param))
                .with_detail(format!("value: {}", value)),
            QueryError::GeometryParse {
                geometry_type,
                geometry,
            } => exc
                .with_detail(format!("geometryType: {}", geometry_type))
                .with_detail(format!("geometry: {}", geometry)),
            QueryError::InvalidAttributeExpression(e) => {
                exc.with_detail(format!("where: {}", e.input()))
            }
            _ => exc,
        }
    }
}

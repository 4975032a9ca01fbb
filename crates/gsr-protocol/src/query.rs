//! Query parameter validation and the request pipeline.
//!
//! Parameters are taken as ordered `(name, value)` pairs so that a key sent
//! with an empty value (`geometryType=`) can be told apart from a key that
//! was not sent at all. When a key repeats, the first value wins.

use crate::decode::{decode, GeometryTypeTag};
use crate::errors::QueryError;
use crate::filter::{assemble, compile, Filter};
use crate::params;

/// Validated query parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParameters {
    /// How to interpret `geometry`.
    pub geometry_type: GeometryTypeTag,

    /// Raw geometry payload.
    pub geometry: String,

    /// Optional attribute expression.
    pub where_clause: Option<String>,

    /// Whether the response should carry geometries.
    pub return_geometry: bool,
}

fn first_value<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

impl RequestParameters {
    /// Validate raw query parameters.
    ///
    /// Fails before any geometry work is done:
    /// - `MissingParameter` if `geometryType` or `geometry` is absent
    /// - `Unsupported` if `text` is present
    /// - `InvalidValue` if `returnGeometry` is neither `true` nor `false`
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, QueryError> {
        let (geometry_type, geometry) = match (
            first_value(pairs, params::GEOMETRY_TYPE),
            first_value(pairs, params::GEOMETRY),
        ) {
            (Some(geometry_type), Some(geometry)) => (geometry_type, geometry),
            _ => {
                return Err(QueryError::MissingParameter(format!(
                    "'{}' and '{}' parameters are mandatory",
                    params::GEOMETRY,
                    params::GEOMETRY_TYPE
                )))
            }
        };

        if first_value(pairs, params::TEXT).is_some() {
            return Err(QueryError::Unsupported(format!(
                "{} (text filter not implemented)",
                params::TEXT
            )));
        }

        let return_geometry = Self::parse_return_geometry(first_value(pairs, params::RETURN_GEOMETRY))?;

        Ok(Self {
            geometry_type: GeometryTypeTag::from_param(geometry_type),
            geometry: geometry.to_string(),
            where_clause: first_value(pairs, params::WHERE).map(str::to_string),
            return_geometry,
        })
    }

    /// Resolve `returnGeometry`; absent means `true`.
    pub fn parse_return_geometry(value: Option<&str>) -> Result<bool, QueryError> {
        match value {
            None => Ok(true),
            Some(v) if v.eq_ignore_ascii_case("true") => Ok(true),
            Some(v) if v.eq_ignore_ascii_case("false") => Ok(false),
            Some(v) => Err(QueryError::InvalidValue {
                param: params::RETURN_GEOMETRY.to_string(),
                value: v.to_string(),
            }),
        }
    }
}

/// The outcome of a successfully parsed query: what to select and how to
/// write it.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    /// Combined spatial and attribute predicate.
    pub filter: Filter,

    /// Passed to the serializer.
    pub return_geometry: bool,
}

impl QueryPlan {
    /// Validate, decode, compile and assemble.
    ///
    /// `geometry_property` is the layer's geometry attribute, resolved by
    /// the caller from the catalog.
    pub fn build(pairs: &[(String, String)], geometry_property: &str) -> Result<Self, QueryError> {
        let request = RequestParameters::from_pairs(pairs)?;
        Self::from_request(&request, geometry_property)
    }

    /// Decode, compile and assemble an already validated request.
    pub fn from_request(
        request: &RequestParameters,
        geometry_property: &str,
    ) -> Result<Self, QueryError> {
        let geometry = decode(&request.geometry_type, &request.geometry)?;
        let spatial = compile(geometry, geometry_property);
        let filter = assemble(spatial, request.where_clause.as_deref())?;

        Ok(Self {
            filter,
            return_geometry: request.return_geometry,
        })
    }
}

//! Filter model, predicate compilation and filter assembly.
//!
//! A [`Filter`] is a boolean predicate over the features of one layer.
//! Spatial predicates ([`Filter::BBox`], [`Filter::Intersects`]) come from
//! [`compile`]; attribute predicates come from the `where` expression via
//! [`crate::cql::parse`]; [`assemble`] combines the two.

use geo::Geometry;

use crate::cql;
use crate::decode::CanonicalGeometry;
use crate::errors::QueryError;

/// A literal value in an attribute expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Number(f64),
    String(String),
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A feature attribute, by name.
    Property(String),
    /// A constant.
    Literal(Literal),
}

impl Expression {
    pub fn property(name: impl Into<String>) -> Self {
        Expression::Property(name.into())
    }

    pub fn number(value: f64) -> Self {
        Expression::Literal(Literal::Number(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expression::Literal(Literal::String(value.into()))
    }
}

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

/// A predicate over features.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every feature.
    Include,

    /// Matches no feature.
    Exclude,

    /// The geometry property overlaps an axis-aligned rectangle.
    BBox {
        property: String,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
        /// Reference system of the bounds; `None` defers to the property's own.
        srs: Option<String>,
    },

    /// The geometry property intersects a literal geometry.
    Intersects {
        property: String,
        geometry: Geometry<f64>,
    },

    /// Binary comparison.
    Compare {
        left: Expression,
        op: ComparisonOp,
        right: Expression,
    },

    /// Wildcard match: `%` any run, `_` one character.
    Like {
        expr: Expression,
        pattern: String,
        case_insensitive: bool,
    },

    /// The expression is null or missing.
    IsNull(Expression),

    /// Inclusive range test.
    Between {
        expr: Expression,
        lower: Expression,
        upper: Expression,
    },

    /// Membership in a list.
    In {
        expr: Expression,
        values: Vec<Expression>,
    },

    /// All children hold.
    And(Vec<Filter>),

    /// Any child holds.
    Or(Vec<Filter>),

    /// Negation.
    Not(Box<Filter>),
}

impl Filter {
    /// Logical conjunction of two filters.
    pub fn and(self, other: Filter) -> Filter {
        Filter::And(vec![self, other])
    }

    /// Logical negation.
    pub fn negate(self) -> Filter {
        Filter::Not(Box::new(self))
    }
}

/// Compile a canonical geometry into a spatial predicate on `property`.
///
/// Envelopes become a bounding-box test with no explicit reference system;
/// points and other geometries become an intersects test against the
/// geometry as a literal.
pub fn compile(geometry: CanonicalGeometry, property: &str) -> Filter {
    match geometry {
        CanonicalGeometry::Envelope(env) => Filter::BBox {
            property: property.to_string(),
            min_x: env.min_x(),
            min_y: env.min_y(),
            max_x: env.max_x(),
            max_y: env.max_y(),
            srs: None,
        },
        CanonicalGeometry::Point(point) => Filter::Intersects {
            property: property.to_string(),
            geometry: Geometry::Point(point),
        },
        CanonicalGeometry::Geometry(geometry) => Filter::Intersects {
            property: property.to_string(),
            geometry,
        },
    }
}

/// Combine a spatial predicate with an optional `where` expression.
pub fn assemble(spatial: Filter, where_clause: Option<&str>) -> Result<Filter, QueryError> {
    match where_clause {
        None => Ok(spatial),
        Some(text) => {
            let attribute = cql::parse(text)?;
            Ok(spatial.and(attribute))
        }
    }
}

//! Geometry decoding for the `geometryType` / `geometry` parameter pair.
//!
//! A geometry payload arrives either in a compact comma-separated form
//! (`x,y` or `xmin,ymin,xmax,ymax`) or as GeoServices geometry JSON. Each
//! form is an attempt function returning `Option`; attempts run in order
//! and the first success wins. Only when every attempt fails is a
//! [`QueryError::GeometryParse`] reported.

use geo::{Geometry, Point};

use crate::errors::QueryError;
use crate::geometry::{self, Envelope};
use crate::geometry_types;

/// How the geometry payload should be interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryTypeTag {
    /// `GeometryEnvelope`: compact `xmin,ymin,xmax,ymax`, then envelope JSON.
    Envelope,
    /// `GeometryPoint`: compact `x,y`, then point JSON.
    Point,
    /// Anything else: geometry JSON of any shape.
    Other(String),
}

impl GeometryTypeTag {
    /// Map a `geometryType` parameter value to a tag.
    ///
    /// Matching is exact and case-sensitive. An empty value means
    /// `GeometryPoint`.
    pub fn from_param(value: &str) -> Self {
        match value {
            "" | geometry_types::POINT => GeometryTypeTag::Point,
            geometry_types::ENVELOPE => GeometryTypeTag::Envelope,
            other => GeometryTypeTag::Other(other.to_string()),
        }
    }

    /// The parameter value this tag was read from.
    pub fn as_str(&self) -> &str {
        match self {
            GeometryTypeTag::Envelope => geometry_types::ENVELOPE,
            GeometryTypeTag::Point => geometry_types::POINT,
            GeometryTypeTag::Other(name) => name,
        }
    }
}

/// A decoded request geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalGeometry {
    Envelope(Envelope),
    Point(Point<f64>),
    Geometry(Geometry<f64>),
}

/// Decode a geometry payload according to its type tag.
pub fn decode(tag: &GeometryTypeTag, text: &str) -> Result<CanonicalGeometry, QueryError> {
    let decoded = match tag {
        GeometryTypeTag::Envelope => parse_short_envelope(text)
            .or_else(|| parse_json_envelope(text))
            .map(CanonicalGeometry::Envelope),
        GeometryTypeTag::Point => parse_short_point(text)
            .or_else(|| parse_json_point(text))
            .map(CanonicalGeometry::Point),
        GeometryTypeTag::Other(_) => parse_json_geometry(text).map(CanonicalGeometry::Geometry),
    };

    decoded.ok_or_else(|| QueryError::GeometryParse {
        geometry_type: tag.as_str().to_string(),
        geometry: text.to_string(),
    })
}

/// Split on commas and parse exactly `N` finite numbers.
///
/// Trailing empty fields are dropped (`"1,2,"` is two fields); leading and
/// interior empty fields are kept and fail the parse. Any field that is
/// not a finite number fails the whole attempt.
fn parse_fields<const N: usize>(text: &str) -> Option<[f64; N]> {
    let mut parts: Vec<&str> = text.split(',').collect();
    while parts.last() == Some(&"") {
        parts.pop();
    }
    if parts.len() != N {
        return None;
    }

    let mut coords = [0.0; N];
    for (slot, part) in coords.iter_mut().zip(&parts) {
        let value: f64 = part.trim().parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        *slot = value;
    }
    Some(coords)
}

/// Compact `xmin,ymin,xmax,ymax`.
pub fn parse_short_envelope(text: &str) -> Option<Envelope> {
    let c = parse_fields::<4>(text)?;
    // Envelope::new takes (x1, x2, y1, y2); the wire order is
    // (xmin, ymin, xmax, ymax).
    Some(Envelope::new(c[0], c[2], c[1], c[3]))
}

/// Envelope JSON `{"xmin", "ymin", "xmax", "ymax"}`.
pub fn parse_json_envelope(text: &str) -> Option<Envelope> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    geometry::json_to_envelope(&value).ok()
}

/// Compact `x,y`.
pub fn parse_short_point(text: &str) -> Option<Point<f64>> {
    let [x, y] = parse_fields::<2>(text)?;
    Some(Point::new(x, y))
}

/// Geometry JSON that must decode to a point.
pub fn parse_json_point(text: &str) -> Option<Point<f64>> {
    match geometry::parse_geometry(text).ok()? {
        Geometry::Point(point) => Some(point),
        _ => None,
    }
}

/// Geometry JSON of any shape.
pub fn parse_json_geometry(text: &str) -> Option<Geometry<f64>> {
    geometry::parse_geometry(text).ok()
}

//! GeoServices REST geometry JSON and the envelope type.
//!
//! The GeoServices REST API encodes geometries as plain JSON objects whose
//! shape is identified by the keys present rather than by a type tag:
//!
//! | shape      | keys                              |
//! |------------|-----------------------------------|
//! | point      | `x`, `y`                          |
//! | multipoint | `points`                          |
//! | polyline   | `paths`                           |
//! | polygon    | `rings`                           |
//! | envelope   | `xmin`, `ymin`, `xmax`, `ymax`    |
//!
//! Coordinates beyond the first two (z, m) and any `spatialReference`
//! member are ignored when decoding.

use geo::orient::Direction;
use geo::{
    Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Orient, Point,
    Polygon, Rect, Winding,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Errors that can occur when decoding geometry JSON.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryJsonError {
    /// The text is not valid JSON.
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// The JSON value is not an object.
    #[error("Geometry must be a JSON object")]
    NotAnObject,

    /// None of the known geometry keys are present.
    #[error("Unrecognized geometry object; expected one of x/y, points, paths, rings or xmin/ymin/xmax/ymax")]
    UnrecognizedShape,

    /// A required member is missing or not a finite number.
    #[error("Missing or non-numeric field: {0}")]
    InvalidField(&'static str),

    /// A coordinate array is malformed.
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),
}

/// An axis-aligned rectangle.
///
/// The constructor takes both x values before both y values, i.e.
/// `(x1, x2, y1, y2)`. GeoServices REST orders envelope coordinates as
/// `xmin, ymin, xmax, ymax`, so callers holding wire-order values must use
/// [`Envelope::from_bounds`] or transpose explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
}

impl Envelope {
    /// Create an envelope from two x values and two y values.
    ///
    /// The values are normalized so that each minimum is not greater than
    /// its maximum.
    pub fn new(x1: f64, x2: f64, y1: f64, y2: f64) -> Self {
        Self {
            min_x: x1.min(x2),
            max_x: x1.max(x2),
            min_y: y1.min(y2),
            max_y: y1.max(y2),
        }
    }

    /// Create an envelope from wire-order bounds `(xmin, ymin, xmax, ymax)`.
    pub fn from_bounds(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self::new(xmin, xmax, ymin, ymax)
    }

    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    pub fn max_y(&self) -> f64 {
        self.max_y
    }

    /// Bounds in wire order `(xmin, ymin, xmax, ymax)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        (self.min_x, self.min_y, self.max_x, self.max_y)
    }

    /// Convert to a `geo` rectangle.
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.min_x,
                y: self.min_y,
            },
            Coord {
                x: self.max_x,
                y: self.max_y,
            },
        )
    }
}

/// Parse geometry JSON text into a `geo` geometry.
pub fn parse_geometry(text: &str) -> Result<Geometry<f64>, GeometryJsonError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| GeometryJsonError::InvalidJson(e.to_string()))?;
    json_to_geometry(&value)
}

/// Decode a GeoServices geometry object.
pub fn json_to_geometry(value: &Value) -> Result<Geometry<f64>, GeometryJsonError> {
    let obj = value.as_object().ok_or(GeometryJsonError::NotAnObject)?;

    if obj.contains_key("x") && obj.contains_key("y") {
        let x = finite_field(obj, "x")?;
        let y = finite_field(obj, "y")?;
        return Ok(Geometry::Point(Point::new(x, y)));
    }

    if let Some(points) = obj.get("points") {
        let coords = coord_array(points)?;
        return Ok(Geometry::MultiPoint(MultiPoint::from(
            coords.into_iter().map(Point::from).collect::<Vec<_>>(),
        )));
    }

    if let Some(paths) = obj.get("paths") {
        let mut lines = nested_coord_arrays(paths)?
            .into_iter()
            .map(LineString::new)
            .collect::<Vec<_>>();
        if lines.len() == 1 {
            if let Some(line) = lines.pop() {
                return Ok(Geometry::LineString(line));
            }
        }
        return Ok(Geometry::MultiLineString(MultiLineString::new(lines)));
    }

    if let Some(rings) = obj.get("rings") {
        let rings = nested_coord_arrays(rings)?;
        return Ok(rings_to_geometry(rings));
    }

    if obj.contains_key("xmin") {
        return json_to_envelope(value).map(|e| Geometry::Rect(e.to_rect()));
    }

    Err(GeometryJsonError::UnrecognizedShape)
}

/// Decode a GeoServices envelope object.
pub fn json_to_envelope(value: &Value) -> Result<Envelope, GeometryJsonError> {
    let obj = value.as_object().ok_or(GeometryJsonError::NotAnObject)?;
    let xmin = finite_field(obj, "xmin")?;
    let ymin = finite_field(obj, "ymin")?;
    let xmax = finite_field(obj, "xmax")?;
    let ymax = finite_field(obj, "ymax")?;
    Ok(Envelope::from_bounds(xmin, ymin, xmax, ymax))
}

/// Encode a `geo` geometry as a GeoServices geometry object.
///
/// Geometry collections have no GeoServices representation and encode as
/// `null`.
pub fn geometry_to_json(geometry: &Geometry<f64>) -> Value {
    match geometry {
        Geometry::Point(p) => json!({ "x": p.x(), "y": p.y() }),
        Geometry::MultiPoint(mp) => json!({
            "points": mp.iter().map(|p| [p.x(), p.y()]).collect::<Vec<_>>()
        }),
        Geometry::Line(line) => json!({
            "paths": [[[line.start.x, line.start.y], [line.end.x, line.end.y]]]
        }),
        Geometry::LineString(ls) => json!({ "paths": [coords_json(ls)] }),
        Geometry::MultiLineString(mls) => json!({
            "paths": mls.iter().map(coords_json).collect::<Vec<_>>()
        }),
        Geometry::Polygon(poly) => json!({ "rings": polygon_rings(poly) }),
        Geometry::MultiPolygon(mp) => json!({
            "rings": mp.iter().flat_map(polygon_rings).collect::<Vec<_>>()
        }),
        Geometry::Rect(rect) => json!({
            "xmin": rect.min().x,
            "ymin": rect.min().y,
            "xmax": rect.max().x,
            "ymax": rect.max().y,
        }),
        Geometry::Triangle(tri) => json!({ "rings": polygon_rings(&tri.to_polygon()) }),
        Geometry::GeometryCollection(_) => Value::Null,
    }
}

/// GeoServices geometry type name for a geometry.
pub fn esri_geometry_type(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "esriGeometryPoint",
        Geometry::MultiPoint(_) => "esriGeometryMultipoint",
        Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => {
            "esriGeometryPolyline"
        }
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) | Geometry::Triangle(_) => {
            "esriGeometryPolygon"
        }
        Geometry::Rect(_) => "esriGeometryEnvelope",
        Geometry::GeometryCollection(_) => "esriGeometryAny",
    }
}

fn finite_field(obj: &Map<String, Value>, name: &'static str) -> Result<f64, GeometryJsonError> {
    obj.get(name)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
        .ok_or(GeometryJsonError::InvalidField(name))
}

fn coord(value: &Value) -> Result<Coord<f64>, GeometryJsonError> {
    let arr = value
        .as_array()
        .ok_or_else(|| GeometryJsonError::InvalidCoordinate(value.to_string()))?;
    if arr.len() < 2 {
        return Err(GeometryJsonError::InvalidCoordinate(value.to_string()));
    }
    let x = arr[0].as_f64().filter(|v| v.is_finite());
    let y = arr[1].as_f64().filter(|v| v.is_finite());
    match (x, y) {
        (Some(x), Some(y)) => Ok(Coord { x, y }),
        _ => Err(GeometryJsonError::InvalidCoordinate(value.to_string())),
    }
}

fn coord_array(value: &Value) -> Result<Vec<Coord<f64>>, GeometryJsonError> {
    value
        .as_array()
        .ok_or_else(|| GeometryJsonError::InvalidCoordinate(value.to_string()))?
        .iter()
        .map(coord)
        .collect()
}

fn nested_coord_arrays(value: &Value) -> Result<Vec<Vec<Coord<f64>>>, GeometryJsonError> {
    value
        .as_array()
        .ok_or_else(|| GeometryJsonError::InvalidCoordinate(value.to_string()))?
        .iter()
        .map(coord_array)
        .collect()
}

// Clockwise rings are exteriors; counter-clockwise rings are holes of the
// exterior that precedes them.
fn rings_to_geometry(rings: Vec<Vec<Coord<f64>>>) -> Geometry<f64> {
    let mut polygons: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();

    for coords in rings {
        let mut ring = LineString::new(coords);
        ring.close();
        if ring.is_cw() || polygons.is_empty() {
            polygons.push((ring, Vec::new()));
        } else if let Some((_, holes)) = polygons.last_mut() {
            holes.push(ring);
        }
    }

    let mut polygons: Vec<Polygon<f64>> = polygons
        .into_iter()
        .map(|(exterior, holes)| Polygon::new(exterior, holes))
        .collect();

    if polygons.len() == 1 {
        if let Some(polygon) = polygons.pop() {
            return Geometry::Polygon(polygon);
        }
    }
    Geometry::MultiPolygon(MultiPolygon::new(polygons))
}

fn coords_json(ls: &LineString<f64>) -> Vec<[f64; 2]> {
    ls.coords().map(|c| [c.x, c.y]).collect()
}

fn polygon_rings(poly: &Polygon<f64>) -> Vec<Vec<[f64; 2]>> {
    // GeoServices wants clockwise exteriors, the reverse of the geo default.
    let oriented = poly.orient(Direction::Reversed);
    std::iter::once(oriented.exterior())
        .chain(oriented.interiors().iter())
        .map(coords_json)
        .collect()
}

//! GeoServices feature set documents.
//!
//! The same document shape is used for query responses and for the layer
//! files the feature store loads:
//!
//! ```json
//! {
//!   "geometryType": "esriGeometryPoint",
//!   "spatialReference": { "wkid": 4326 },
//!   "features": [
//!     { "attributes": { "name": "a" }, "geometry": { "x": 1, "y": 2 } }
//!   ]
//! }
//! ```

use geo::Geometry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::geometry::{esri_geometry_type, geometry_to_json, json_to_geometry, GeometryJsonError};

/// Spatial reference by well-known id.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpatialReference {
    pub wkid: u32,
}

/// A feature set document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FeatureSet {
    /// GeoServices geometry type of the features, when known.
    #[serde(rename = "geometryType", skip_serializing_if = "Option::is_none", default)]
    pub geometry_type: Option<String>,

    /// Spatial reference of the geometries, when known.
    #[serde(rename = "spatialReference", skip_serializing_if = "Option::is_none", default)]
    pub spatial_reference: Option<SpatialReference>,

    /// The features.
    #[serde(default)]
    pub features: Vec<FeatureRecord>,
}

impl FeatureSet {
    /// Create a new empty feature set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a response document from features.
    ///
    /// With `return_geometry` false, features carry attributes only and no
    /// `geometryType` is reported.
    pub fn from_features<'a, I>(features: I, return_geometry: bool) -> Self
    where
        I: IntoIterator<Item = (&'a Map<String, Value>, Option<&'a Geometry<f64>>)>,
    {
        let mut set = FeatureSet::new();
        for (attributes, geometry) in features {
            let mut record = FeatureRecord::new(attributes.clone());
            if return_geometry {
                if let Some(geometry) = geometry {
                    if set.geometry_type.is_none() {
                        set.geometry_type = Some(esri_geometry_type(geometry).to_string());
                    }
                    record = record.with_geometry(geometry);
                }
            }
            set.features.push(record);
        }
        set
    }

    /// Set the spatial reference.
    pub fn with_spatial_reference(mut self, wkid: Option<u32>) -> Self {
        self.spatial_reference = wkid.map(|wkid| SpatialReference { wkid });
        self
    }

    /// Serialize as UTF-8 JSON.
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// One feature in a [`FeatureSet`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FeatureRecord {
    /// Attribute values keyed by field name.
    #[serde(default)]
    pub attributes: Map<String, Value>,

    /// GeoServices geometry JSON.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub geometry: Option<Value>,
}

impl FeatureRecord {
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self {
            attributes,
            geometry: None,
        }
    }

    /// Attach a geometry, encoded as GeoServices JSON.
    pub fn with_geometry(mut self, geometry: &Geometry<f64>) -> Self {
        let value = geometry_to_json(geometry);
        self.geometry = (!value.is_null()).then_some(value);
        self
    }

    /// Decode the attached geometry, if any.
    pub fn decode_geometry(&self) -> Result<Option<Geometry<f64>>, GeometryJsonError> {
        match &self.geometry {
            None | Some(Value::Null) => Ok(None),
            Some(value) => json_to_geometry(value).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;
    use serde_json::json;

    fn attrs(name: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("name".to_string(), json!(name));
        map
    }

    #[test]
    fn test_from_features_with_geometry() {
        let a = attrs("a");
        let g = Geometry::Point(Point::new(1.0, 2.0));
        let set = FeatureSet::from_features(vec![(&a, Some(&g))], true);

        assert_eq!(set.geometry_type.as_deref(), Some("esriGeometryPoint"));
        assert_eq!(set.features.len(), 1);
        assert_eq!(set.features[0].geometry, Some(json!({ "x": 1.0, "y": 2.0 })));
    }

    #[test]
    fn test_from_features_without_geometry() {
        let a = attrs("a");
        let g = Geometry::Point(Point::new(1.0, 2.0));
        let set = FeatureSet::from_features(vec![(&a, Some(&g))], false);

        assert!(set.geometry_type.is_none());
        assert!(set.features[0].geometry.is_none());

        let json = serde_json::to_value(&set).unwrap();
        assert!(json["features"][0].get("geometry").is_none());
        assert_eq!(json["features"][0]["attributes"]["name"], "a");
    }

    #[test]
    fn test_spatial_reference_serialization() {
        let set = FeatureSet::new().with_spatial_reference(Some(4326));
        let json = serde_json::to_string(&set).unwrap();
        assert!(json.contains("\"spatialReference\":{\"wkid\":4326}"));
    }

    #[test]
    fn test_deserialize_layer_document() {
        let text = r#"{
            "features": [
                { "attributes": { "name": "a" }, "geometry": { "x": 1, "y": 2 } },
                { "attributes": { "name": "b" } }
            ]
        }"#;
        let set: FeatureSet = serde_json::from_str(text).unwrap();

        assert_eq!(set.features.len(), 2);
        assert_eq!(
            set.features[0].decode_geometry().unwrap(),
            Some(Geometry::Point(Point::new(1.0, 2.0)))
        );
        assert_eq!(set.features[1].decode_geometry().unwrap(), None);
    }
}

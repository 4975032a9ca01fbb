//! Feature type.

use geo::Geometry;
use serde_json::{Map, Value};

/// A feature: named attribute values plus an optional geometry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feature {
    pub attributes: Map<String, Value>,
    pub geometry: Option<Geometry<f64>>,
}

impl Feature {
    /// Create a feature with no attributes and no geometry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute value.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the geometry.
    pub fn with_geometry(mut self, geometry: impl Into<Geometry<f64>>) -> Self {
        self.geometry = Some(geometry.into());
        self
    }

    /// Look up an attribute; `None` when absent.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

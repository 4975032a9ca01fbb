//! Layer catalog keyed by workspace and layer name.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::layer::FeatureLayer;

/// Registry of published layers.
#[derive(Debug, Default)]
pub struct Catalog {
    layers: HashMap<(String, String), Arc<FeatureLayer>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a layer. Fails if the qualified name is already taken.
    pub fn register(&mut self, layer: FeatureLayer) -> StoreResult<()> {
        let key = (layer.workspace().to_string(), layer.name().to_string());
        if self.layers.contains_key(&key) {
            return Err(StoreError::DuplicateLayer(layer.qualified_name()));
        }
        debug!(layer = %layer.qualified_name(), "Registered layer");
        self.layers.insert(key, Arc::new(layer));
        Ok(())
    }

    /// Look up a layer.
    pub fn get_layer(&self, workspace: &str, name: &str) -> StoreResult<Arc<FeatureLayer>> {
        self.layers
            .get(&(workspace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::LayerNotFound(format!("{}:{}", workspace, name)))
    }

    /// The geometry attribute name of a layer.
    pub fn resolve_geometry_property(&self, workspace: &str, name: &str) -> StoreResult<String> {
        self.get_layer(workspace, name)
            .map(|layer| layer.geometry_property().to_string())
    }

    /// Qualified names of all layers, sorted.
    pub fn list_layers(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .layers
            .keys()
            .map(|(workspace, name)| format!("{}:{}", workspace, name))
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

//! Feature sources and the in-memory layer implementation.

use std::path::Path;

use async_trait::async_trait;
use gsr_protocol::{FeatureSet, Filter};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::eval;
use crate::feature::Feature;

/// Trait for anything that can select features by filter.
///
/// The filter is the output of query planning; implementations decide how
/// to evaluate it (in memory, pushed down to a database, etc.).
#[async_trait]
pub trait FeatureSource: Send + Sync {
    /// Return every feature matching `filter`, in source order.
    async fn features(&self, filter: &Filter) -> StoreResult<Vec<Feature>>;
}

/// A named layer holding its features in memory.
#[derive(Debug, Clone)]
pub struct FeatureLayer {
    workspace: String,
    name: String,
    geometry_property: String,
    wkid: Option<u32>,
    features: Vec<Feature>,
}

impl FeatureLayer {
    pub fn new(
        workspace: impl Into<String>,
        name: impl Into<String>,
        geometry_property: impl Into<String>,
    ) -> Self {
        Self {
            workspace: workspace.into(),
            name: name.into(),
            geometry_property: geometry_property.into(),
            wkid: None,
            features: Vec::new(),
        }
    }

    /// Set the spatial reference reported with query results.
    pub fn with_wkid(mut self, wkid: Option<u32>) -> Self {
        self.wkid = wkid;
        self
    }

    pub fn with_features(mut self, features: Vec<Feature>) -> Self {
        self.features = features;
        self
    }

    /// Populate from a feature set document.
    ///
    /// A spatial reference in the document is used only when none was set
    /// on the layer.
    pub fn from_feature_set(mut self, set: FeatureSet) -> StoreResult<Self> {
        let mut features = Vec::with_capacity(set.features.len());
        for (index, record) in set.features.into_iter().enumerate() {
            let geometry = record.decode_geometry().map_err(|e| {
                StoreError::InvalidData(format!("feature {} of {}: {}", index, self.qualified_name(), e))
            })?;
            features.push(Feature {
                attributes: record.attributes,
                geometry,
            });
        }
        if self.wkid.is_none() {
            self.wkid = set.spatial_reference.map(|sr| sr.wkid);
        }
        self.features = features;
        Ok(self)
    }

    /// Load features from a feature set JSON file.
    pub fn load_file(self, path: &Path) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Io(format!("{}: {}", path.display(), e)))?;
        let set: FeatureSet = serde_json::from_str(&content)
            .map_err(|e| StoreError::InvalidData(format!("{}: {}", path.display(), e)))?;
        let layer = self.from_feature_set(set)?;

        info!(
            layer = %layer.qualified_name(),
            path = %path.display(),
            features = layer.features.len(),
            "Loaded layer"
        );
        Ok(layer)
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `workspace:name`, as used in error messages.
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.workspace, self.name)
    }

    pub fn geometry_property(&self) -> &str {
        &self.geometry_property
    }

    pub fn wkid(&self) -> Option<u32> {
        self.wkid
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[async_trait]
impl FeatureSource for FeatureLayer {
    async fn features(&self, filter: &Filter) -> StoreResult<Vec<Feature>> {
        let selected: Vec<Feature> = self
            .features
            .iter()
            .filter(|feature| eval::matches(filter, feature, &self.geometry_property))
            .cloned()
            .collect();

        debug!(
            layer = %self.qualified_name(),
            scanned = self.features.len(),
            matched = selected.len(),
            "Evaluated filter"
        );
        Ok(selected)
    }
}

//! Layer configuration loading and types.
//!
//! A configuration directory holds one YAML file per workspace:
//!
//! ```yaml
//! workspace: topp
//! layers:
//!   - name: states
//!     geometry_property: the_geom
//!     wkid: 4326
//!     source: states.json
//! ```
//!
//! `source` paths are resolved relative to the configuration directory and
//! point at GeoServices feature set JSON files.

use anyhow::{Context, Result};
use feature_store::{Catalog, FeatureLayer};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Service configuration loaded from YAML files.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Directory the configuration was read from.
    pub root: PathBuf,

    /// Workspace definitions, in file name order.
    pub workspaces: Vec<WorkspaceConfig>,
}

impl ServiceConfig {
    /// Load configuration from a directory of YAML files.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref();

        // If directory doesn't exist, return default config
        if !path.exists() {
            tracing::warn!(
                "Config directory {} does not exist, using defaults",
                path.display()
            );
            return Ok(Self {
                root: path.to_path_buf(),
                ..Self::default()
            });
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(path)
            .with_context(|| format!("Failed to read directory: {}", path.display()))?
        {
            let file_path = entry?.path();
            if let Some(ext) = file_path.extension() {
                if ext == "yaml" || ext == "yml" {
                    files.push(file_path);
                }
            }
        }
        files.sort();

        let mut workspaces = Vec::with_capacity(files.len());
        for file_path in files {
            let content = std::fs::read_to_string(&file_path)
                .with_context(|| format!("Failed to read: {:?}", file_path))?;

            let workspace: WorkspaceConfig = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse: {:?}", file_path))?;

            tracing::info!(
                "Loaded workspace {} with {} layers from {:?}",
                workspace.workspace,
                workspace.layers.len(),
                file_path
            );
            workspaces.push(workspace);
        }

        Ok(Self {
            root: path.to_path_buf(),
            workspaces,
        })
    }

    /// Load every configured layer into a catalog.
    pub fn build_catalog(&self) -> Result<Catalog> {
        let mut catalog = Catalog::new();

        for workspace in &self.workspaces {
            for layer in &workspace.layers {
                let qualified = format!("{}:{}", workspace.workspace, layer.name);
                let feature_layer =
                    FeatureLayer::new(&workspace.workspace, &layer.name, &layer.geometry_property)
                        .with_wkid(layer.wkid);

                let feature_layer = match &layer.source {
                    Some(source) => feature_layer
                        .load_file(&self.root.join(source))
                        .with_context(|| format!("Failed to load layer {}", qualified))?,
                    None => feature_layer,
                };

                catalog
                    .register(feature_layer)
                    .with_context(|| format!("Failed to register layer {}", qualified))?;
            }
        }

        Ok(catalog)
    }
}

/// A workspace and the layers it publishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Workspace name (first path segment of the service URL).
    pub workspace: String,

    #[serde(default)]
    pub layers: Vec<LayerConfig>,
}

/// A published layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerConfig {
    pub name: String,

    /// Attribute that spatial filters are evaluated against.
    #[serde(default = "default_geometry_property")]
    pub geometry_property: String,

    /// Spatial reference reported with results.
    #[serde(default)]
    pub wkid: Option<u32>,

    /// Feature set JSON file, relative to the config directory.
    #[serde(default)]
    pub source: Option<String>,
}

fn default_geometry_property() -> String {
    "the_geom".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_dir_gives_empty_config() {
        let config = ServiceConfig::load_from_dir("/nonexistent/gsr-config").unwrap();
        assert!(config.workspaces.is_empty());
        assert!(config.build_catalog().unwrap().is_empty());
    }

    #[test]
    fn test_load_and_build_catalog() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("topp.yaml"),
            r#"
workspace: topp
layers:
  - name: cities
    geometry_property: geom
    wkid: 4326
    source: data/cities.json
  - name: empty
"#,
        )
        .unwrap();
        fs::create_dir(dir.path().join("data")).unwrap();
        fs::write(
            dir.path().join("data/cities.json"),
            r#"{"features": [{"attributes": {"name": "Austin"}, "geometry": {"x": -97.7, "y": 30.3}}]}"#,
        )
        .unwrap();
        fs::write(dir.path().join("README.txt"), "ignored").unwrap();

        let config = ServiceConfig::load_from_dir(dir.path()).unwrap();
        assert_eq!(config.workspaces.len(), 1);

        let catalog = config.build_catalog().unwrap();
        assert_eq!(catalog.list_layers(), vec!["topp:cities", "topp:empty"]);

        let cities = catalog.get_layer("topp", "cities").unwrap();
        assert_eq!(cities.geometry_property(), "geom");
        assert_eq!(cities.wkid(), Some(4326));
        assert_eq!(cities.len(), 1);

        let empty = catalog.get_layer("topp", "empty").unwrap();
        assert_eq!(empty.geometry_property(), "the_geom");
        assert!(empty.is_empty());
    }

    #[test]
    fn test_missing_source_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("ws.yml"),
            "workspace: ws\nlayers:\n  - name: l\n    source: missing.json\n",
        )
        .unwrap();

        let config = ServiceConfig::load_from_dir(dir.path()).unwrap();
        let err = config.build_catalog().unwrap_err();
        assert!(format!("{:#}", err).contains("ws:l"));
    }

    #[test]
    fn test_invalid_yaml_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.yaml"), "layers: [").unwrap();
        assert!(ServiceConfig::load_from_dir(dir.path()).is_err());
    }
}

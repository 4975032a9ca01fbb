//! Application state for the GeoServices REST API.

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::Arc;

use feature_store::Catalog;

use crate::config::ServiceConfig;

/// Shared application state.
pub struct AppState {
    /// Published layers.
    pub catalog: Arc<Catalog>,

    /// Renders `/metrics`; absent when no recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Load layer configuration and data from `config_dir`.
    pub fn new(config_dir: &Path) -> Result<Self> {
        let config = ServiceConfig::load_from_dir(config_dir)?;
        let catalog = config.build_catalog()?;

        tracing::info!(layers = catalog.len(), "Catalog ready");

        Ok(Self::from_catalog(catalog))
    }

    pub fn from_catalog(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            prometheus: None,
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}

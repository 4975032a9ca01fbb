//! Error types for the feature store.

use thiserror::Error;

/// Result type alias using StoreError.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the catalog and feature sources.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Layer already registered: {0}")]
    DuplicateLayer(String),

    #[error("Failed to read layer data: {0}")]
    Io(String),

    #[error("Invalid layer data: {0}")]
    InvalidData(String),
}

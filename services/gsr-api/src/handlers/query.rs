//! Feature query handler.
//!
//! `GET /gsr/services/:workspace/MapServer/:layer/query`
//!
//! The raw query string is kept as ordered pairs so parameter presence
//! and repetition reach the validator unchanged.

use axum::{
    extract::{Extension, Path, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use feature_store::{FeatureSource, StoreError};
use gsr_protocol::{params, FeatureSet, QueryError, QueryPlan};
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::state::AppState;

/// The only output format.
const JSON_FORMAT: &str = "json";

/// GET /gsr/services/:workspace/MapServer/:layer/query
pub async fn query_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((workspace, layer)): Path<(String, String)>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let start = Instant::now();
    counter!("gsr_query_requests_total").increment(1);

    let result = run_query(&state, &workspace, &layer, &pairs).await;
    histogram!("gsr_query_duration_ms").record(start.elapsed().as_secs_f64() * 1000.0);

    match result.and_then(|set| set.to_bytes().map_err(|e| QueryError::Internal(e.to_string()))) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(err) => {
            counter!("gsr_query_errors_total", "kind" => err.kind()).increment(1);
            if err.status_code() >= 500 {
                error!(workspace = %workspace, layer = %layer, error = %err, "Query failed");
            } else {
                warn!(workspace = %workspace, layer = %layer, error = %err, "Query rejected");
            }
            error_response(&err)
        }
    }
}

async fn run_query(
    state: &AppState,
    workspace: &str,
    layer_name: &str,
    pairs: &[(String, String)],
) -> Result<FeatureSet, QueryError> {
    if let Some((_, format)) = pairs.iter().find(|(key, _)| key == params::FORMAT) {
        if format != JSON_FORMAT {
            return Err(QueryError::UnsupportedFormat(format!(
                "{} ({} is the only supported format)",
                format, JSON_FORMAT
            )));
        }
    }

    let geometry_property = state
        .catalog
        .resolve_geometry_property(workspace, layer_name)
        .map_err(store_error)?;

    let plan = QueryPlan::build(pairs, &geometry_property)?;

    let layer = state
        .catalog
        .get_layer(workspace, layer_name)
        .map_err(store_error)?;
    debug!(layer = %layer.qualified_name(), filter = ?plan.filter, "Planned query");

    let features = layer.features(&plan.filter).await.map_err(store_error)?;
    info!(
        layer = %layer.qualified_name(),
        count = features.len(),
        return_geometry = plan.return_geometry,
        "Query complete"
    );

    Ok(FeatureSet::from_features(
        features.iter().map(|f| (&f.attributes, f.geometry.as_ref())),
        plan.return_geometry,
    )
    .with_spatial_reference(layer.wkid()))
}

fn store_error(err: StoreError) -> QueryError {
    match err {
        StoreError::LayerNotFound(name) => QueryError::UnknownLayer(name),
        other => QueryError::Internal(other.to_string()),
    }
}

fn error_response(err: &QueryError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let json = serde_json::to_string(&err.to_exception()).unwrap_or_default();

    (status, [(header::CONTENT_TYPE, "application/json")], json).into_response()
}

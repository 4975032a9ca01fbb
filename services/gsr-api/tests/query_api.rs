//! HTTP tests for the query endpoint.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use feature_store::{Catalog, FeatureLayer};
use gsr_api::routes::build_router;
use gsr_api::state::AppState;
use gsr_protocol::FeatureSet;
use serde_json::{json, Value};
use tower::ServiceExt;

fn cities_layer() -> FeatureLayer {
    let set: FeatureSet = serde_json::from_value(json!({
        "spatialReference": { "wkid": 4326 },
        "features": [
            { "attributes": { "name": "Austin", "pop": 960000 }, "geometry": { "x": -97.74, "y": 30.27 } },
            { "attributes": { "name": "Denver", "pop": 715000 }, "geometry": { "x": -104.99, "y": 39.74 } },
            { "attributes": { "name": "Seattle", "pop": 737000 }, "geometry": { "x": -122.33, "y": 47.61 } }
        ]
    }))
    .unwrap();

    FeatureLayer::new("topp", "cities", "the_geom")
        .from_feature_set(set)
        .unwrap()
}

fn parcels_layer() -> FeatureLayer {
    let set: FeatureSet = serde_json::from_value(json!({
        "features": [
            { "attributes": { "name": "lot 1" }, "geometry": { "rings": [[[0, 0], [0, 2], [2, 2], [2, 0], [0, 0]]] } },
            { "attributes": { "name": "lot 2" }, "geometry": { "rings": [[[5, 5], [5, 6], [6, 6], [6, 5], [5, 5]]] } }
        ]
    }))
    .unwrap();

    FeatureLayer::new("cadastre", "parcels", "shape")
        .from_feature_set(set)
        .unwrap()
}

fn app() -> Router {
    let mut catalog = Catalog::new();
    catalog.register(cities_layer()).unwrap();
    catalog.register(parcels_layer()).unwrap();
    build_router(Arc::new(AppState::from_catalog(catalog)))
}

async fn get(uri: &str) -> (StatusCode, Value) {
    let response = app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn names(body: &Value) -> Vec<String> {
    body["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["attributes"]["name"].as_str().unwrap().to_string())
        .collect()
}

const QUERY: &str = "/gsr/services/topp/MapServer/cities/query";

#[tokio::test]
async fn test_envelope_query() {
    let (status, body) = get(&format!(
        "{}?geometryType=GeometryEnvelope&geometry=-110,25,-90,42",
        QUERY
    ))
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Austin", "Denver"]);
    assert_eq!(body["geometryType"], "esriGeometryPoint");
    assert_eq!(body["spatialReference"]["wkid"], 4326);
    assert_eq!(body["features"][0]["geometry"]["x"], -97.74);
}

#[tokio::test]
async fn test_envelope_query_with_where() {
    let (status, body) = get(&format!(
        "{}?geometryType=GeometryEnvelope&geometry=-130,25,-90,50&where=pop%20%3C%20800000",
        QUERY
    ))
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Denver", "Seattle"]);
}

#[tokio::test]
async fn test_json_point_query() {
    // {"x":-104.99,"y":39.74}
    let (status, body) = get(&format!(
        "{}?geometryType=GeometryPoint&geometry=%7B%22x%22%3A-104.99%2C%22y%22%3A39.74%7D",
        QUERY
    ))
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Denver"]);
}

#[tokio::test]
async fn test_return_geometry_false_omits_geometry() {
    let (status, body) = get(&format!(
        "{}?geometryType=GeometryEnvelope&geometry=-180,-90,180,90&returnGeometry=false",
        QUERY
    ))
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body).len(), 3);
    assert!(body.get("geometryType").is_none());
    assert!(body["features"][0].get("geometry").is_none());
}

#[tokio::test]
async fn test_missing_geometry_is_bad_request() {
    let (status, body) = get(&format!("{}?geometryType=GeometryEnvelope", QUERY)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 400);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("'geometry' and 'geometryType' parameters are mandatory"));
}

#[tokio::test]
async fn test_text_parameter_rejected() {
    let (status, body) = get(&format!(
        "{}?geometryType=GeometryPoint&geometry=1,2&text=Austin",
        QUERY
    ))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("text"));
}

#[tokio::test]
async fn test_invalid_return_geometry() {
    let (status, body) = get(&format!(
        "{}?geometryType=GeometryPoint&geometry=1,2&returnGeometry=maybe",
        QUERY
    ))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let details = body["error"]["details"].as_array().unwrap();
    assert!(details.iter().any(|d| d == "value: maybe"));
}

#[tokio::test]
async fn test_unparseable_geometry() {
    let (status, body) = get(&format!(
        "{}?geometryType=GeometryEnvelope&geometry=1,2,3",
        QUERY
    ))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let details = body["error"]["details"].as_array().unwrap();
    assert!(details.iter().any(|d| d == "geometry: 1,2,3"));
}

#[tokio::test]
async fn test_invalid_where() {
    let (status, body) = get(&format!(
        "{}?geometryType=GeometryPoint&geometry=1,2&where=pop%20%3E",
        QUERY
    ))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("where parameter must be valid CQL"));
}

#[tokio::test]
async fn test_query_uses_layer_geometry_property() {
    let (status, body) = get(
        "/gsr/services/cadastre/MapServer/parcels/query?geometryType=GeometryPoint&geometry=1,1",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["lot 1"]);
    assert_eq!(body["geometryType"], "esriGeometryPolygon");
    assert!(body.get("spatialReference").is_none());
}

#[tokio::test]
async fn test_unknown_layer() {
    let (status, body) = get(
        "/gsr/services/topp/MapServer/nope/query?geometryType=GeometryPoint&geometry=1,2",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("\"topp:nope\""));
}

#[tokio::test]
async fn test_format_checked_before_layer() {
    let (status, _) = get("/gsr/services/topp/MapServer/nope/query?f=html").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&format!(
        "{}?f=json&geometryType=GeometryPoint&geometry=1,2",
        QUERY
    ))
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_and_ready() {
    let (status, body) = get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = get("/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["layers"], 2);
}

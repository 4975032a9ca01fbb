//! Filter evaluation through the feature source interface.

use std::io::Write;

use feature_store::{Catalog, Feature, FeatureLayer, FeatureSource};
use geo::{polygon, LineString, Point};
use gsr_protocol::{QueryPlan, Filter};

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn cities() -> FeatureLayer {
    FeatureLayer::new("topp", "cities", "the_geom").with_features(vec![
        Feature::new()
            .with_attribute("name", "Austin")
            .with_attribute("pop", 960_000)
            .with_geometry(Point::new(-97.74, 30.27)),
        Feature::new()
            .with_attribute("name", "Denver")
            .with_attribute("pop", 715_000)
            .with_geometry(Point::new(-104.99, 39.74)),
        Feature::new()
            .with_attribute("name", "Boise")
            .with_attribute("pop", serde_json::Value::Null)
            .with_geometry(Point::new(-116.2, 43.6)),
        Feature::new().with_attribute("name", "Nowhere"),
    ])
}

async fn names(layer: &FeatureLayer, filter: &Filter) -> Vec<String> {
    layer
        .features(filter)
        .await
        .unwrap()
        .iter()
        .map(|f| f.attribute("name").and_then(|v| v.as_str()).unwrap_or("").to_string())
        .collect()
}

async fn query(layer: &FeatureLayer, params: &[(&str, &str)]) -> Vec<String> {
    let plan = QueryPlan::build(&pairs(params), layer.geometry_property()).unwrap();
    names(layer, &plan.filter).await
}

#[tokio::test]
async fn test_envelope_selects_points_inside() {
    let layer = cities();
    let found = query(
        &layer,
        &[("geometryType", "GeometryEnvelope"), ("geometry", "-110,25,-90,42")],
    )
    .await;
    assert_eq!(found, vec!["Austin", "Denver"]);
}

#[tokio::test]
async fn test_envelope_with_attribute_filter() {
    let layer = cities();
    let found = query(
        &layer,
        &[
            ("geometryType", "GeometryEnvelope"),
            ("geometry", "-180,-90,180,90"),
            ("where", "pop > 800000"),
        ],
    )
    .await;
    assert_eq!(found, vec!["Austin"]);
}

#[tokio::test]
async fn test_null_attribute_only_matches_is_null() {
    let layer = cities();
    let everywhere = [("geometryType", "GeometryEnvelope"), ("geometry", "-180,-90,180,90")];

    let mut not_equal = everywhere.to_vec();
    not_equal.push(("where", "pop <> 1"));
    assert_eq!(query(&layer, &not_equal).await, vec!["Austin", "Denver"]);

    let mut is_null = everywhere.to_vec();
    is_null.push(("where", "pop IS NULL"));
    assert_eq!(query(&layer, &is_null).await, vec!["Boise"]);
}

#[tokio::test]
async fn test_point_query_hits_exact_location() {
    let layer = cities();
    let found = query(
        &layer,
        &[("geometryType", "GeometryPoint"), ("geometry", "-104.99,39.74")],
    )
    .await;
    assert_eq!(found, vec!["Denver"]);
}

#[tokio::test]
async fn test_polygon_query() {
    let layer = FeatureLayer::new("ws", "parcels", "shape").with_features(vec![
        Feature::new()
            .with_attribute("name", "square")
            .with_geometry(polygon![
                (x: 0.0, y: 0.0),
                (x: 2.0, y: 0.0),
                (x: 2.0, y: 2.0),
                (x: 0.0, y: 2.0),
                (x: 0.0, y: 0.0),
            ]),
        Feature::new()
            .with_attribute("name", "far line")
            .with_geometry(LineString::from(vec![(10.0, 10.0), (11.0, 11.0)])),
    ]);

    let ring = r#"{"rings": [[[1, 1], [1, 3], [3, 3], [3, 1], [1, 1]]]}"#;
    let found = query(
        &layer,
        &[("geometryType", "GeometryPolygon"), ("geometry", ring)],
    )
    .await;
    assert_eq!(found, vec!["square"]);
}

#[tokio::test]
async fn test_spatial_filter_on_other_property_matches_nothing() {
    let layer = cities();
    let filter = Filter::BBox {
        property: "other_geom".to_string(),
        min_x: -180.0,
        min_y: -90.0,
        max_x: 180.0,
        max_y: 90.0,
        srs: None,
    };
    assert!(names(&layer, &filter).await.is_empty());
}

#[tokio::test]
async fn test_like_and_in_and_between() {
    let layer = cities();
    let everywhere = [("geometryType", "GeometryEnvelope"), ("geometry", "-180,-90,180,90")];

    let mut like = everywhere.to_vec();
    like.push(("where", "name ILIKE 'd%'"));
    assert_eq!(query(&layer, &like).await, vec!["Denver"]);

    let mut within = everywhere.to_vec();
    within.push(("where", "name IN ('Boise', 'Austin')"));
    assert_eq!(query(&layer, &within).await, vec!["Austin", "Boise"]);

    let mut between = everywhere.to_vec();
    between.push(("where", "pop BETWEEN 700000 AND 800000"));
    assert_eq!(query(&layer, &between).await, vec!["Denver"]);

    let mut negated = everywhere.to_vec();
    negated.push(("where", "NOT name = 'Austin'"));
    assert_eq!(query(&layer, &negated).await, vec!["Denver", "Boise"]);
}

#[tokio::test]
async fn test_load_file_into_catalog() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "spatialReference": {{ "wkid": 4326 }},
            "features": [
                {{ "attributes": {{ "id": 1 }}, "geometry": {{ "x": 5, "y": 5 }} }},
                {{ "attributes": {{ "id": 2 }}, "geometry": {{ "x": 50, "y": 50 }} }}
            ]
        }}"#
    )
    .unwrap();

    let layer = FeatureLayer::new("ws", "pts", "geom")
        .load_file(file.path())
        .unwrap();
    let mut catalog = Catalog::new();
    catalog.register(layer).unwrap();

    let layer = catalog.get_layer("ws", "pts").unwrap();
    assert_eq!(layer.wkid(), Some(4326));

    let plan = QueryPlan::build(
        &pairs(&[("geometryType", "GeometryEnvelope"), ("geometry", "0,0,10,10")]),
        layer.geometry_property(),
    )
    .unwrap();
    let selected = layer.features(&plan.filter).await.unwrap();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].attribute("id"), Some(&serde_json::json!(1)));
}

#[tokio::test]
async fn test_load_missing_file_is_io_error() {
    let result = FeatureLayer::new("ws", "pts", "geom")
        .load_file(std::path::Path::new("/nonexistent/layer.json"));
    assert!(matches!(result, Err(feature_store::StoreError::Io(_))));
}

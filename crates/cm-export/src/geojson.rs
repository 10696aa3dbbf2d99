//! GeoJSON export.
//!
//! Roads become `LineString` features (a `Point` when they have a single
//! vertex), intersections become `Point` features.  Coordinates are
//! `[lng, lat]` per RFC 7946.  Every feature carries a `kind` property
//! (`"road"`, `"intersection"` or `"cell"`).

use std::fs;
use std::path::Path;

use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value, feature::Id};
use serde_json::json;

use cm_cell::CellId;
use cm_core::GeoPoint;
use cm_store::{CellRecord, Intersection, RoadSegment};

use crate::ExportResult;

fn position(p: GeoPoint) -> Vec<f64> {
    vec![p.lng, p.lat]
}

fn feature(id: String, geometry: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox:            None,
        geometry:        Some(Geometry::new(geometry)),
        id:              Some(Id::String(id)),
        properties:      Some(properties),
        foreign_members: None,
    }
}

/// Feature for one road.  `None` for a road without vertices.
pub fn road_feature(segment: &RoadSegment) -> Option<Feature> {
    let geometry = match segment.vertices.as_slice() {
        [] => return None,
        [p] => Value::Point(position(*p)),
        vs => Value::LineString(vs.iter().copied().map(position).collect()),
    };

    let m = &segment.metadata;
    let mut properties = JsonObject::new();
    properties.insert("kind".to_string(), json!("road"));
    properties.insert("road_id".to_string(), json!(segment.id.get()));
    properties.insert("name".to_string(), json!(m.name));
    properties.insert("highway".to_string(), json!(m.road_class));
    properties.insert("oneway".to_string(), json!(m.oneway));
    properties.insert("maxspeed_kph".to_string(), json!(m.speed_limit_kph));
    properties.insert("lanes".to_string(), json!(m.lanes));
    properties.insert("length_m".to_string(), json!(segment.length_m()));

    Some(feature(segment.id.to_string(), geometry, properties))
}

pub fn intersection_feature(intersection: &Intersection) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("kind".to_string(), json!("intersection"));
    properties.insert("node_id".to_string(), json!(intersection.node.get()));
    properties.insert(
        "roads".to_string(),
        json!(intersection.roads.iter().map(|r| r.get()).collect::<Vec<_>>()),
    );
    feature(intersection.node.to_string(), Value::Point(position(intersection.point)), properties)
}

/// Outline of a cell as a closed polygon ring.
pub fn cell_feature(cell: CellId) -> Feature {
    let b = cell.bounds();
    let ring = vec![
        vec![b.min_lng, b.min_lat],
        vec![b.max_lng, b.min_lat],
        vec![b.max_lng, b.max_lat],
        vec![b.min_lng, b.max_lat],
        vec![b.min_lng, b.min_lat],
    ];
    let mut properties = JsonObject::new();
    properties.insert("kind".to_string(), json!("cell"));
    properties.insert("token".to_string(), json!(cell.to_token()));
    properties.insert("level".to_string(), json!(cell.level()));
    feature(cell.to_token(), Value::Polygon(vec![ring]), properties)
}

/// Features for a set of roads and intersections.
pub fn feature_collection<'a>(
    roads: impl IntoIterator<Item = &'a RoadSegment>,
    intersections: impl IntoIterator<Item = &'a Intersection>,
) -> FeatureCollection {
    let features = roads
        .into_iter()
        .filter_map(road_feature)
        .chain(intersections.into_iter().map(intersection_feature))
        .collect();
    FeatureCollection { bbox: None, features, foreign_members: None }
}

/// A cell's outline followed by its roads and intersections.
pub fn cell_feature_collection(cell: CellId, record: &CellRecord) -> FeatureCollection {
    let mut fc = feature_collection(record.roads().values(), record.intersections());
    fc.features.insert(0, cell_feature(cell));
    fc
}

/// Write a feature collection as pretty-printed GeoJSON.
pub fn write_geojson(path: &Path, collection: FeatureCollection) -> ExportResult<()> {
    let geojson = GeoJson::from(collection);
    fs::write(path, serde_json::to_string_pretty(&geojson)?)?;
    Ok(())
}

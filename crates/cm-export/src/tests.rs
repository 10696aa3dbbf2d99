//! Integration tests for cm-export.

use std::collections::BTreeSet;

use cm_cell::CellId;
use cm_core::{GeoPoint, OsmNodeId, RoadId};
use cm_store::{Intersection, RoadSegment, SegmentStore, Tags};

const LEVEL: u8 = 15;

fn tags(pairs: &[(&str, &str)]) -> Tags {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn segment(id: i64, name: &str, vertices: &[GeoPoint]) -> RoadSegment {
    RoadSegment::new(
        RoadId(id),
        (0..vertices.len() as i64).map(|k| OsmNodeId(id * 100 + k)).collect(),
        vertices.to_vec(),
        tags(&[("highway", "primary"), ("name", name), ("maxspeed", "50"), ("oneway", "yes")]),
    )
}

/// Two cells: one with two roads and an intersection, one with one road.
fn store() -> (SegmentStore, CellId, CellId) {
    let p = GeoPoint::new(48.8566, 2.3522);
    let q = GeoPoint::new(48.8700, 2.3700);
    let a = CellId::from_point(p, LEVEL).unwrap();
    let b = CellId::from_point(q, LEVEL).unwrap();
    let mut s = SegmentStore::new(LEVEL).unwrap();
    s.upsert_road(a, segment(1, "Rue de Rivoli", &[p, GeoPoint::new(48.8570, 2.3530)])).unwrap();
    s.upsert_road(a, segment(2, "Pont Neuf", &[p])).unwrap();
    s.upsert_road(b, segment(3, "Rue Saint-Denis", &[q, GeoPoint::new(48.8710, 2.3700)])).unwrap();
    s.add_intersection(a, Intersection {
        node:  OsmNodeId(100),
        point: p,
        roads: BTreeSet::from([RoadId(1), RoadId(2)]),
        tags:  Tags::new(),
    })
    .unwrap();
    (s, a, b)
}

#[cfg(test)]
mod csv_tests {
    use tempfile::TempDir;

    use super::*;
    use crate::csv::CsvWriter;
    use crate::export::export_store;
    use crate::writer::ExportWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    #[test]
    fn csv_files_created() {
        let dir = tmp();
        let _w = CsvWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("roads.csv").exists());
        assert!(dir.path().join("cells.csv").exists());
    }

    #[test]
    fn csv_finish_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }

    #[test]
    fn export_writes_one_row_per_road_per_cell() {
        let dir = tmp();
        let (s, a, _) = store();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        let summary = export_store(&s, &mut w).unwrap();
        assert_eq!(summary.cells, 2);
        assert_eq!(summary.roads, 3);

        let mut rdr = csv::Reader::from_path(dir.path().join("roads.csv")).unwrap();
        let headers: Vec<_> = rdr.headers().unwrap().iter().map(str::to_owned).collect();
        assert_eq!(headers[..4], ["cell", "road_id", "name", "road_class"]);

        let records: Vec<csv::StringRecord> = rdr.records().map(Result::unwrap).collect();
        assert_eq!(records.len(), 3);
        let rivoli = records.iter().find(|r| &r[1] == "1").unwrap();
        assert_eq!(&rivoli[0], a.to_token());
        assert_eq!(&rivoli[2], "Rue de Rivoli");
        assert_eq!(&rivoli[4], "1");
        assert_eq!(&rivoli[5], "50");
        assert_eq!(&rivoli[6], "");
        assert_eq!(&rivoli[7], "2");

        let mut cells = csv::Reader::from_path(dir.path().join("cells.csv")).unwrap();
        let rows: Vec<csv::StringRecord> = cells.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 2);
        let first = rows.iter().find(|r| r[0] == a.0.to_string()).unwrap();
        assert_eq!(&first[1], "15");
        assert_eq!(&first[4], "2");
        assert_eq!(&first[5], "1");
    }

    #[test]
    fn empty_store_exports_headers_only() {
        let dir = tmp();
        let s = SegmentStore::new(LEVEL).unwrap();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        assert_eq!(export_store(&s, &mut w).unwrap().roads, 0);
        let mut rdr = csv::Reader::from_path(dir.path().join("roads.csv")).unwrap();
        assert_eq!(rdr.records().count(), 0);
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod sqlite_tests {
    use tempfile::TempDir;

    use super::*;
    use crate::export::export_store;
    use crate::sqlite::SqliteWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    #[test]
    fn sqlite_db_created() {
        let dir = tmp();
        let _w = SqliteWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("roads.db").exists());
    }

    #[test]
    fn sqlite_row_counts() {
        let dir = tmp();
        let (s, _, b) = store();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        export_store(&s, &mut w).unwrap();

        let conn = rusqlite::Connection::open(dir.path().join("roads.db")).unwrap();
        let roads: i64 = conn.query_row("SELECT COUNT(*) FROM roads", [], |r| r.get(0)).unwrap();
        let cells: i64 = conn.query_row("SELECT COUNT(*) FROM cells", [], |r| r.get(0)).unwrap();
        assert_eq!(roads, 3);
        assert_eq!(cells, 2);

        let cell: String = conn
            .query_row("SELECT cell FROM roads WHERE road_id = 3", [], |r| r.get(0))
            .unwrap();
        assert_eq!(cell, b.to_token());
    }

    #[test]
    fn sqlite_nulls_for_missing_metadata() {
        let dir = tmp();
        let (s, _, _) = store();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        export_store(&s, &mut w).unwrap();

        let conn = rusqlite::Connection::open(dir.path().join("roads.db")).unwrap();
        let lanes: Option<i64> = conn
            .query_row("SELECT lanes FROM roads WHERE road_id = 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(lanes, None);
    }
}

#[cfg(test)]
mod geojson_tests {
    use geojson::{GeoJson, Value};

    use super::*;
    use crate::geojson::{cell_feature_collection, feature_collection, road_feature, write_geojson};

    #[test]
    fn roads_are_lng_lat_linestrings() {
        let seg = segment(1, "Rue de Rivoli", &[GeoPoint::new(48.8566, 2.3522), GeoPoint::new(48.8570, 2.3530)]);
        let f = road_feature(&seg).unwrap();
        match f.geometry.unwrap().value {
            Value::LineString(coords) => assert_eq!(coords[0], vec![2.3522, 48.8566]),
            other => panic!("expected LineString, got {other:?}"),
        }
        let props = f.properties.unwrap();
        assert_eq!(props["kind"], "road");
        assert_eq!(props["highway"], "primary");
        assert_eq!(props["oneway"], true);
        assert_eq!(props["maxspeed_kph"], 50);
    }

    #[test]
    fn single_vertex_road_is_a_point_and_empty_road_is_skipped() {
        let point = segment(2, "Pont Neuf", &[GeoPoint::new(48.8566, 2.3522)]);
        assert!(matches!(road_feature(&point).unwrap().geometry.unwrap().value, Value::Point(_)));
        assert!(road_feature(&segment(3, "Nowhere", &[])).is_none());
    }

    #[test]
    fn cell_collection_has_outline_roads_and_intersections() {
        let (s, a, _) = store();
        let fc = cell_feature_collection(a, s.cell(a).unwrap());
        // Outline + 2 roads + 1 intersection.
        assert_eq!(fc.features.len(), 4);
        let kinds: Vec<String> = fc
            .features
            .iter()
            .map(|f| f.properties.as_ref().unwrap()["kind"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(kinds, ["cell", "road", "road", "intersection"]);

        match &fc.features[0].geometry.as_ref().unwrap().value {
            Value::Polygon(rings) => {
                assert_eq!(rings[0].len(), 5);
                assert_eq!(rings[0][0], rings[0][4]);
            }
            other => panic!("expected Polygon, got {other:?}"),
        }
    }

    #[test]
    fn written_file_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        let (s, _, b) = store();
        let path = dir.path().join("cell.geojson");
        let roads: Vec<&RoadSegment> = s.roads_in_cell(b).values().collect();
        write_geojson(&path, feature_collection(roads, std::iter::empty())).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        match text.parse::<GeoJson>().unwrap() {
            GeoJson::FeatureCollection(fc) => assert_eq!(fc.features.len(), 1),
            other => panic!("expected FeatureCollection, got {other:?}"),
        }
    }
}

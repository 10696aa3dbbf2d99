//! Unit tests for cm-fetch.

use cm_core::{BoundingBox, GeoPoint, OsmNodeId, RelationId, RoadId};

use crate::overpass;
use crate::raw::{RawRecord, RoadFilter};
use crate::{RegionFetcher, StaticFetcher};

/// Two roads crossing at node 2, a footway sharing node 4, one restriction.
const SAMPLE: &str = r#"{
  "version": 0.6,
  "elements": [
    { "type": "node", "id": 1, "lat": 37.7740, "lon": -122.4200 },
    { "type": "node", "id": 2, "lat": 37.7750, "lon": -122.4190,
      "tags": { "highway": "traffic_signals" } },
    { "type": "node", "id": 3, "lat": 37.7760, "lon": -122.4180 },
    { "type": "node", "id": 4, "lat": 37.7760, "lon": -122.4200 },
    { "type": "node", "id": 5, "lat": 37.7740, "lon": -122.4180 },
    { "type": "way", "id": 100, "nodes": [1, 2, 3],
      "tags": { "highway": "primary", "name": "Market Street" } },
    { "type": "way", "id": 200, "nodes": [4, 2, 5],
      "tags": { "highway": "residential", "name": "Oak Street" } },
    { "type": "way", "id": 300, "nodes": [4, 99],
      "tags": { "highway": "footway" } },
    { "type": "way", "id": 400, "nodes": [1, 4],
      "tags": { "building": "yes" } },
    { "type": "relation", "id": 900,
      "members": [
        { "type": "way", "ref": 100, "role": "from" },
        { "type": "node", "ref": 2, "role": "via" },
        { "type": "way", "ref": 200, "role": "to" }
      ],
      "tags": { "type": "restriction", "restriction": "no_left_turn" } },
    { "type": "relation", "id": 901, "members": [],
      "tags": { "type": "route" } },
    { "type": "area", "id": 3600000001 }
  ]
}"#;

fn sample_box() -> BoundingBox {
    BoundingBox::new(37.77, -122.43, 37.78, -122.41).unwrap()
}

#[cfg(test)]
mod overpass_reader {
    use super::*;

    #[test]
    fn keeps_only_highway_ways() {
        let region = overpass::from_str(SAMPLE).unwrap();
        let ids: Vec<RoadId> = region.roads.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![RoadId(100), RoadId(200), RoadId(300)]);
    }

    #[test]
    fn unresolved_nodes_are_dropped_in_parallel() {
        let region = overpass::from_str(SAMPLE).unwrap();
        let footway = region.roads.iter().find(|r| r.id == RoadId(300)).unwrap();
        assert_eq!(footway.nodes, vec![OsmNodeId(4)]);
        assert_eq!(footway.coords, vec![GeoPoint::new(37.7760, -122.4200)]);
    }

    #[test]
    fn only_restriction_relations_are_kept() {
        let region = overpass::from_str(SAMPLE).unwrap();
        assert_eq!(region.restrictions.len(), 1);
        let r = &region.restrictions[0];
        assert_eq!(r.id, RelationId(900));
        assert_eq!(r.ways_with_role("from").collect::<Vec<_>>(), vec![RoadId(100)]);
        assert_eq!(r.via_nodes().collect::<Vec<_>>(), vec![OsmNodeId(2)]);
    }

    #[test]
    fn intersections_are_nodes_shared_by_two_roads() {
        let region = overpass::from_str(SAMPLE).unwrap();
        let nodes: Vec<OsmNodeId> = region.intersections.iter().map(|i| i.node).collect();
        // Node 2: roads 100 + 200.  Node 4: roads 200 + 300.
        assert_eq!(nodes, vec![OsmNodeId(2), OsmNodeId(4)]);

        let signal = &region.intersections[0];
        assert_eq!(signal.roads, vec![RoadId(100), RoadId(200)]);
        assert_eq!(signal.tags.get("highway").map(String::as_str), Some("traffic_signals"));
        assert!(region.intersections[1].tags.is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(overpass::from_str("{ \"elements\": [ { \"type\": \"node\" } ] }").is_err());
        assert!(overpass::from_str("not json").is_err());
    }

    #[test]
    fn missing_elements_is_an_empty_region() {
        assert!(overpass::from_str("{}").unwrap().is_empty());
    }
}

#[cfg(test)]
mod clipping {
    use super::*;

    #[test]
    fn filter_limits_roads_but_not_restrictions() {
        let region = overpass::from_str(SAMPLE).unwrap();
        let clipped = region.clip(&sample_box(), &RoadFilter::only(["primary"]));
        assert_eq!(clipped.roads.len(), 1);
        assert_eq!(clipped.roads[0].id, RoadId(100));
        assert_eq!(clipped.restrictions.len(), 1);
        assert_eq!(clipped.intersections.len(), 2);
    }

    #[test]
    fn far_box_is_empty() {
        let region = overpass::from_str(SAMPLE).unwrap();
        let far = BoundingBox::new(51.0, -0.2, 51.1, -0.1).unwrap();
        assert!(region.clip(&far, &RoadFilter::all()).is_empty());
    }

    #[test]
    fn restriction_kept_when_its_roads_are_filtered_out() {
        let region = overpass::from_str(SAMPLE).unwrap();
        // Tiny box around node 2; roads 100 and 200 touch it but are filtered.
        let tight = BoundingBox::new(37.7749, -122.4191, 37.7751, -122.4189).unwrap();
        let clipped = region.clip(&tight, &RoadFilter::only(["motorway"]));
        assert!(clipped.roads.is_empty());
        assert_eq!(clipped.restrictions.len(), 1);
        assert_eq!(clipped.intersections.len(), 1);
    }

    #[test]
    fn road_filter_semantics() {
        assert!(RoadFilter::all().accepts("anything"));
        assert!(RoadFilter::default().classes().is_none());
        let f = RoadFilter::only(["primary", "secondary"]);
        assert!(f.accepts("secondary"));
        assert!(!f.accepts("residential"));
        assert!(!RoadFilter::only(Vec::<String>::new()).accepts("primary"));
    }
}

#[cfg(test)]
mod static_fetcher {
    use super::*;

    #[test]
    fn streams_roads_then_intersections_then_restrictions() {
        let fetcher = StaticFetcher::new(overpass::from_str(SAMPLE).unwrap());
        let records: Vec<RawRecord> = fetcher
            .fetch_region(&sample_box(), &RoadFilter::all())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        let kinds: Vec<u8> = records
            .iter()
            .map(|r| match r {
                RawRecord::Road(_) => 0,
                RawRecord::Intersection(_) => 1,
                RawRecord::Restriction(_) => 2,
            })
            .collect();
        assert_eq!(kinds, vec![0, 0, 0, 1, 1, 2]);
    }

    #[test]
    fn reads_overpass_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let fetcher = StaticFetcher::from_overpass_path(&path).unwrap();
        assert_eq!(fetcher.region().roads.len(), 3);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = StaticFetcher::from_overpass_path(std::path::Path::new("/nonexistent/x.json"));
        assert!(matches!(err, Err(crate::FetchError::Io(_))));
    }

    #[test]
    fn boxed_fetcher_delegates() {
        let boxed: Box<dyn RegionFetcher> =
            Box::new(StaticFetcher::new(overpass::from_str(SAMPLE).unwrap()));
        let n = boxed.fetch_region(&sample_box(), &RoadFilter::all()).unwrap().count();
        assert_eq!(n, 6);
    }
}

// ── PBF ───────────────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "pbf"))]
mod pbf_reader {
    use std::collections::HashMap;

    use osmpbf::RelMemberType;

    use super::*;
    use crate::pbf::{OsmWay, member_kind, resolve_way};

    #[test]
    fn member_kinds_match_overpass_names() {
        assert_eq!(member_kind(&RelMemberType::Node), "node");
        assert_eq!(member_kind(&RelMemberType::Way), "way");
        assert_eq!(member_kind(&RelMemberType::Relation), "relation");
    }

    #[test]
    fn way_refs_resolve_to_positions() {
        let positions: HashMap<i64, GeoPoint> = [
            (1, GeoPoint::new(37.7740, -122.4200)),
            (2, GeoPoint::new(37.7750, -122.4190)),
        ]
        .into_iter()
        .collect();
        let way = OsmWay {
            id:   100,
            refs: vec![1, 99, 2],
            tags: [("highway".to_string(), "primary".to_string())].into_iter().collect(),
        };

        let road = resolve_way(way, &positions);
        assert_eq!(road.id, RoadId(100));
        assert_eq!(road.nodes, vec![OsmNodeId(1), OsmNodeId(2)]);
        assert_eq!(road.coords, vec![positions[&1], positions[&2]]);
        assert_eq!(road.road_class(), "primary");
    }

    #[test]
    fn missing_file_is_an_osm_error() {
        let err = crate::pbf::read_path(std::path::Path::new("/nonexistent/extract.osm.pbf")).err().unwrap();
        assert!(matches!(err, crate::FetchError::Osm(_)), "{err}");
    }
}

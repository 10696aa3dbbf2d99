//! `RawRegion` — an in-memory batch of raw records.
//!
//! File-backed sources parse a whole extract into a `RawRegion` once and then
//! answer bounding-box requests by clipping it.

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};

use cm_core::{BoundingBox, GeoPoint, OsmNodeId, RoadId};

use crate::raw::{RawIntersection, RawRecord, RawRestriction, RawRoad, RoadFilter, Tags};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawRegion {
    pub roads:         Vec<RawRoad>,
    pub intersections: Vec<RawIntersection>,
    pub restrictions:  Vec<RawRestriction>,
}

impl RawRegion {
    /// Build a region from roads and restrictions, deriving intersections
    /// from shared road nodes.  `node_tags` supplies tags for intersection
    /// nodes when the source has them.
    pub fn from_parts(
        roads: Vec<RawRoad>,
        restrictions: Vec<RawRestriction>,
        node_tags: &FxHashMap<OsmNodeId, Tags>,
    ) -> Self {
        let intersections = derive_intersections(&roads, node_tags);
        Self { roads, intersections, restrictions }
    }

    pub fn is_empty(&self) -> bool {
        self.roads.is_empty() && self.intersections.is_empty() && self.restrictions.is_empty()
    }

    /// The subset of this region relevant to `bbox`.
    ///
    /// * roads with at least one vertex inside `bbox` whose class passes `filter`;
    /// * intersections whose point lies inside `bbox` (road references are not
    ///   filtered, matching what an Overpass node query returns);
    /// * restrictions with a way member touching `bbox` or a node member
    ///   inside it, regardless of `filter`.
    pub fn clip(&self, bbox: &BoundingBox, filter: &RoadFilter) -> RawRegion {
        let touching: Vec<&RawRoad> = self
            .roads
            .iter()
            .filter(|r| r.coords.iter().any(|p| bbox.contains(*p)))
            .collect();

        let touching_ids: FxHashSet<RoadId> = touching.iter().map(|r| r.id).collect();
        let nodes_inside: FxHashSet<OsmNodeId> = self
            .roads
            .iter()
            .flat_map(RawRoad::vertices)
            .filter(|(_, p)| bbox.contains(*p))
            .map(|(n, _)| n)
            .collect();

        let roads = touching
            .into_iter()
            .filter(|r| filter.accepts(r.road_class()))
            .cloned()
            .collect();

        let intersections = self
            .intersections
            .iter()
            .filter(|i| bbox.contains(i.point))
            .cloned()
            .collect();

        let restrictions = self
            .restrictions
            .iter()
            .filter(|r| {
                r.members.iter().any(|m| match m.kind.as_str() {
                    "way" => touching_ids.contains(&RoadId(m.reference)),
                    "node" => nodes_inside.contains(&OsmNodeId(m.reference)),
                    _ => false,
                })
            })
            .cloned()
            .collect();

        RawRegion { roads, intersections, restrictions }
    }

    /// Roads first, then intersections, then restrictions.
    pub fn into_records(self) -> impl Iterator<Item = RawRecord> {
        self.roads
            .into_iter()
            .map(RawRecord::Road)
            .chain(self.intersections.into_iter().map(RawRecord::Intersection))
            .chain(self.restrictions.into_iter().map(RawRecord::Restriction))
    }
}

/// Nodes referenced by two or more distinct roads, ascending by node id.
pub fn derive_intersections(
    roads: &[RawRoad],
    node_tags: &FxHashMap<OsmNodeId, Tags>,
) -> Vec<RawIntersection> {
    let mut usage: BTreeMap<OsmNodeId, (GeoPoint, Vec<RoadId>)> = BTreeMap::new();

    for road in roads {
        for (node, point) in road.vertices() {
            let (_, users) = usage.entry(node).or_insert_with(|| (point, Vec::new()));
            if !users.contains(&road.id) {
                users.push(road.id);
            }
        }
    }

    usage
        .into_iter()
        .filter(|(_, (_, users))| users.len() >= 2)
        .map(|(node, (point, mut roads))| {
            roads.sort_unstable();
            RawIntersection {
                node,
                point,
                roads,
                tags: node_tags.get(&node).cloned().unwrap_or_default(),
            }
        })
        .collect()
}

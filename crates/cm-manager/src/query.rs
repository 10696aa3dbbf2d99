//! Owned query results.
//!
//! Results are copies taken under the read lock, so callers can hold them
//! for as long as they like without blocking ingestion.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use cm_cell::CellId;
use cm_core::{BoundingBox, GeoPoint, OsmNodeId, RelationId, RoadId};
use cm_store::{CellRecord, Intersection, RoadSegment, SegmentStore, TurnRestriction};

/// Union of the contents of a set of cells.
///
/// A road spanning several of the cells appears once; so does an
/// intersection or restriction stored in more than one cell.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct QueryResult {
    /// Cells that contributed data, ascending.
    pub cells:         BTreeSet<CellId>,
    pub roads:         BTreeMap<RoadId, RoadSegment>,
    pub intersections: BTreeMap<OsmNodeId, Intersection>,
    pub restrictions:  BTreeMap<RelationId, TurnRestriction>,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.roads.is_empty() && self.intersections.is_empty() && self.restrictions.is_empty()
    }

    pub fn road_ids(&self) -> Vec<RoadId> {
        self.roads.keys().copied().collect()
    }

    pub(crate) fn gather(store: &SegmentStore, cells: impl IntoIterator<Item = CellId>) -> Self {
        let mut result = QueryResult::default();
        for cell in cells {
            if let Some(record) = store.cell(cell) {
                result.absorb(cell, record);
            }
        }
        result
    }

    fn absorb(&mut self, cell: CellId, record: &CellRecord) {
        self.cells.insert(cell);
        for (&id, segment) in record.roads() {
            self.roads.entry(id).or_insert_with(|| segment.clone());
        }
        for i in record.intersections() {
            self.intersections.entry(i.node).or_insert_with(|| i.clone());
        }
        for r in record.restrictions() {
            self.restrictions.entry(r.id).or_insert_with(|| r.clone());
        }
    }
}

/// Answer to a point query.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PointQuery {
    /// Cell containing the point.
    pub cell:   CellId,
    pub center: GeoPoint,
    pub bounds: BoundingBox,
    /// Contents of `cell` and its neighbours.
    pub result: QueryResult,
}

/// One hit of a nearest-road search.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoadHit {
    /// Distance from the query point to the road's nearest vertex.
    pub distance_m: f64,
    pub vertex:     GeoPoint,
    pub road:       RoadSegment,
}

//! Nearest-road lookup ("snap to road").
//!
//! An R-tree (via `rstar`) over the vertices of every road in the query
//! point's cell and its neighbours.  Vertices are projected to
//! `[lat, lng · cos(lat₀)]` with `lat₀` the query latitude, so squared
//! Euclidean distance tracks ground distance closely at cell scale.  Vertex
//! longitudes are first shifted by ±360° onto the query's side of the
//! antimeridian.  Hits are reported with exact haversine distances.

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::{FxHashMap, FxHashSet};

use cm_core::{GeoPoint, RoadId};
use cm_fetch::RegionFetcher;
use cm_store::RoadSegment;

use crate::query::RoadHit;
use crate::{ManagerResult, MapManager};

struct VertexEntry {
    point:  [f64; 2], // [lat, lng · cos(lat₀)]
    vertex: GeoPoint,
    road:   RoadId,
}

impl RTreeObject for VertexEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for VertexEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let d_lat = self.point[0] - point[0];
        let d_lng = self.point[1] - point[1];
        d_lat * d_lat + d_lng * d_lng
    }
}

impl<F: RegionFetcher> MapManager<F> {
    /// Up to `k` distinct roads nearest to `(lat, lng)`, closest first.
    ///
    /// Only roads indexed in the point's cell or its neighbours are
    /// considered; an empty neighbourhood yields an empty list.
    pub fn nearest_roads(&self, lat: f64, lng: f64, k: usize) -> ManagerResult<Vec<RoadHit>> {
        let cell = self.index.cell_id(lat, lng)?;
        if k == 0 {
            return Ok(Vec::new());
        }
        let origin = GeoPoint::new(lat, lng);
        let scale = lat.to_radians().cos();

        // Copy candidate roads out under the read lock; build the tree after.
        let roads: FxHashMap<RoadId, RoadSegment> = self.with_store(|s| {
            let mut roads = FxHashMap::default();
            for c in self.index.with_neighbors(cell) {
                for (&id, seg) in s.roads_in_cell(c) {
                    roads.entry(id).or_insert_with(|| seg.clone());
                }
            }
            roads
        })?;

        let entries: Vec<VertexEntry> = roads
            .values()
            .flat_map(|seg| {
                let road = seg.id;
                seg.vertices
                    .iter()
                    .map(move |&v| VertexEntry {
                        point:  [v.lat, unwrap_lng(v.lng, lng) * scale],
                        vertex: v,
                        road,
                    })
            })
            .collect();
        let tree = RTree::bulk_load(entries);

        let mut seen = FxHashSet::default();
        let mut hits: Vec<RoadHit> = Vec::with_capacity(k);
        for entry in tree.nearest_neighbor_iter(&[lat, lng * scale]) {
            if !seen.insert(entry.road) {
                continue;
            }
            hits.push(RoadHit {
                distance_m: origin.distance_m(entry.vertex),
                vertex:     entry.vertex,
                road:       roads[&entry.road].clone(),
            });
            if hits.len() == k {
                break;
            }
        }
        hits.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        Ok(hits)
    }
}

/// `lng` shifted by a whole turn so it lies within 180° of `reference`.
fn unwrap_lng(lng: f64, reference: f64) -> f64 {
    let d = lng - reference;
    if d > 180.0 {
        lng - 360.0
    } else if d < -180.0 {
        lng + 360.0
    } else {
        lng
    }
}

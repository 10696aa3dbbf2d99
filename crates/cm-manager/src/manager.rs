//! `MapManager` — the query and coordination layer.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use cm_cell::{CellId, CellIndex, Covering};
use cm_core::{BoundingBox, GeoPoint, MapConfig, RoadId};
use cm_fetch::RegionFetcher;
use cm_store::{CellRecord, RoadSegment, SegmentStore, StoreStats, TurnRestriction};

use crate::query::{PointQuery, QueryResult};
use crate::{ManagerError, ManagerResult, MapManagerBuilder};

/// Ties a [`CellIndex`], a [`RegionFetcher`] and a [`SegmentStore`]
/// together.
///
/// The store sits behind an `RwLock`: every committed record, `load` swap
/// and `clear` takes the write lock briefly; queries and `save` take the read
/// lock.  Fetching and snapshot decoding happen outside the lock, so readers
/// are only ever blocked for the duration of a single commit.
///
/// Writers additionally serialise on a gate: a region load holds it from
/// its first commit to its last, and `load`, `save` and `clear` take it too,
/// so none of them lands in the middle of an ingestion.  Readers never touch
/// the gate.
pub struct MapManager<F: RegionFetcher> {
    pub(crate) config:  MapConfig,
    pub(crate) index:   CellIndex,
    pub(crate) fetcher: F,
    pub(crate) store:   RwLock<SegmentStore>,
    pub(crate) writer:  Mutex<()>,
}

impl<F: RegionFetcher> MapManager<F> {
    /// Manager with an empty store.  Shorthand for
    /// `MapManagerBuilder::new(config, fetcher).build()`.
    pub fn new(config: MapConfig, fetcher: F) -> ManagerResult<Self> {
        MapManagerBuilder::new(config, fetcher).build()
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn index(&self) -> CellIndex {
        self.index
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub(crate) fn read(&self) -> ManagerResult<RwLockReadGuard<'_, SegmentStore>> {
        self.store.read().map_err(|_| ManagerError::LockPoisoned)
    }

    pub(crate) fn write(&self) -> ManagerResult<RwLockWriteGuard<'_, SegmentStore>> {
        self.store.write().map_err(|_| ManagerError::LockPoisoned)
    }

    /// Exclusive access among writers.  Not reentrant.
    pub(crate) fn exclusive(&self) -> ManagerResult<MutexGuard<'_, ()>> {
        self.writer.lock().map_err(|_| ManagerError::LockPoisoned)
    }

    /// Run `f` against the store under the read lock.
    pub fn with_store<T>(&self, f: impl FnOnce(&SegmentStore) -> T) -> ManagerResult<T> {
        let store = self.read()?;
        Ok(f(&store))
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// The cell containing `(lat, lng)` and the contents of that cell and
    /// its neighbours, so that a point near a cell edge sees roads on both
    /// sides.
    pub fn query_point(&self, lat: f64, lng: f64) -> ManagerResult<PointQuery> {
        let cell = self.index.cell_id(lat, lng)?;
        let cells = self.index.with_neighbors(cell);
        let store = self.read()?;
        let result = QueryResult::gather(&store, cells);
        drop(store);
        Ok(PointQuery {
            cell,
            center: self.index.cell_center(cell),
            bounds: self.index.cell_bounds(cell),
            result,
        })
    }

    /// Contents of every cell covering `bbox`.
    pub fn query_bbox(&self, bbox: &BoundingBox) -> ManagerResult<QueryResult> {
        let covering = self.index.covering_for_bbox(bbox)?;
        self.query_covering(&covering)
    }

    /// Contents of every cell covering the circle of `radius_m` around
    /// `(lat, lng)`.
    pub fn query_radius(&self, lat: f64, lng: f64, radius_m: f64) -> ManagerResult<QueryResult> {
        let covering = self.index.covering_for_radius(lat, lng, radius_m)?;
        self.query_covering(&covering)
    }

    fn query_covering(&self, covering: &Covering) -> ManagerResult<QueryResult> {
        let store = self.read()?;
        // Walk whichever side is smaller: the covering or the occupied cells.
        let result = if covering.len() <= store.cell_count() as u64 {
            QueryResult::gather(&store, covering.cells())
        } else {
            let hits: Vec<CellId> = store.cell_ids().filter(|&c| covering.contains(c)).collect();
            QueryResult::gather(&store, hits)
        };
        Ok(result)
    }

    // ── Attribute queries ─────────────────────────────────────────────────

    pub fn find_road_by_id(&self, road: RoadId) -> ManagerResult<Option<(CellId, RoadSegment)>> {
        self.with_store(|s| s.find_road_by_id(road).map(|(c, seg)| (c, seg.clone())))
    }

    /// Case-insensitive name search, ordered by `(cell, road id)`.
    pub fn roads_by_name(&self, needle: &str) -> ManagerResult<Vec<(CellId, RoadSegment)>> {
        self.with_store(|s| owned(s.roads_by_name(needle)))
    }

    pub fn roads_by_type(&self, road_class: &str) -> ManagerResult<Vec<(CellId, RoadSegment)>> {
        self.with_store(|s| owned(s.roads_by_type(road_class)))
    }

    /// Restrictions naming both roads as way members, ordered by relation id.
    pub fn route_restrictions(&self, from: RoadId, to: RoadId) -> ManagerResult<Vec<TurnRestriction>> {
        self.with_store(|s| s.restrictions_between(from, to).into_iter().cloned().collect())
    }

    /// A copy of one cell's record.
    pub fn cell_contents(&self, cell: CellId) -> ManagerResult<Option<CellRecord>> {
        self.with_store(|s| s.cell(cell).cloned())
    }

    pub fn cell_ids(&self) -> ManagerResult<Vec<CellId>> {
        self.with_store(|s| s.cell_ids().collect())
    }

    pub fn statistics(&self) -> ManagerResult<StoreStats> {
        self.with_store(SegmentStore::statistics)
    }

    /// Cell containing `p` at the manager's level.
    pub fn cell_of(&self, p: GeoPoint) -> ManagerResult<CellId> {
        Ok(self.index.cell_of(p)?)
    }

    /// Drop every record.
    pub fn clear(&self) -> ManagerResult<()> {
        let _gate = self.exclusive()?;
        self.write()?.clear();
        Ok(())
    }
}

fn owned(hits: Vec<(CellId, &RoadSegment)>) -> Vec<(CellId, RoadSegment)> {
    hits.into_iter().map(|(c, seg)| (c, seg.clone())).collect()
}

//! `SegmentStore` — the cell → records map and its secondary indexes.
//!
//! # Indexes
//!
//! | Index                  | Key              | Value                      |
//! |------------------------|------------------|----------------------------|
//! | `by_name`              | lower-case name  | `(cell, road)` pairs       |
//! | `by_class`             | `highway` value  | `(cell, road)` pairs       |
//! | `road_cells`           | road id          | cells holding the road     |
//! | `restrictions_by_road` | road id          | cells holding restrictions |
//!
//! Every mutation updates records and indexes inside the same `&mut self`
//! call, so a reader holding `&SegmentStore` never sees them disagree.  An
//! index entry pointing at a missing record is a bug, not bad input, and
//! panics.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{SystemTime, UNIX_EPOCH};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use cm_cell::CellId;
use cm_core::{CoreError, MAX_LEVEL, RelationId, RoadId};

use crate::model::{Intersection, RoadSegment, TurnRestriction};
use crate::{StoreError, StoreResult};

static NO_ROADS: BTreeMap<RoadId, RoadSegment> = BTreeMap::new();

// ── CellRecord ────────────────────────────────────────────────────────────────

/// Bookkeeping kept alongside each cell's contents.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CellMeta {
    pub road_count:             usize,
    /// Unix seconds of the last mutation of this cell.
    pub last_updated_unix_secs: u64,
}

/// Everything stored for one cell.  Created on first insert and never
/// removed individually.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    roads:         BTreeMap<RoadId, RoadSegment>,
    intersections: Vec<Intersection>,
    restrictions:  Vec<TurnRestriction>,
    meta:          CellMeta,
}

impl CellRecord {
    pub fn roads(&self) -> &BTreeMap<RoadId, RoadSegment> {
        &self.roads
    }

    pub fn intersections(&self) -> &[Intersection] {
        &self.intersections
    }

    pub fn restrictions(&self) -> &[TurnRestriction] {
        &self.restrictions
    }

    pub fn meta(&self) -> &CellMeta {
        &self.meta
    }

    pub fn is_empty(&self) -> bool {
        self.roads.is_empty() && self.intersections.is_empty() && self.restrictions.is_empty()
    }

    pub(crate) fn is_consistent(&self) -> bool {
        self.meta.road_count == self.roads.len() && self.roads.iter().all(|(id, seg)| *id == seg.id)
    }

    fn touch(&mut self) {
        self.meta.road_count = self.roads.len();
        self.meta.last_updated_unix_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
    }
}

// ── Indexes ───────────────────────────────────────────────────────────────────

/// Secondary indexes.  Always derivable from the cell map; snapshots carry
/// them anyway so a decoder can detect disagreement.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Indexes {
    by_name:              BTreeMap<String, BTreeSet<(CellId, RoadId)>>,
    by_class:             BTreeMap<String, BTreeSet<(CellId, RoadId)>>,
    road_cells:           FxHashMap<RoadId, BTreeSet<CellId>>,
    restrictions_by_road: FxHashMap<RoadId, BTreeSet<CellId>>,
}

impl Indexes {
    pub(crate) fn rebuild(cells: &BTreeMap<CellId, CellRecord>) -> Self {
        let mut idx = Indexes::default();
        for (&cell, record) in cells {
            for segment in record.roads.values() {
                idx.add_road(cell, segment);
            }
            for restriction in &record.restrictions {
                idx.add_restriction(cell, restriction);
            }
        }
        idx
    }

    fn add_road(&mut self, cell: CellId, segment: &RoadSegment) {
        let key = (cell, segment.id);
        if let Some(name) = &segment.metadata.name {
            self.by_name.entry(name.to_lowercase()).or_default().insert(key);
        }
        self.by_class
            .entry(segment.metadata.road_class.clone())
            .or_default()
            .insert(key);
        self.road_cells.entry(segment.id).or_default().insert(cell);
    }

    fn remove_road(&mut self, cell: CellId, segment: &RoadSegment) {
        let key = (cell, segment.id);
        if let Some(name) = &segment.metadata.name {
            remove_pair(&mut self.by_name, &name.to_lowercase(), key);
        }
        remove_pair(&mut self.by_class, &segment.metadata.road_class, key);
        if let Some(cells) = self.road_cells.get_mut(&segment.id) {
            cells.remove(&cell);
            if cells.is_empty() {
                self.road_cells.remove(&segment.id);
            }
        }
    }

    fn add_restriction(&mut self, cell: CellId, restriction: &TurnRestriction) {
        for road in restriction.roads() {
            self.restrictions_by_road.entry(road).or_default().insert(cell);
        }
    }
}

fn remove_pair(index: &mut BTreeMap<String, BTreeSet<(CellId, RoadId)>>, key: &str, pair: (CellId, RoadId)) {
    if let Some(set) = index.get_mut(key) {
        set.remove(&pair);
        if set.is_empty() {
            index.remove(key);
        }
    }
}

// ── StoreStats ────────────────────────────────────────────────────────────────

/// Counts computed from the current store contents.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    pub cell_count:         usize,
    /// Road entries summed over cells; a road spanning two cells counts twice.
    pub road_count:         usize,
    pub unique_road_count:  usize,
    pub intersection_count: usize,
    pub restriction_count:  usize,
    pub avg_roads_per_cell: f64,
}

// ── SegmentStore ──────────────────────────────────────────────────────────────

/// Per-cell road data at a single, fixed cell level.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentStore {
    pub(crate) level:   u8,
    pub(crate) cells:   BTreeMap<CellId, CellRecord>,
    pub(crate) indexes: Indexes,
}

impl SegmentStore {
    /// Empty store for cells of `level`.
    pub fn new(level: u8) -> StoreResult<Self> {
        if level > MAX_LEVEL {
            return Err(CoreError::InvalidLevel(level).into());
        }
        Ok(Self { level, cells: BTreeMap::new(), indexes: Indexes::default() })
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn check_cell(&self, cell: CellId) -> StoreResult<()> {
        if !cell.is_valid() {
            return Err(StoreError::invalid_cell(cell));
        }
        if cell.level() != self.level {
            return Err(StoreError::LevelMismatch { expected: self.level, found: cell.level() });
        }
        Ok(())
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Insert `segment` into `cell`, replacing any road with the same id
    /// there.  Inserting the same segment twice leaves contents and indexes
    /// as after the first insert.
    pub fn upsert_road(&mut self, cell: CellId, segment: RoadSegment) -> StoreResult<()> {
        self.check_cell(cell)?;

        let record = self.cells.entry(cell).or_default();
        if let Some(old) = record.roads.remove(&segment.id) {
            self.indexes.remove_road(cell, &old);
        }
        self.indexes.add_road(cell, &segment);
        record.roads.insert(segment.id, segment);
        record.touch();
        Ok(())
    }

    /// Insert `segment` into every cell of `cells` and retract it from any
    /// cell it previously occupied that is not in `cells`.
    pub fn upsert_road_cells(&mut self, cells: &BTreeSet<CellId>, segment: RoadSegment) -> StoreResult<()> {
        for &cell in cells {
            self.check_cell(cell)?;
        }

        let stale: Vec<CellId> = self
            .cells_of_road(segment.id)
            .into_iter()
            .filter(|c| !cells.contains(c))
            .collect();
        for cell in stale {
            self.retract_road(cell, segment.id);
        }

        for &cell in cells {
            self.upsert_road(cell, segment.clone())?;
        }
        Ok(())
    }

    fn retract_road(&mut self, cell: CellId, road: RoadId) {
        let record = self
            .cells
            .get_mut(&cell)
            .unwrap_or_else(|| panic!("road index references missing cell {cell}"));
        if let Some(old) = record.roads.remove(&road) {
            self.indexes.remove_road(cell, &old);
            record.touch();
        }
    }

    /// Add an intersection to `cell`.  Returns `false` (and changes
    /// nothing) if the cell already holds an intersection at that node.
    pub fn add_intersection(&mut self, cell: CellId, intersection: Intersection) -> StoreResult<bool> {
        self.check_cell(cell)?;
        let record = self.cells.entry(cell).or_default();
        if record.intersections.iter().any(|i| i.node == intersection.node) {
            return Ok(false);
        }
        record.intersections.push(intersection);
        record.touch();
        Ok(true)
    }

    /// Add a turn restriction to `cell`.  Returns `false` (and changes
    /// nothing) if the cell already holds a restriction with that id.
    pub fn add_turn_restriction(&mut self, cell: CellId, restriction: TurnRestriction) -> StoreResult<bool> {
        self.check_cell(cell)?;
        let record = self.cells.entry(cell).or_default();
        if record.restrictions.iter().any(|r| r.id == restriction.id) {
            return Ok(false);
        }
        self.indexes.add_restriction(cell, &restriction);
        record.restrictions.push(restriction);
        record.touch();
        Ok(true)
    }

    /// Remove everything.  The level is kept.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.indexes = Indexes::default();
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn cell(&self, cell: CellId) -> Option<&CellRecord> {
        self.cells.get(&cell)
    }

    /// All occupied cells with their records, ascending by cell id.
    pub fn cells(&self) -> impl Iterator<Item = (CellId, &CellRecord)> + '_ {
        self.cells.iter().map(|(&c, r)| (c, r))
    }

    pub fn cell_ids(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cells.keys().copied()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Roads stored in `cell`; empty for an unknown cell.
    pub fn roads_in_cell(&self, cell: CellId) -> &BTreeMap<RoadId, RoadSegment> {
        self.cells.get(&cell).map_or(&NO_ROADS, |r| &r.roads)
    }

    /// A road by id, from the lowest-numbered cell holding it.
    pub fn find_road_by_id(&self, road: RoadId) -> Option<(CellId, &RoadSegment)> {
        let cell = *self.indexes.road_cells.get(&road)?.first()?;
        Some((cell, self.road_at(cell, road)))
    }

    /// Every cell holding `road`, ascending.
    pub fn cells_of_road(&self, road: RoadId) -> Vec<CellId> {
        self.indexes
            .road_cells
            .get(&road)
            .map(|cells| cells.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Roads whose name contains `needle`, case-insensitively, ordered by
    /// `(cell, road id)`.  A road spanning several cells appears once per cell.
    pub fn roads_by_name(&self, needle: &str) -> Vec<(CellId, &RoadSegment)> {
        let needle = needle.to_lowercase();
        let hits: BTreeSet<(CellId, RoadId)> = self
            .indexes
            .by_name
            .iter()
            .filter(|(name, _)| name.contains(&needle))
            .flat_map(|(_, pairs)| pairs.iter().copied())
            .collect();
        self.resolve(hits.iter())
    }

    /// Roads whose class equals `road_class` exactly, ordered by `(cell, road id)`.
    pub fn roads_by_type(&self, road_class: &str) -> Vec<(CellId, &RoadSegment)> {
        match self.indexes.by_class.get(road_class) {
            Some(pairs) => self.resolve(pairs.iter()),
            None => Vec::new(),
        }
    }

    /// Restrictions whose way members include both `from` and `to`,
    /// deduplicated by relation id and ordered by it.
    pub fn restrictions_between(&self, from: RoadId, to: RoadId) -> Vec<&TurnRestriction> {
        let Some(cells) = self.indexes.restrictions_by_road.get(&from) else {
            return Vec::new();
        };

        let mut found: BTreeMap<RelationId, &TurnRestriction> = BTreeMap::new();
        for cell in cells {
            let record = self
                .cells
                .get(cell)
                .unwrap_or_else(|| panic!("restriction index references missing cell {cell}"));
            for r in &record.restrictions {
                if r.references_road(from) && r.references_road(to) {
                    found.entry(r.id).or_insert(r);
                }
            }
        }
        found.into_values().collect()
    }

    pub fn statistics(&self) -> StoreStats {
        let mut stats = StoreStats {
            cell_count: self.cells.len(),
            unique_road_count: self.indexes.road_cells.len(),
            ..StoreStats::default()
        };
        for record in self.cells.values() {
            stats.road_count += record.roads.len();
            stats.intersection_count += record.intersections.len();
            stats.restriction_count += record.restrictions.len();
        }
        if stats.cell_count > 0 {
            stats.avg_roads_per_cell = stats.road_count as f64 / stats.cell_count as f64;
        }
        stats
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn road_at(&self, cell: CellId, road: RoadId) -> &RoadSegment {
        self.cells
            .get(&cell)
            .and_then(|r| r.roads.get(&road))
            .unwrap_or_else(|| panic!("road index references missing road {road} in cell {cell}"))
    }

    fn resolve<'a>(&self, pairs: impl Iterator<Item = &'a (CellId, RoadId)>) -> Vec<(CellId, &RoadSegment)> {
        pairs.map(|&(cell, road)| (cell, self.road_at(cell, road))).collect()
    }
}

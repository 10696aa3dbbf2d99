//! `CellIndex` — the cell grid at one fixed level.

use cm_core::{BoundingBox, CoreResult, GeoPoint};

use crate::cell::check_level;
use crate::{CellId, Covering, covering_for_bbox, covering_for_radius};

/// The grid at a single level.
///
/// A store is built at one level for its whole life, so the manager holds
/// one `CellIndex` instead of threading the level through every call.
/// Cheap to copy; holds no data.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CellIndex {
    level: u8,
}

impl CellIndex {
    /// Fails with `InvalidLevel` above [`MAX_LEVEL`](crate::MAX_LEVEL).
    pub fn new(level: u8) -> CoreResult<Self> {
        check_level(level)?;
        Ok(Self { level })
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Cell containing `(lat, lng)`.
    pub fn cell_id(&self, lat: f64, lng: f64) -> CoreResult<CellId> {
        CellId::from_point(GeoPoint { lat, lng }, self.level)
    }

    pub fn cell_of(&self, p: GeoPoint) -> CoreResult<CellId> {
        CellId::from_point(p, self.level)
    }

    pub fn neighbors(&self, cell: CellId) -> Vec<CellId> {
        cell.neighbors()
    }

    /// `cell` followed by its neighbours.
    pub fn with_neighbors(&self, cell: CellId) -> Vec<CellId> {
        let mut cells = cell.neighbors();
        cells.insert(0, cell);
        cells
    }

    pub fn covering_for_bbox(&self, bbox: &BoundingBox) -> CoreResult<Covering> {
        covering_for_bbox(bbox, self.level)
    }

    pub fn covering_for_radius(&self, lat: f64, lng: f64, radius_m: f64) -> CoreResult<Covering> {
        covering_for_radius(GeoPoint { lat, lng }, radius_m, self.level)
    }

    pub fn cell_bounds(&self, cell: CellId) -> BoundingBox {
        cell.bounds()
    }

    pub fn cell_center(&self, cell: CellId) -> GeoPoint {
        cell.center()
    }

    /// `true` if `cell` is a well-formed id at this index's level.
    pub fn owns(&self, cell: CellId) -> bool {
        cell.is_valid() && cell.level() == self.level
    }
}

//! Region coverings.
//!
//! A covering is a set of same-level cells guaranteed to contain every point
//! of a region.  Over-covering at the edges is accepted; under-covering is
//! not, because the store relies on coverings to find every candidate cell.
//!
//! Coverings are kept as unions of [`CellRect`]s (inclusive column/row
//! ranges) rather than materialised sets: a continental bounding box at
//! level 15 spans hundreds of millions of cells, and the manager decides per
//! query whether to enumerate the covering or to filter the cells that
//! actually hold data.

use std::collections::BTreeSet;

use cm_core::geo::cap_extent_deg;
use cm_core::{BoundingBox, CoreResult, GeoPoint};

use crate::cell::{axis_index, check_level};
use crate::CellId;

// ── CellRect ──────────────────────────────────────────────────────────────────

/// An inclusive rectangle of grid columns (`i`) and rows (`j`) at one level.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CellRect {
    level: u8,
    i_min: u32,
    i_max: u32,
    j_min: u32,
    j_max: u32,
}

impl CellRect {
    /// The smallest rectangle of level-`level` cells containing `bbox`.
    pub fn for_bbox(bbox: &BoundingBox, level: u8) -> CoreResult<Self> {
        check_level(level)?;
        // Re-validate: boxes can be built from a struct literal.
        let b = BoundingBox::new(bbox.min_lat, bbox.min_lng, bbox.max_lat, bbox.max_lng)?;
        let n = 1u64 << level;
        Ok(Self {
            level,
            i_min: axis_index(b.min_lng, -180.0, 360.0, n),
            i_max: axis_index(b.max_lng, -180.0, 360.0, n),
            j_min: axis_index(b.min_lat, -90.0, 180.0, n),
            j_max: axis_index(b.max_lat, -90.0, 180.0, n),
        })
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Number of cells in the rectangle.
    pub fn len(&self) -> u64 {
        (self.i_max - self.i_min + 1) as u64 * (self.j_max - self.j_min + 1) as u64
    }

    /// Always `false`: a rectangle holds at least one cell.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// `true` if `cell` is a level-matching cell inside the rectangle.
    pub fn contains(&self, cell: CellId) -> bool {
        if !cell.is_valid() || cell.level() != self.level {
            return false;
        }
        let (i, j) = cell.to_ij();
        (self.i_min..=self.i_max).contains(&i) && (self.j_min..=self.j_max).contains(&j)
    }

    /// Iterate the cells row by row.
    pub fn cells(&self) -> impl Iterator<Item = CellId> + use<> {
        let r = *self;
        (r.j_min..=r.j_max)
            .flat_map(move |j| (r.i_min..=r.i_max).map(move |i| CellId::from_ij(i, j, r.level)))
    }
}

// ── Covering ──────────────────────────────────────────────────────────────────

/// A union of disjoint [`CellRect`]s at one level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Covering {
    level: u8,
    rects: Vec<CellRect>,
}

impl Covering {
    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn rects(&self) -> &[CellRect] {
        &self.rects
    }

    /// Number of cells in the covering.
    pub fn len(&self) -> u64 {
        self.rects.iter().map(CellRect::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn contains(&self, cell: CellId) -> bool {
        self.rects.iter().any(|r| r.contains(cell))
    }

    /// Iterate every cell of the covering (no particular order).
    pub fn cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.rects.iter().flat_map(CellRect::cells)
    }

    /// Materialise the covering as a sorted set.
    pub fn cell_ids(&self) -> BTreeSet<CellId> {
        self.cells().collect()
    }
}

// ── Covering construction ─────────────────────────────────────────────────────

/// Cover a bounding box with level-`level` cells.
pub fn covering_for_bbox(bbox: &BoundingBox, level: u8) -> CoreResult<Covering> {
    let rect = CellRect::for_bbox(bbox, level)?;
    Ok(Covering { level, rects: vec![rect] })
}

/// Cover the spherical cap of `radius_m` around `center`.
///
/// The cap is bounded by its exact latitude/longitude rectangle, which is
/// split in two when it crosses the antimeridian and widened to every
/// longitude when it contains a pole.
pub fn covering_for_radius(center: GeoPoint, radius_m: f64, level: u8) -> CoreResult<Covering> {
    check_level(level)?;
    let (d_lat, d_lng) = cap_extent_deg(center, radius_m)?;
    let min_lat = (center.lat - d_lat).max(-90.0);
    let max_lat = (center.lat + d_lat).min(90.0);

    let spans: Vec<(f64, f64)> = match d_lng {
        Some(d) if d < 180.0 => {
            let lo = center.lng - d;
            let hi = center.lng + d;
            if lo < -180.0 {
                vec![(lo + 360.0, 180.0), (-180.0, hi)]
            } else if hi > 180.0 {
                vec![(lo, 180.0), (-180.0, hi - 360.0)]
            } else {
                vec![(lo, hi)]
            }
        }
        _ => vec![(-180.0, 180.0)],
    };

    let mut rects = spans
        .into_iter()
        .map(|(min_lng, max_lng)| {
            CellRect::for_bbox(&BoundingBox { min_lat, min_lng, max_lat, max_lng }, level)
        })
        .collect::<CoreResult<Vec<_>>>()?;

    // At coarse levels the two halves of a split cap can share columns.
    if let [east, west] = rects[..] {
        if east.i_min <= west.i_max + 1 {
            let n = 1u64 << level;
            rects = vec![CellRect { i_min: 0, i_max: (n - 1) as u32, ..east }];
        }
    }

    Ok(Covering { level, rects })
}

//! Cell identifiers.
//!
//! # Bit layout
//!
//! ```text
//!   bit 63..61   bits 60 .. 60-2L+1          bit 60-2L     lower bits
//!   ┌────────┬──────────────────────────┬──────────────┬────────────┐
//!   │  000   │ interleave(i, j) (2L b)  │  sentinel 1  │   zeros    │
//!   └────────┴──────────────────────────┴──────────────┴────────────┘
//! ```
//!
//! `i` is the column (longitude) index and `j` the row (latitude) index at
//! level `L`.  Column bits occupy the even positions of the interleave, row
//! bits the odd ones, so the two lowest interleave bits of a cell select
//! which of its parent's four children it is.
//!
//! The sentinel makes the level recoverable from the id alone
//! (`trailing_zeros / 2`) and turns "parent at level k" into two bit
//! operations.

use std::fmt;
use std::str::FromStr;

use cm_core::{BoundingBox, CoreError, CoreResult, GeoPoint, MAX_LEVEL};

/// Total number of meaningful bits in an id (60 position bits + sentinel).
const ID_BITS: u32 = 2 * MAX_LEVEL as u32 + 1;

/// A node of the hierarchical grid.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CellId(pub u64);

impl CellId {
    // ── Construction ──────────────────────────────────────────────────────

    /// The cell at `level` containing `p`.
    ///
    /// Points exactly on an internal cell edge belong to the cell on the
    /// north/east side of the edge; points on the outer edge of the grid
    /// (latitude 90 or longitude 180) belong to the last row/column.
    pub fn from_point(p: GeoPoint, level: u8) -> CoreResult<Self> {
        check_level(level)?;
        if !p.is_valid() {
            return Err(CoreError::InvalidCoordinate { lat: p.lat, lng: p.lng });
        }
        let n = 1u64 << level;
        let i = axis_index(p.lng, -180.0, 360.0, n);
        let j = axis_index(p.lat, -90.0, 180.0, n);
        Ok(Self::from_ij(i, j, level))
    }

    /// Build an id from its column/row at `level`.  Callers guarantee
    /// `i, j < 2^level`.
    pub fn from_ij(i: u32, j: u32, level: u8) -> Self {
        debug_assert!(level <= MAX_LEVEL);
        debug_assert!((i as u64) < (1u64 << level) && (j as u64) < (1u64 << level));
        let shift = 2 * (MAX_LEVEL - level) as u32;
        let pos = spread(i) | (spread(j) << 1);
        CellId((pos << (shift + 1)) | (1u64 << shift))
    }

    // ── Validity and hierarchy ────────────────────────────────────────────

    /// `true` if the id has a sentinel bit at an even position and no bits
    /// above the id range.
    pub fn is_valid(self) -> bool {
        self.0 != 0 && self.0 >> ID_BITS == 0 && self.lsb().trailing_zeros() % 2 == 0
    }

    #[inline]
    fn lsb(self) -> u64 {
        self.0 & self.0.wrapping_neg()
    }

    /// Level of this cell (0 = whole planet).
    #[inline]
    pub fn level(self) -> u8 {
        debug_assert!(self.is_valid(), "level() of invalid cell id {:#x}", self.0);
        MAX_LEVEL.saturating_sub((self.lsb().trailing_zeros() / 2) as u8)
    }

    /// Column and row of this cell within its level.
    pub fn to_ij(self) -> (u32, u32) {
        let shift = 2 * (MAX_LEVEL - self.level()) as u32;
        let pos = self.0 >> (shift + 1);
        (compact(pos), compact(pos >> 1))
    }

    /// The ancestor at `level`, or `None` if `level` is finer than this
    /// cell.  `parent(self.level())` is the cell itself.
    pub fn parent(self, level: u8) -> Option<CellId> {
        if level > self.level() {
            return None;
        }
        let lsb = 1u64 << (2 * (MAX_LEVEL - level) as u32);
        Some(CellId((self.0 & lsb.wrapping_neg()) | lsb))
    }

    /// The four children at `level() + 1`, in curve order.  `None` at
    /// [`MAX_LEVEL`].
    pub fn children(self) -> Option<[CellId; 4]> {
        if self.level() == MAX_LEVEL {
            return None;
        }
        let lsb = self.lsb();
        let base = self.0 - lsb;
        let child_lsb = lsb >> 2;
        Some(std::array::from_fn(|k| CellId(base + (2 * k as u64 + 1) * child_lsb)))
    }

    /// `true` if `other` is this cell or one of its descendants.  Always
    /// `false` when either id is invalid.
    pub fn contains(self, other: CellId) -> bool {
        if !self.is_valid() || !other.is_valid() {
            return false;
        }
        let span = self.lsb() - 1;
        other.0 >= self.0 - span && other.0 <= self.0 + span
    }

    // ── Geometry ──────────────────────────────────────────────────────────

    /// The lat/lng rectangle covered by this cell.
    pub fn bounds(self) -> BoundingBox {
        let n = 1u64 << self.level();
        let (i, j) = self.to_ij();
        let lng_step = 360.0 / n as f64;
        let lat_step = 180.0 / n as f64;
        BoundingBox {
            min_lat: edge(-90.0, lat_step, j as u64),
            min_lng: edge(-180.0, lng_step, i as u64),
            max_lat: edge(-90.0, lat_step, j as u64 + 1),
            max_lng: edge(-180.0, lng_step, i as u64 + 1),
        }
    }

    /// Centre of the cell's rectangle.
    pub fn center(self) -> GeoPoint {
        self.bounds().center()
    }

    /// Same-level cells sharing an edge or a corner with this one, sorted.
    ///
    /// Columns wrap across the antimeridian; rows beyond a pole do not
    /// exist, so polar cells have five neighbours.  At levels 0 and 1 the
    /// wrapped neighbours collapse and fewer cells are returned.
    pub fn neighbors(self) -> Vec<CellId> {
        let level = self.level();
        let n = 1i64 << level;
        let (i, j) = self.to_ij();

        let mut out = Vec::with_capacity(8);
        for dj in -1i64..=1 {
            let jj = j as i64 + dj;
            if jj < 0 || jj >= n {
                continue;
            }
            for di in -1i64..=1 {
                let ii = (i as i64 + di).rem_euclid(n);
                let cell = CellId::from_ij(ii as u32, jj as u32, level);
                if cell != self && !out.contains(&cell) {
                    out.push(cell);
                }
            }
        }
        out.sort_unstable();
        out
    }

    // ── Tokens ────────────────────────────────────────────────────────────

    /// Compact hex form: 16 hex digits with trailing zeros removed.
    pub fn to_token(self) -> String {
        if self.0 == 0 {
            return "X".to_owned();
        }
        let full = format!("{:016x}", self.0);
        full.trim_end_matches('0').to_owned()
    }

    /// Parse a token produced by [`to_token`](Self::to_token).
    pub fn from_token(token: &str) -> CoreResult<Self> {
        if token.is_empty() || token.len() > 16 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CoreError::Parse(format!("malformed cell token {token:?}")));
        }
        let padded = format!("{token:0<16}");
        let id = u64::from_str_radix(&padded, 16)
            .map_err(|e| CoreError::Parse(format!("cell token {token:?}: {e}")))?;
        let cell = CellId(id);
        if !cell.is_valid() {
            return Err(CoreError::Parse(format!("token {token:?} is not a valid cell id")));
        }
        Ok(cell)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_token())
    }
}

impl FromStr for CellId {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        CellId::from_token(s)
    }
}

// ── Grid helpers ──────────────────────────────────────────────────────────────

pub(crate) fn check_level(level: u8) -> CoreResult<()> {
    if level > MAX_LEVEL {
        Err(CoreError::InvalidLevel(level))
    } else {
        Ok(())
    }
}

/// Coordinate of grid line `k` along an axis starting at `origin`.
///
/// `step` is a power-of-two fraction of 360 or 180, so `k * step` and the
/// subtraction are exact for every `k <= 2^30`.
#[inline]
fn edge(origin: f64, step: f64, k: u64) -> f64 {
    k as f64 * step + origin
}

/// Index of the grid interval containing `value`, consistent with `edge`:
/// `edge(k) <= value < edge(k + 1)`, except for the last interval which is
/// closed on both sides.
pub(crate) fn axis_index(value: f64, origin: f64, span: f64, n: u64) -> u32 {
    let step = span / n as f64;
    let last = n as i64 - 1;
    let mut k = (((value - origin) / step).floor() as i64).clamp(0, last);
    while k > 0 && edge(origin, step, k as u64) > value {
        k -= 1;
    }
    while k < last && edge(origin, step, k as u64 + 1) <= value {
        k += 1;
    }
    k as u32
}

/// Spread the 32 bits of `v` over the even bit positions of a `u64`.
#[inline]
fn spread(v: u32) -> u64 {
    let mut x = v as u64;
    x = (x | (x << 16)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x << 8)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    x = (x | (x << 1)) & 0x5555_5555_5555_5555;
    x
}

/// Inverse of [`spread`]: gather the even bits of `x`.
#[inline]
fn compact(x: u64) -> u32 {
    let mut x = x & 0x5555_5555_5555_5555;
    x = (x | (x >> 1)) & 0x3333_3333_3333_3333;
    x = (x | (x >> 2)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x >> 4)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x >> 8)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x >> 16)) & 0x0000_0000_FFFF_FFFF;
    x as u32
}

//! `cm-cell` — hierarchical cell grid over the lat/lng plane.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                   |
//! |--------------|------------------------------------------------------------|
//! | [`cell`]     | `CellId` — encoding, hierarchy, bounds, neighbours, tokens |
//! | [`covering`] | `CellRect`, `Covering` — bbox and radius coverings         |
//! | [`index`]    | `CellIndex` — the fixed-level facade used by the manager   |
//!
//! # Grid
//!
//! Level `L` splits longitude [-180, 180] and latitude [-90, 90] into
//! `2^L` columns and `2^L` rows.  Every cell id is a `u64` holding the
//! Z-order interleave of its column and row followed by a sentinel bit that
//! marks the level, so ids sort along a space-filling curve and a parent's
//! id range contains all of its descendants.
//!
//! All functions are pure.  Errors are plain [`CoreError`]s: the only way to
//! fail is invalid input.

pub mod cell;
pub mod covering;
pub mod index;

#[cfg(test)]
mod tests;

pub use cell::CellId;
pub use cm_core::{CoreError, CoreResult, MAX_LEVEL};
pub use covering::{CellRect, Covering, covering_for_bbox, covering_for_radius};
pub use index::CellIndex;

//! `cm-store` — the Segment Store.
//!
//! Maps each [`CellId`](cm_cell::CellId) to a [`CellRecord`] holding the
//! roads, intersections and turn restrictions indexed in that cell, and keeps
//! secondary indexes (name, road class, road → cells, road → restriction
//! cells) in sync with every mutation.
//!
//! The store does no locking of its own: `&mut self` mutations are atomic
//! with respect to any `&self` reader.  `cm-manager` wraps it in an
//! `RwLock`.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`model`]    | `RoadSegment`, `RoadMetadata`, `Intersection`, `TurnRestriction` |
//! | [`store`]    | `SegmentStore`, `CellRecord`, `StoreStats`                |
//! | [`snapshot`] | `serialize` / `deserialize` (header + CBOR body)          |
//! | [`error`]    | `StoreError`, `StoreResult<T>`                            |

pub mod error;
pub mod model;
pub mod snapshot;
pub mod store;


pub use error::{StoreError, StoreResult};
pub use model::{
    Intersection, MemberKind, MemberRole, RestrictionKind, RestrictionMember, RoadMetadata,
    RoadSegment, Tags, TurnRestriction, parse_maxspeed,
};
pub use store::{CellMeta, CellRecord, SegmentStore, StoreStats};

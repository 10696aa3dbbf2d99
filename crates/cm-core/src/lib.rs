//! `cm-core` — foundational types for the `cellmap` road index.
//!
//! This crate is a dependency of every other `cm-*` crate.  It intentionally
//! has no `cm-*` dependencies and minimal external ones (only `thiserror`,
//! plus optional `serde`).
//!
//! # What lives here
//!
//! | Module       | Contents                                               |
//! |--------------|--------------------------------------------------------|
//! | [`ids`]      | `RoadId`, `OsmNodeId`, `RelationId`                    |
//! | [`geo`]      | `GeoPoint`, `BoundingBox`, haversine distance          |
//! | [`config`]   | `MapConfig`, level limits                              |
//! | [`error`]    | `CoreError`, `CoreResult`                              |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | `Serialize`/`Deserialize` on all public types (snapshots). |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{DEFAULT_LEVEL, MAX_LEVEL, MapConfig};
pub use error::{CoreError, CoreResult};
pub use geo::{BoundingBox, EARTH_RADIUS_M, GeoPoint};
pub use ids::{OsmNodeId, RelationId, RoadId};

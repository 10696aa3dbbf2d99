//! `cm-fetch` — the raw data side of the road index.
//!
//! The manager never talks to a network or parses files itself; it asks a
//! [`RegionFetcher`] for the raw records inside a bounding box and reacts to
//! success, error or timeout.  Rate limiting, retries and endpoint selection
//! belong to the fetcher.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                       |
//! |--------------|----------------------------------------------------------------|
//! | [`raw`]      | `RawRoad`, `RawIntersection`, `RawRestriction`, `RoadFilter`   |
//! | [`region`]   | `RawRegion` — clipping and intersection derivation             |
//! | [`fetcher`]  | `RegionFetcher` trait, `RecordStream`, `StaticFetcher`         |
//! | [`overpass`] | Overpass JSON (`[out:json]`) reader                            |
//! | [`pbf`]      | OSM PBF reader, `PbfFetcher` (feature = `"pbf"` only)          |
//! | [`error`]    | `FetchError`, `FetchResult<T>`                                 |
//!
//! # Feature flags
//!
//! | Flag  | Effect                                              |
//! |-------|-----------------------------------------------------|
//! | `pbf` | Enables OSM PBF loading via the `osmpbf` crate.     |

pub mod error;
pub mod fetcher;
pub mod overpass;
pub mod raw;
pub mod region;

#[cfg(feature = "pbf")]
pub mod pbf;

#[cfg(test)]
mod tests;

pub use error::{FetchError, FetchResult};
pub use fetcher::{RecordStream, RegionFetcher, StaticFetcher};
pub use raw::{RawIntersection, RawMember, RawRecord, RawRestriction, RawRoad, RoadFilter};
pub use region::RawRegion;

#[cfg(feature = "pbf")]
pub use pbf::PbfFetcher;

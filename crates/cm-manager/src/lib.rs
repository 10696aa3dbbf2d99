//! `cm-manager` — the Map Manager.
//!
//! Ties the cell index, a region fetcher and the segment store together:
//!
//! ```text
//! ingestion:  RegionFetcher ──► MapManager ──► CellIndex ──► SegmentStore
//! queries:    caller ──► MapManager ──(cells via CellIndex)──► SegmentStore
//! ```
//!
//! All query results are owned copies; nothing borrowed from the store
//! escapes the read lock.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use cm_core::{BoundingBox, MapConfig};
//! use cm_fetch::StaticFetcher;
//! use cm_manager::{LoadOptions, MapManager};
//!
//! let fetcher = StaticFetcher::from_overpass_path("sf.json".as_ref())?;
//! let manager = MapManager::new(MapConfig::default(), fetcher)?;
//! let bbox = BoundingBox::new(37.77, -122.43, 37.78, -122.41)?;
//! manager.load_region(&bbox, &LoadOptions::new().road_types(["primary"]))?;
//! let here = manager.query_point(37.7749, -122.4194)?;
//! manager.save("sf.cmss")?;
//! ```

pub mod builder;
pub mod error;
pub mod ingest;
pub mod manager;
pub mod nearest;
pub mod options;
pub mod persist;
pub mod query;


pub use builder::MapManagerBuilder;
pub use error::{IngestFailure, ManagerError, ManagerResult};
pub use manager::MapManager;
pub use options::{CancelToken, IngestStats, LoadOptions};
pub use persist::{SnapshotSummary, summary_path};
pub use query::{PointQuery, QueryResult, RoadHit};

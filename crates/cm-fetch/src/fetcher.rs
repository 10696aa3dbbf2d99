//! The `RegionFetcher` seam and the in-memory `StaticFetcher`.

use std::path::Path;
use std::sync::Arc;

use log::debug;

use cm_core::BoundingBox;

use crate::overpass;
use crate::raw::{RawRecord, RoadFilter};
use crate::region::RawRegion;
use crate::FetchResult;

/// A lazily consumed stream of raw records.
///
/// An `Err` item ends the useful part of the stream: the manager keeps what
/// it has already committed and stops.
pub type RecordStream<'a> = Box<dyn Iterator<Item = FetchResult<RawRecord>> + Send + 'a>;

/// Supplies raw records for a bounding box.
///
/// Implementations decide how to reach the data (HTTP, file, memory) and own
/// rate limiting and retries.  Failing before any record is produced is
/// reported through the outer `Result`; failing midway through the inner
/// stream.
pub trait RegionFetcher: Send + Sync {
    fn fetch_region(&self, bbox: &BoundingBox, filter: &RoadFilter)
        -> FetchResult<RecordStream<'_>>;
}

impl<F: RegionFetcher + ?Sized> RegionFetcher for Box<F> {
    fn fetch_region(&self, bbox: &BoundingBox, filter: &RoadFilter)
        -> FetchResult<RecordStream<'_>>
    {
        (**self).fetch_region(bbox, filter)
    }
}

impl<F: RegionFetcher + ?Sized> RegionFetcher for Arc<F> {
    fn fetch_region(&self, bbox: &BoundingBox, filter: &RoadFilter)
        -> FetchResult<RecordStream<'_>>
    {
        (**self).fetch_region(bbox, filter)
    }
}

// ── StaticFetcher ─────────────────────────────────────────────────────────────

/// Serves bounding-box requests from a region held in memory.
#[derive(Clone, Debug, Default)]
pub struct StaticFetcher {
    region: RawRegion,
}

impl StaticFetcher {
    pub fn new(region: RawRegion) -> Self {
        Self { region }
    }

    /// Parse an Overpass JSON export and serve it.
    pub fn from_overpass_path(path: &Path) -> FetchResult<Self> {
        let region = overpass::read_path(path)?;
        debug!(
            "loaded {} roads, {} intersections, {} restrictions from {}",
            region.roads.len(),
            region.intersections.len(),
            region.restrictions.len(),
            path.display(),
        );
        Ok(Self::new(region))
    }

    pub fn region(&self) -> &RawRegion {
        &self.region
    }
}

impl RegionFetcher for StaticFetcher {
    fn fetch_region(&self, bbox: &BoundingBox, filter: &RoadFilter)
        -> FetchResult<RecordStream<'_>>
    {
        let clipped = self.region.clip(bbox, filter);
        Ok(Box::new(clipped.into_records().map(Ok)))
    }
}

//! Load options and ingest outcome.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use cm_fetch::RoadFilter;

use crate::error::IngestFailure;

/// Shared cancellation flag.  Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Options for one `load_region` call.
///
/// | Field      | Default              |
/// |------------|----------------------|
/// | `filter`   | every road class     |
/// | `deadline` | none                 |
/// | `cancel`   | none                 |
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub filter:   RoadFilter,
    pub deadline: Option<Instant>,
    pub cancel:   Option<CancelToken>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only these `highway` classes.
    pub fn road_types<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter = RoadFilter::only(classes);
        self
    }

    /// Stop once `timeout` has elapsed from now.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The reason to stop now, if any.
    pub(crate) fn interruption(&self) -> Option<IngestFailure> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Some(IngestFailure::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Some(IngestFailure::DeadlineExceeded);
        }
        None
    }
}

/// What one `load_region` call did.
#[derive(Debug, Default)]
pub struct IngestStats {
    pub roads_committed:         usize,
    /// New intersections; duplicates already in their cell are not counted.
    pub intersections_committed: usize,
    /// Restrictions stored in at least one new cell.
    pub restrictions_committed:  usize,
    /// Restrictions with no resolvable via node or member way.
    pub restrictions_unplaced:   usize,
    /// Records dropped for failing the road filter or carrying invalid
    /// coordinates.
    pub skipped:                 usize,
    /// Set when ingestion stopped before the stream ended.  Records
    /// committed before the stop stay in the store.
    pub failure:                 Option<IngestFailure>,
}

impl IngestStats {
    pub fn is_partial(&self) -> bool {
        self.failure.is_some()
    }

    pub fn committed(&self) -> usize {
        self.roads_committed + self.intersections_committed + self.restrictions_committed
    }
}

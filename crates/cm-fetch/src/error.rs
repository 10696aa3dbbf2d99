//! Fetch error type.

use std::time::Duration;

use thiserror::Error;

/// Errors produced by region fetchers.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The upstream source reported a failure.
    #[error("data source error: {0}")]
    Source(String),

    #[error("data source timed out after {0:?}")]
    Timeout(Duration),

    #[cfg(feature = "pbf")]
    #[error("OSM parse error: {0}")]
    Osm(String),
}

pub type FetchResult<T> = Result<T, FetchError>;

use thiserror::Error;

use cm_core::CoreError;
use cm_fetch::FetchError;
use cm_store::StoreError;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A thread panicked while holding the store lock.
    #[error("store lock poisoned")]
    LockPoisoned,

    #[error("store level {store} does not match configured level {config}")]
    LevelMismatch { config: u8, store: u8 },
}

impl ManagerError {
    /// `true` for snapshots that failed validation.
    pub fn is_corrupt_data(&self) -> bool {
        matches!(self, ManagerError::Store(StoreError::CorruptData(_)))
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;

/// Why an ingest stopped before the fetch stream was exhausted.
#[derive(Debug, Error)]
pub enum IngestFailure {
    #[error("fetch failed: {0}")]
    Fetch(#[source] FetchError),

    #[error("cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

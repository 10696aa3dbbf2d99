//! Store error type.

use thiserror::Error;

use cm_cell::CellId;
use cm_core::CoreError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A cell id of the wrong level was passed to a store.
    #[error("cell level {found} does not match store level {expected}")]
    LevelMismatch { expected: u8, found: u8 },

    #[error("invalid cell id {0:#018x}")]
    InvalidCell(u64),

    /// Snapshot bytes that do not decode to a consistent store.
    #[error("corrupt snapshot: {0}")]
    CorruptData(String),

    #[error("snapshot encoding failed: {0}")]
    Encode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub(crate) fn invalid_cell(cell: CellId) -> Self {
        StoreError::InvalidCell(cell.0)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

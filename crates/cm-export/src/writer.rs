//! The `ExportWriter` trait implemented by all tabular backends.

use crate::{CellRow, ExportResult, RoadRow};

/// Trait implemented by the CSV and SQLite writers.
pub trait ExportWriter {
    /// Write a batch of road rows.
    fn write_roads(&mut self, rows: &[RoadRow]) -> ExportResult<()>;

    /// Write one cell row.
    fn write_cell(&mut self, row: &CellRow) -> ExportResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent — safe to call more than once.
    fn finish(&mut self) -> ExportResult<()>;
}

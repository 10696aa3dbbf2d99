//! Drive an [`ExportWriter`] over a whole store.

use log::info;

use cm_store::SegmentStore;

use crate::writer::ExportWriter;
use crate::{CellRow, ExportResult, RoadRow};

/// Totals written by [`export_store`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub cells: usize,
    pub roads: usize,
}

/// Write one cell row and one batch of road rows per occupied cell, in
/// ascending cell order, then finish the writer.
pub fn export_store<W: ExportWriter>(store: &SegmentStore, writer: &mut W) -> ExportResult<ExportSummary> {
    let mut summary = ExportSummary::default();
    for (cell, record) in store.cells() {
        writer.write_cell(&CellRow::new(cell, record))?;

        let rows: Vec<RoadRow> = record.roads().values().map(|seg| RoadRow::new(cell, seg)).collect();
        writer.write_roads(&rows)?;

        summary.cells += 1;
        summary.roads += rows.len();
    }
    writer.finish()?;

    info!("exported {} cells, {} road rows", summary.cells, summary.roads);
    Ok(summary)
}

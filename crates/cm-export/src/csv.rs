//! CSV export backend.
//!
//! Creates two files in the configured output directory:
//! - `roads.csv`
//! - `cells.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::ExportWriter;
use crate::{CellRow, ExportResult, RoadRow};

/// Writes the road index to two CSV files.
pub struct CsvWriter {
    roads:    Writer<File>,
    cells:    Writer<File>,
    finished: bool,
}

impl CsvWriter {
    /// Create the two CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> ExportResult<Self> {
        let mut roads = Writer::from_path(dir.join("roads.csv"))?;
        roads.write_record([
            "cell", "road_id", "name", "road_class", "oneway", "speed_limit_kph", "lanes",
            "vertex_count", "length_m",
        ])?;

        let mut cells = Writer::from_path(dir.join("cells.csv"))?;
        cells.write_record([
            "cell_id", "level", "center_lat", "center_lng", "road_count", "intersection_count",
            "restriction_count", "last_updated_unix_secs",
        ])?;

        Ok(Self { roads, cells, finished: false })
    }
}

fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

impl ExportWriter for CsvWriter {
    fn write_roads(&mut self, rows: &[RoadRow]) -> ExportResult<()> {
        for row in rows {
            self.roads.write_record(&[
                row.cell.clone(),
                row.road_id.to_string(),
                row.name.clone().unwrap_or_default(),
                row.road_class.clone(),
                (row.oneway as u8).to_string(),
                opt(row.speed_limit_kph),
                opt(row.lanes),
                row.vertex_count.to_string(),
                format!("{:.1}", row.length_m),
            ])?;
        }
        Ok(())
    }

    fn write_cell(&mut self, row: &CellRow) -> ExportResult<()> {
        self.cells.write_record(&[
            row.cell_id.to_string(),
            row.level.to_string(),
            row.center_lat.to_string(),
            row.center_lng.to_string(),
            row.road_count.to_string(),
            row.intersection_count.to_string(),
            row.restriction_count.to_string(),
            row.last_updated_unix_secs.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> ExportResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.roads.flush()?;
        self.cells.flush()?;
        Ok(())
    }
}

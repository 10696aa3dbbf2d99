//! `cm-export` — export writers for the cellmap segment store.
//!
//! Tabular backends implement [`ExportWriter`] and are driven by
//! [`export_store`]:
//!
//! | Feature   | Backend     | Files created               |
//! |-----------|-------------|-----------------------------|
//! | *(none)*  | CSV         | `roads.csv`, `cells.csv`    |
//! | `sqlite`  | SQLite      | `roads.db`                  |
//!
//! [`geojson`] builds RFC 7946 feature collections for a cell, or for any
//! set of roads and intersections such as a query result.
//!
//! # Usage
//!
//! ```rust,ignore
//! use cm_export::{CsvWriter, export_store};
//!
//! let mut writer = CsvWriter::new(Path::new("./out"))?;
//! manager.with_store(|store| export_store(store, &mut writer))??;
//! ```

pub mod csv;
pub mod error;
pub mod export;
pub mod geojson;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use self::csv::CsvWriter;
pub use error::{ExportError, ExportResult};
pub use export::{ExportSummary, export_store};
pub use row::{CellRow, RoadRow};
pub use writer::ExportWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;

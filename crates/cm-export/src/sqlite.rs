//! SQLite export backend (feature `sqlite`).
//!
//! Creates a single `roads.db` file in the configured output directory with
//! two tables: `roads` and `cells`.

use std::path::Path;

use rusqlite::Connection;

use crate::writer::ExportWriter;
use crate::{CellRow, ExportResult, RoadRow};

/// Writes the road index to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `roads.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> ExportResult<Self> {
        let conn = Connection::open(dir.join("roads.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS roads (
                 cell            TEXT    NOT NULL,
                 road_id         INTEGER NOT NULL,
                 name            TEXT,
                 road_class      TEXT    NOT NULL,
                 oneway          INTEGER NOT NULL,
                 speed_limit_kph INTEGER,
                 lanes           INTEGER,
                 vertex_count    INTEGER NOT NULL,
                 length_m        REAL    NOT NULL,
                 PRIMARY KEY (cell, road_id)
             );
             CREATE INDEX IF NOT EXISTS roads_by_id ON roads (road_id);
             CREATE TABLE IF NOT EXISTS cells (
                 cell_id                INTEGER PRIMARY KEY,
                 level                  INTEGER NOT NULL,
                 center_lat             REAL    NOT NULL,
                 center_lng             REAL    NOT NULL,
                 road_count             INTEGER NOT NULL,
                 intersection_count     INTEGER NOT NULL,
                 restriction_count      INTEGER NOT NULL,
                 last_updated_unix_secs INTEGER NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl ExportWriter for SqliteWriter {
    fn write_roads(&mut self, rows: &[RoadRow]) -> ExportResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO roads \
                 (cell, road_id, name, road_class, oneway, speed_limit_kph, lanes, vertex_count, length_m) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.cell,
                    row.road_id,
                    row.name,
                    row.road_class,
                    row.oneway as i64,
                    row.speed_limit_kph,
                    row.lanes,
                    row.vertex_count as i64,
                    row.length_m,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_cell(&mut self, row: &CellRow) -> ExportResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO cells \
             (cell_id, level, center_lat, center_lng, road_count, intersection_count, \
              restriction_count, last_updated_unix_secs) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                // SQLite integers are signed; keep the raw bit pattern.
                row.cell_id as i64,
                row.level,
                row.center_lat,
                row.center_lng,
                row.road_count as i64,
                row.intersection_count as i64,
                row.restriction_count as i64,
                row.last_updated_unix_secs as i64,
            ],
        )?;
        Ok(())
    }

    fn finish(&mut self) -> ExportResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}

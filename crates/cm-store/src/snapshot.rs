//! Binary snapshots of a `SegmentStore`.
//!
//! # Layout
//!
//! ```text
//! offset  size  field
//! 0       4     magic  b"CMSS"
//! 4       1     format version (1)
//! 5       1     cell level
//! 6       ..    CBOR body: { cells, indexes }
//! ```
//!
//! Decoding validates everything before returning: header, version, every
//! cell id and its level, per-cell bookkeeping, and that the stored indexes
//! equal the ones rebuilt from the cells.  Any failure is
//! [`StoreError::CorruptData`] and nothing is returned.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use log::debug;
use serde::{Deserialize, Serialize};

use cm_cell::CellId;
use cm_core::MAX_LEVEL;

use crate::store::{CellRecord, Indexes, SegmentStore};
use crate::{StoreError, StoreResult};

/// Snapshot magic bytes.
pub const MAGIC: &[u8; 4] = b"CMSS";

/// Current snapshot format version.
pub const FORMAT_VERSION: u8 = 1;

const HEADER_LEN: usize = 6;

#[derive(Serialize)]
struct BodyRef<'a> {
    cells:   &'a BTreeMap<CellId, CellRecord>,
    indexes: &'a Indexes,
}

#[derive(Deserialize)]
struct Body {
    cells:   BTreeMap<CellId, CellRecord>,
    indexes: Indexes,
}

fn corrupt(msg: impl Into<String>) -> StoreError {
    StoreError::CorruptData(msg.into())
}

impl SegmentStore {
    /// Encode the whole store.
    pub fn serialize(&self) -> StoreResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Encode the whole store into `writer`.
    pub fn write_to<W: Write>(&self, mut writer: W) -> StoreResult<()> {
        writer.write_all(MAGIC)?;
        writer.write_all(&[FORMAT_VERSION, self.level])?;
        let body = BodyRef { cells: &self.cells, indexes: &self.indexes };
        ciborium::into_writer(&body, writer).map_err(|e| match e {
            ciborium::ser::Error::Io(io) => StoreError::Io(io),
            ciborium::ser::Error::Value(msg) => StoreError::Encode(msg),
        })
    }

    /// Decode and validate a snapshot.
    pub fn deserialize(bytes: &[u8]) -> StoreResult<Self> {
        if bytes.len() < HEADER_LEN || &bytes[..4] != MAGIC {
            return Err(corrupt("missing CMSS header"));
        }
        let version = bytes[4];
        if version != FORMAT_VERSION {
            return Err(corrupt(format!("unsupported format version {version}")));
        }
        let level = bytes[5];
        if level > MAX_LEVEL {
            return Err(corrupt(format!("cell level {level} out of range")));
        }

        let body: Body = ciborium::from_reader(&bytes[HEADER_LEN..])
            .map_err(|e| corrupt(format!("undecodable body: {e}")))?;

        for (cell, record) in &body.cells {
            if !cell.is_valid() || cell.level() != level {
                return Err(corrupt(format!("cell {:#018x} is not a level-{level} cell", cell.0)));
            }
            if !record.is_consistent() {
                return Err(corrupt(format!("cell {cell} has inconsistent road bookkeeping")));
            }
        }
        if Indexes::rebuild(&body.cells) != body.indexes {
            return Err(corrupt("secondary indexes disagree with cell records"));
        }

        debug!("decoded level-{level} snapshot with {} cells", body.cells.len());
        Ok(SegmentStore { level, cells: body.cells, indexes: body.indexes })
    }

    /// Read a snapshot from `reader` and decode it.
    pub fn read_from<R: Read>(mut reader: R) -> StoreResult<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::deserialize(&bytes)
    }
}

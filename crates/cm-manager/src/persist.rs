//! Snapshot save/load.
//!
//! `save` serialises under the read lock, then writes outside it through a
//! temporary file in the destination directory that is renamed into place,
//! so a crash never leaves a half-written snapshot under the target name.
//! `load` reads and validates outside the lock and swaps the store in only
//! on success.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use log::info;
use serde::Serialize;
use tempfile::NamedTempFile;

use cm_fetch::RegionFetcher;
use cm_store::{SegmentStore, StoreError, StoreStats};

use crate::{ManagerResult, MapManager};

/// Human-readable companion of a snapshot, written as
/// `<name>_summary.json`.
#[derive(Debug, Serialize)]
pub struct SnapshotSummary {
    pub level:         u8,
    pub saved_at_unix: u64,
    pub statistics:    StoreStats,
    /// Tokens of every occupied cell, ascending by cell id.
    pub cells:         Vec<String>,
}

impl SnapshotSummary {
    fn of(store: &SegmentStore) -> Self {
        Self {
            level:         store.level(),
            saved_at_unix: SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs()),
            statistics:    store.statistics(),
            cells:         store.cell_ids().map(|c| c.to_token()).collect(),
        }
    }
}

/// Path of the summary written next to `snapshot`.
pub fn summary_path(snapshot: &Path) -> PathBuf {
    let stem = snapshot.file_stem().and_then(|s| s.to_str()).unwrap_or("map");
    snapshot.with_file_name(format!("{stem}_summary.json"))
}

impl<F: RegionFetcher> MapManager<F> {
    /// Write a snapshot.  Relative paths resolve against
    /// `config.storage_dir`.  Returns the path written.
    pub fn save(&self, path: impl AsRef<Path>) -> ManagerResult<PathBuf> {
        let target = self.config.resolve(path.as_ref());

        let (bytes, summary) = {
            let _gate = self.exclusive()?;
            let store = self.read()?;
            let summary = self.config.write_summary.then(|| SnapshotSummary::of(&store));
            (store.serialize()?, summary)
        };

        write_atomically(&target, |f| f.write_all(&bytes).map_err(Into::into))?;
        if let Some(summary) = summary {
            write_atomically(&summary_path(&target), |f| {
                serde_json::to_writer_pretty(&mut *f, &summary)?;
                Ok(())
            })?;
        }

        info!("saved {} bytes to {}", bytes.len(), target.display());
        Ok(target)
    }

    /// Replace the store with a snapshot.  On any error the current store
    /// is left untouched.
    ///
    /// A snapshot whose level differs from this manager's is reported as
    /// `CorruptData`.
    pub fn load(&self, path: impl AsRef<Path>) -> ManagerResult<StoreStats> {
        let source = self.config.resolve(path.as_ref());
        let bytes = fs::read(&source)?;
        let store = SegmentStore::deserialize(&bytes)?;
        if store.level() != self.index.level() {
            return Err(StoreError::CorruptData(format!(
                "snapshot level {} does not match index level {}",
                store.level(),
                self.index.level(),
            ))
            .into());
        }

        let stats = store.statistics();
        let _gate = self.exclusive()?;
        *self.write()? = store;
        info!("loaded {} cells from {}", stats.cell_count, source.display());
        Ok(stats)
    }
}

fn write_atomically(
    target: &Path,
    fill: impl FnOnce(&mut NamedTempFile) -> ManagerResult<()>,
) -> ManagerResult<()> {
    let dir = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    fill(&mut tmp)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

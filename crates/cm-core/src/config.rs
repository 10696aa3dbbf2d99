//! Map configuration.

use std::path::{Path, PathBuf};

use crate::{CoreError, CoreResult};

/// Finest supported cell level.  Level-30 cells are ~2 cm wide.
pub const MAX_LEVEL: u8 = 30;

/// Default cell level.  Level-15 cells are ~1.2 km (east-west at the
/// equator) by ~0.6 km.
pub const DEFAULT_LEVEL: u8 = 15;

/// Top-level configuration for a map index.
///
/// Typically built by the application from command-line arguments or a
/// config file and passed to the manager builder.  The level is fixed for
/// the lifetime of a store: changing it requires a full rebuild.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapConfig {
    /// Cell level every road, intersection and restriction is indexed at.
    pub level: u8,

    /// Directory that relative snapshot paths are resolved against.
    pub storage_dir: PathBuf,

    /// Write a human-readable `<name>_summary.json` next to each snapshot.
    pub write_summary: bool,
}

impl MapConfig {
    /// Default configuration at `level`.
    pub fn with_level(level: u8) -> Self {
        Self { level, ..Self::default() }
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> CoreResult<()> {
        if self.level > MAX_LEVEL {
            return Err(CoreError::InvalidLevel(self.level));
        }
        if self.storage_dir.as_os_str().is_empty() {
            return Err(CoreError::Config("storage_dir must not be empty".into()));
        }
        Ok(())
    }

    /// Resolve a snapshot path: relative paths land in `storage_dir`,
    /// absolute paths are returned unchanged.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.storage_dir.join(path)
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            level:         DEFAULT_LEVEL,
            storage_dir:   PathBuf::from("./map_data"),
            write_summary: true,
        }
    }
}

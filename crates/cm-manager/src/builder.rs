//! Fluent builder for constructing a [`MapManager`].

use std::sync::{Mutex, RwLock};

use cm_cell::CellIndex;
use cm_core::MapConfig;
use cm_fetch::RegionFetcher;
use cm_store::SegmentStore;

use crate::{ManagerError, ManagerResult, MapManager};

/// Fluent builder for [`MapManager<F>`].
///
/// # Required inputs
///
/// - [`MapConfig`] — cell level, storage directory, summary flag
/// - `F: RegionFetcher` — where raw records come from
///
/// # Optional inputs
///
/// | Method       | Default                            |
/// |--------------|------------------------------------|
/// | `.store(s)`  | empty store at `config.level`      |
///
/// # Example
///
/// ```rust,ignore
/// let manager = MapManagerBuilder::new(MapConfig::default(), fetcher)
///     .store(SegmentStore::deserialize(&bytes)?)
///     .build()?;
/// ```
pub struct MapManagerBuilder<F: RegionFetcher> {
    config:  MapConfig,
    fetcher: F,
    store:   Option<SegmentStore>,
}

impl<F: RegionFetcher> MapManagerBuilder<F> {
    pub fn new(config: MapConfig, fetcher: F) -> Self {
        Self { config, fetcher, store: None }
    }

    /// Start from an existing store.  Its level must equal `config.level`.
    pub fn store(mut self, store: SegmentStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Validate the configuration and return a ready manager.
    pub fn build(self) -> ManagerResult<MapManager<F>> {
        self.config.validate()?;
        let index = CellIndex::new(self.config.level)?;

        let store = match self.store {
            Some(store) if store.level() != self.config.level => {
                return Err(ManagerError::LevelMismatch {
                    config: self.config.level,
                    store:  store.level(),
                });
            }
            Some(store) => store,
            None => SegmentStore::new(self.config.level)?,
        };

        Ok(MapManager {
            config:  self.config,
            index,
            fetcher: self.fetcher,
            store:   RwLock::new(store),
            writer:  Mutex::new(()),
        })
    }
}

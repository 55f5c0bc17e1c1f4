//! Read-only store opener with an explicit fallback list
//!
//! Stores on a node may have been written by either engine and with either
//! key ordering. The opener walks a fixed priority list of
//! (engine, ordering) pairs and returns the first store that opens.

use nodestate_core::{
    Engine, KeyOrdering, KvStore, NsError, NsResult, OpenStrategy, StoreBackend,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::persistent::{LevelDbBackend, RocksDbBackend};

/// A store together with the strategy that opened it
pub struct OpenedStore {
    pub store: Box<dyn KvStore>,
    pub strategy: OpenStrategy,
    /// 1-based position of `strategy` in the priority list
    pub attempt: usize,
}

impl std::fmt::Debug for OpenedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedStore")
            .field("strategy", &self.strategy)
            .field("attempt", &self.attempt)
            .finish_non_exhaustive()
    }
}

/// Opens storage directories read-only, trying each strategy in order
pub struct StoreOpener {
    primary: Arc<dyn StoreBackend>,
    secondary: Arc<dyn StoreBackend>,
    strategies: Vec<OpenStrategy>,
}

impl StoreOpener {
    /// Build an opener over two engines. The priority list is primary with
    /// bytewise keys, primary with integer keys, then the same for secondary.
    pub fn new(primary: Arc<dyn StoreBackend>, secondary: Arc<dyn StoreBackend>) -> Self {
        let strategies = vec![
            OpenStrategy::new(primary.engine(), KeyOrdering::Bytewise),
            OpenStrategy::new(primary.engine(), KeyOrdering::Integer),
            OpenStrategy::new(secondary.engine(), KeyOrdering::Bytewise),
            OpenStrategy::new(secondary.engine(), KeyOrdering::Integer),
        ];
        Self {
            primary,
            secondary,
            strategies,
        }
    }

    /// LevelDB first, RocksDB second
    pub fn with_default_engines() -> Self {
        Self::new(Arc::new(LevelDbBackend), Arc::new(RocksDbBackend))
    }

    pub fn strategies(&self) -> &[OpenStrategy] {
        &self.strategies
    }

    fn backend(&self, engine: Engine) -> &Arc<dyn StoreBackend> {
        if engine == self.primary.engine() {
            &self.primary
        } else {
            &self.secondary
        }
    }

    /// Open the store at `dir`. Individual failures are logged and swallowed;
    /// when every strategy fails a [`NsError::StorageOpen`] names the store.
    pub fn open(&self, dir: &Path, name: &str) -> NsResult<OpenedStore> {
        for (i, strategy) in self.strategies.iter().enumerate() {
            match self.backend(strategy.engine).open_read_only(dir, strategy.ordering) {
                Ok(store) => {
                    info!(store = %name, strategy = %strategy, "Opened store");
                    return Ok(OpenedStore {
                        store,
                        strategy: *strategy,
                        attempt: i + 1,
                    });
                }
                Err(e) => {
                    debug!(store = %name, strategy = %strategy, error = %e, "Open attempt failed");
                }
            }
        }

        error!(store = %name, path = %dir.display(), "All open strategies failed");
        Err(NsError::StorageOpen {
            store: name.to_string(),
            path: dir.to_path_buf(),
        })
    }
}

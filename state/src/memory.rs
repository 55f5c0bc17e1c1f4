//! In-memory storage backend for testing
//!
//! Stands in for either engine: stores are registered under a directory path
//! together with the key ordering they were "written" with, and only open
//! when asked for with that same ordering. The on-disk backends enforce the
//! same rule: RocksDB checks the comparator itself, and the LevelDB backend
//! compares the name recorded in the store's MANIFEST.

use nodestate_core::{Engine, KeyOrdering, KvStore, NsError, NsResult, StoreBackend, Visit};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Default)]
struct Inner {
    stores: HashMap<PathBuf, (KeyOrdering, Vec<(Vec<u8>, Vec<u8>)>)>,
    attempts: Vec<(PathBuf, KeyOrdering)>,
}

/// In-memory backend shared between clones
#[derive(Clone)]
pub struct MemoryBackend {
    engine: Engine,
    inner: Arc<RwLock<Inner>>,
}

impl MemoryBackend {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    /// Register a store at `dir` written with `ordering`
    pub fn insert_store(
        &self,
        dir: impl AsRef<Path>,
        ordering: KeyOrdering,
        entries: Vec<(Vec<u8>, Vec<u8>)>,
    ) {
        self.inner
            .write()
            .stores
            .insert(dir.as_ref().to_path_buf(), (ordering, entries));
    }

    /// Every open attempt made so far, in order
    pub fn attempts(&self) -> Vec<(PathBuf, KeyOrdering)> {
        self.inner.read().attempts.clone()
    }
}

impl StoreBackend for MemoryBackend {
    fn engine(&self) -> Engine {
        self.engine
    }

    fn open_read_only(&self, dir: &Path, ordering: KeyOrdering) -> NsResult<Box<dyn KvStore>> {
        let mut inner = self.inner.write();
        inner.attempts.push((dir.to_path_buf(), ordering));

        match inner.stores.get(dir) {
            Some((written, entries)) if *written == ordering => {
                let mut entries = entries.clone();
                entries.sort_by(|a, b| ordering.compare(&a.0, &b.0));
                Ok(Box::new(MemoryStore { entries }))
            }
            Some((written, _)) => Err(NsError::Storage(format!(
                "comparator mismatch: store uses {} keys",
                written
            ))),
            None => Err(NsError::Storage(format!("no {} store at {}", self.engine, dir.display()))),
        }
    }
}

/// A snapshot of entries held in key order
pub struct MemoryStore {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
}

impl KvStore for MemoryStore {
    fn scan(&mut self, visit: &mut Visit<'_>) -> NsResult<()> {
        for (key, value) in &self.entries {
            visit(key, value)?;
        }
        Ok(())
    }
}

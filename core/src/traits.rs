//! Core traits defining nodestate interfaces
//!
//! Storage engines are external collaborators; these traits are the seam
//! the opener and canonicalizer talk through.

use crate::types::*;
use std::path::Path;

/// Result type for nodestate operations
pub type NsResult<T> = Result<T, crate::error::NsError>;

/// Visitor invoked for every key/value pair of a store
pub type Visit<'a> = dyn FnMut(&[u8], &[u8]) -> NsResult<()> + 'a;

/// A key-value store opened read-only.
///
/// Pairs are visited in the store's native key order. Dropping the value
/// closes the store.
pub trait KvStore {
    /// Visit every key/value pair in native order
    fn scan(&mut self, visit: &mut Visit<'_>) -> NsResult<()>;

    /// Collect every pair, in native order
    fn entries(&mut self) -> NsResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut out = Vec::new();
        self.scan(&mut |k, v| {
            out.push((k.to_vec(), v.to_vec()));
            Ok(())
        })?;
        Ok(out)
    }
}

/// A storage engine able to open an existing store directory
pub trait StoreBackend: Send + Sync {
    /// Engine family this backend implements
    fn engine(&self) -> Engine;

    /// Open `dir` strictly read-only assuming keys were written with `ordering`
    fn open_read_only(&self, dir: &Path, ordering: KeyOrdering) -> NsResult<Box<dyn KvStore>>;
}

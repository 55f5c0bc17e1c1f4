//! On-disk storage backends: LevelDB and RocksDB

use nodestate_core::{
    compare_integer_keys, Engine, KeyOrdering, KvStore, NsError, NsResult, StoreBackend, Visit,
    INTEGER_COMPARATOR,
};
use rusty_leveldb::{Cmp, LdbIterator};
use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use tempfile::TempDir;
use tracing::debug;

/// Integer comparator registered under the same name the node runtime uses
struct IntegerCmp;

impl Cmp for IntegerCmp {
    fn cmp(&self, a: &[u8], b: &[u8]) -> Ordering {
        compare_integer_keys(a, b)
    }

    // Identity separators are always valid, just less compact
    fn find_shortest_sep(&self, from: &[u8], _to: &[u8]) -> Vec<u8> {
        from.to_vec()
    }

    fn find_short_succ(&self, key: &[u8]) -> Vec<u8> {
        key.to_vec()
    }

    fn id(&self) -> &'static str {
        INTEGER_COMPARATOR
    }
}

/// Comparator recorded by stores created with the default ordering
const BYTEWISE_COMPARATOR: &str = "leveldb.BytewiseComparator";

const LOG_BLOCK_SIZE: usize = 32 * 1024;
const LOG_HEADER_SIZE: usize = 7;
const COMPARATOR_TAG: u64 = 1;

fn leveldb_options(ordering: KeyOrdering) -> rusty_leveldb::Options {
    let mut opt = rusty_leveldb::Options::default();
    opt.create_if_missing = false;
    if ordering == KeyOrdering::Integer {
        opt.cmp = Rc::new(Box::new(IntegerCmp));
    }
    opt
}

fn comparator_for(ordering: KeyOrdering) -> &'static str {
    match ordering {
        KeyOrdering::Bytewise => BYTEWISE_COMPARATOR,
        KeyOrdering::Integer => INTEGER_COMPARATOR,
    }
}

/// Comparator name stored in the MANIFEST that `CURRENT` points at.
///
/// `None` when no edit carries a comparator record.
pub fn leveldb_comparator(dir: &Path) -> NsResult<Option<String>> {
    let current = fs::read_to_string(dir.join("CURRENT"))?;
    let manifest = current.trim();
    if manifest.is_empty() || manifest.contains(&['/', '\\'][..]) {
        return Err(NsError::Storage(format!("bad CURRENT in {}", dir.display())));
    }

    let bytes = fs::read(dir.join(manifest))?;
    for record in log_records(&bytes) {
        let mut pos = 0;
        if read_varint(&record, &mut pos) != Some(COMPARATOR_TAG) {
            continue;
        }
        let name = read_varint(&record, &mut pos)
            .and_then(|len| record.get(pos..pos.checked_add(len as usize)?))
            .ok_or_else(|| NsError::Storage(format!("corrupt comparator record in {}", manifest)))?;
        return Ok(Some(String::from_utf8_lossy(name).into_owned()));
    }
    Ok(None)
}

/// Reassemble the records of a LevelDB log file (32 KiB blocks, fragments
/// typed full/first/middle/last)
fn log_records(buf: &[u8]) -> Vec<Vec<u8>> {
    let mut records = Vec::new();
    let mut pending = Vec::new();
    let mut pos = 0;
    while pos + LOG_HEADER_SIZE <= buf.len() {
        let left = LOG_BLOCK_SIZE - pos % LOG_BLOCK_SIZE;
        if left < LOG_HEADER_SIZE {
            pos += left;
            continue;
        }
        let len = u16::from_le_bytes([buf[pos + 4], buf[pos + 5]]) as usize;
        let kind = buf[pos + 6];
        let start = pos + LOG_HEADER_SIZE;
        let Some(payload) = buf.get(start..start + len) else {
            break;
        };
        pos = start + len;
        match kind {
            1 => records.push(payload.to_vec()),
            2 => pending = payload.to_vec(),
            3 => pending.extend_from_slice(payload),
            4 => {
                pending.extend_from_slice(payload);
                records.push(std::mem::take(&mut pending));
            }
            // zero padding
            _ => pending.clear(),
        }
    }
    records
}

fn read_varint(buf: &[u8], pos: &mut usize) -> Option<u64> {
    let mut value = 0u64;
    for shift in (0..64).step_by(7) {
        let byte = *buf.get(*pos)?;
        *pos += 1;
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Some(value);
        }
    }
    None
}

/// Copy the store's files into a private directory. Opening a LevelDB store
/// rotates its info log and replays its write-ahead log into new tables,
/// so the engine only ever sees the copy.
fn working_copy(dir: &Path) -> NsResult<TempDir> {
    let copy = tempfile::Builder::new().prefix("nodestate-ldb-").tempdir()?;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() && entry.file_name() != "LOCK" {
            fs::copy(entry.path(), copy.path().join(entry.file_name()))?;
        }
    }
    Ok(copy)
}

/// LevelDB backend.
///
/// The engine has no read-only mode and does not check the comparator a
/// store was written with. Both are handled here: the recorded comparator
/// must match the requested ordering, and the engine opens a working copy
/// that is removed when the store is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelDbBackend;

impl StoreBackend for LevelDbBackend {
    fn engine(&self) -> Engine {
        Engine::LevelDb
    }

    fn open_read_only(&self, dir: &Path, ordering: KeyOrdering) -> NsResult<Box<dyn KvStore>> {
        let recorded = leveldb_comparator(dir)?;
        let recorded = recorded.as_deref().unwrap_or(BYTEWISE_COMPARATOR);
        if recorded != comparator_for(ordering) {
            return Err(NsError::Storage(format!(
                "comparator mismatch: store uses {}, asked for {}",
                recorded,
                comparator_for(ordering)
            )));
        }

        let copy = working_copy(dir)?;
        debug!(store = %dir.display(), copy = %copy.path().display(), "Opening LevelDB working copy");
        let db = rusty_leveldb::DB::open(copy.path(), leveldb_options(ordering))
            .map_err(|e| NsError::Storage(e.to_string()))?;
        Ok(Box::new(LevelDbStore { db, _copy: copy }))
    }
}

pub struct LevelDbStore {
    db: rusty_leveldb::DB,
    // dropped after `db`
    _copy: TempDir,
}

impl KvStore for LevelDbStore {
    fn scan(&mut self, visit: &mut Visit<'_>) -> NsResult<()> {
        let mut iter = self
            .db
            .new_iter()
            .map_err(|e| NsError::Storage(e.to_string()))?;
        let mut key = Vec::new();
        let mut value = Vec::new();
        while iter.advance() {
            if iter.current(&mut key, &mut value) {
                visit(&key, &value)?;
            }
        }
        Ok(())
    }
}

/// RocksDB backend, opened with `open_for_read_only`
#[derive(Debug, Clone, Copy, Default)]
pub struct RocksDbBackend;

impl StoreBackend for RocksDbBackend {
    fn engine(&self) -> Engine {
        Engine::RocksDb
    }

    fn open_read_only(&self, dir: &Path, ordering: KeyOrdering) -> NsResult<Box<dyn KvStore>> {
        let mut opts = rocksdb::Options::default();
        opts.create_if_missing(false);
        if ordering == KeyOrdering::Integer {
            opts.set_comparator(INTEGER_COMPARATOR, Box::new(compare_integer_keys));
        }
        let db = rocksdb::DB::open_for_read_only(&opts, dir, false)
            .map_err(|e| NsError::Storage(e.to_string()))?;
        Ok(Box::new(RocksDbStore { db }))
    }
}

pub struct RocksDbStore {
    db: rocksdb::DB,
}

impl KvStore for RocksDbStore {
    fn scan(&mut self, visit: &mut Visit<'_>) -> NsResult<()> {
        for item in self.db.iterator(rocksdb::IteratorMode::Start) {
            let (key, value) = item.map_err(|e| NsError::Storage(e.to_string()))?;
            visit(&key, &value)?;
        }
        Ok(())
    }
}

//! Ledger canonicalization
//!
//! Transactions are emitted one per line in ledger order, each as
//! `<seq_no> <canonical JSON>`. When the ledger's merkle-leaf store is
//! available every transaction is checked against its stored leaf hash.

use nodestate_core::{KvStore, NsResult};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

use crate::merkle::{ChainAudit, LeafCheck, LeafIndex};
use crate::render::render;

/// What a ledger pass produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerSummary {
    pub transactions: usize,
    pub audit: ChainAudit,
}

/// Canonical text of one transaction: JSON re-serialized with sorted keys,
/// or the best-effort rendering when the value is not JSON
pub fn canonical_txn(raw: &[u8]) -> String {
    match serde_json::from_slice::<serde_json::Value>(raw) {
        Ok(value) => value.to_string(),
        Err(_) => render(raw).to_string(),
    }
}

/// Write every transaction of `store` to `out`.
///
/// Leaves are assumed to hash the transaction bytes as stored. Individual
/// mismatches are logged at debug level only; the caller reports the totals.
///
/// The output file is opened in append mode, so running twice against the
/// same output accumulates both passes. That matches the historical tool's
/// behavior and may be incidental rather than a designed guarantee.
pub fn canonicalize_ledger(
    name: &str,
    store: &mut dyn KvStore,
    leaves: Option<&LeafIndex>,
    out: &Path,
) -> NsResult<LedgerSummary> {
    let file = OpenOptions::new().create(true).append(true).open(out)?;
    let mut writer = BufWriter::new(file);
    let mut summary = LedgerSummary::default();

    store.scan(&mut |key, value| {
        if let Some(leaves) = leaves {
            let check = leaves.check(key, value);
            if check != LeafCheck::Match {
                debug!(ledger = %name, seq_no = %render(key), result = ?check, "Transaction does not match merkle leaf");
            }
            summary.audit.record(check);
        }
        writeln!(writer, "{} {}", render(key), canonical_txn(value))?;
        summary.transactions += 1;
        Ok(())
    })?;

    writer.flush()?;
    debug!(ledger = %name, txns = summary.transactions, "Ledger canonicalized");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merkle::leaf_hash;
    use nodestate_core::{Engine, KeyOrdering, StoreBackend};
    use nodestate_state::MemoryBackend;
    use tempfile::TempDir;

    fn ledger_store(entries: Vec<(Vec<u8>, Vec<u8>)>) -> Box<dyn KvStore> {
        let backend = MemoryBackend::new(Engine::LevelDb);
        backend.insert_store("/l", KeyOrdering::Integer, entries);
        backend.open_read_only(Path::new("/l"), KeyOrdering::Integer).unwrap()
    }

    #[test]
    fn test_txn_json_is_key_sorted() {
        assert_eq!(canonical_txn(br#"{"b": 1, "a": {"d": 2, "c": 3}}"#), r#"{"a":{"c":3,"d":2},"b":1}"#);
        assert_eq!(canonical_txn(b"\xff\x00"), "0xff00");
    }

    #[test]
    fn test_ledger_order_and_append() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("domain_transactions");
        let entries = vec![
            (b"10".to_vec(), br#"{"seq": 10}"#.to_vec()),
            (b"2".to_vec(), br#"{"seq": 2}"#.to_vec()),
        ];

        let summary = canonicalize_ledger("domain", ledger_store(entries.clone()).as_mut(), None, &out).unwrap();
        assert_eq!(summary.transactions, 2);
        let first = std::fs::read_to_string(&out).unwrap();
        assert_eq!(first, "2 {\"seq\":2}\n10 {\"seq\":10}\n");

        canonicalize_ledger("domain", ledger_store(entries).as_mut(), None, &out).unwrap();
        let second = std::fs::read_to_string(&out).unwrap();
        assert_eq!(second, format!("{first}{first}"));
    }

    #[test]
    fn test_leaf_audit_counts_mismatches() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("pool_transactions");
        let good = br#"{"txn": 1}"#.to_vec();
        let leaves = LeafIndex::from_entries(vec![
            (b"1".to_vec(), leaf_hash(&good).to_vec()),
            (b"2".to_vec(), leaf_hash(b"something else").to_vec()),
        ]);
        let entries = vec![
            (b"1".to_vec(), good),
            (b"2".to_vec(), br#"{"txn": 2}"#.to_vec()),
            (b"3".to_vec(), br#"{"txn": 3}"#.to_vec()),
        ];

        let summary = canonicalize_ledger("pool", ledger_store(entries).as_mut(), Some(&leaves), &out).unwrap();
        assert_eq!(summary.transactions, 3);
        assert_eq!(summary.audit, ChainAudit { checked: 3, mismatched: 1, missing: 1 });
    }

    #[test]
    fn test_leaf_mismatches_do_not_change_output() {
        let tmp = TempDir::new().unwrap();
        let audited = tmp.path().join("audited");
        let plain = tmp.path().join("plain");
        let entries = vec![
            (b"1".to_vec(), br#"{"txn": 1}"#.to_vec()),
            (b"2".to_vec(), br#"{"txn": 2}"#.to_vec()),
        ];
        let leaves = LeafIndex::from_entries(vec![
            (b"1".to_vec(), leaf_hash(b"other serialization").to_vec()),
            (b"2".to_vec(), leaf_hash(b"another one").to_vec()),
        ]);

        let summary =
            canonicalize_ledger("pool", ledger_store(entries.clone()).as_mut(), Some(&leaves), &audited).unwrap();
        canonicalize_ledger("pool", ledger_store(entries).as_mut(), None, &plain).unwrap();

        assert_eq!(summary.audit, ChainAudit { checked: 2, mismatched: 2, missing: 0 });
        assert_eq!(std::fs::read(&audited).unwrap(), std::fs::read(&plain).unwrap());
    }
}

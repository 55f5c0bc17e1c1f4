//! Merkle leaf hashing for the ledger hash-chain audit

use sha2::{Digest, Sha256};
use std::collections::HashMap;

const LEAF_PREFIX: u8 = 0x00;

/// RFC 6962 leaf hash: `SHA-256(0x00 || data)`
pub fn leaf_hash(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(data);
    hasher.finalize().into()
}

/// Decode a stored leaf: 32 raw bytes or 64 hex characters
fn decode_leaf(value: &[u8]) -> Option<[u8; 32]> {
    if let Ok(raw) = <[u8; 32]>::try_from(value) {
        return Some(raw);
    }
    let decoded = hex::decode(std::str::from_utf8(value).ok()?.trim()).ok()?;
    <[u8; 32]>::try_from(decoded.as_slice()).ok()
}

/// Leaves of a ledger's merkle tree keyed like the ledger's transactions
#[derive(Debug, Default)]
pub struct LeafIndex {
    leaves: HashMap<Vec<u8>, [u8; 32]>,
}

impl LeafIndex {
    pub fn from_entries(entries: Vec<(Vec<u8>, Vec<u8>)>) -> Self {
        let leaves = entries
            .into_iter()
            .filter_map(|(k, v)| decode_leaf(&v).map(|leaf| (k, leaf)))
            .collect();
        Self { leaves }
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Check one transaction against its stored leaf
    pub fn check(&self, key: &[u8], txn: &[u8]) -> LeafCheck {
        match self.leaves.get(key) {
            None => LeafCheck::Missing,
            Some(stored) if *stored == leaf_hash(txn) => LeafCheck::Match,
            Some(_) => LeafCheck::Mismatch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafCheck {
    Match,
    Mismatch,
    Missing,
}

/// Running totals of a ledger audit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainAudit {
    pub checked: usize,
    pub mismatched: usize,
    pub missing: usize,
}

impl ChainAudit {
    pub fn record(&mut self, check: LeafCheck) {
        self.checked += 1;
        match check {
            LeafCheck::Match => {}
            LeafCheck::Mismatch => self.mismatched += 1,
            LeafCheck::Missing => self.missing += 1,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.mismatched == 0 && self.missing == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_leaf_hash_vector() {
        // SHA-256 of the single byte 0x00
        assert_eq!(
            hex::encode(leaf_hash(b"")),
            "6e340b9cffb37a989ca544e6bb780a2c78901d3fb33738768511a30617afa01d"
        );
    }

    #[test]
    fn test_leaf_index_accepts_raw_and_hex() {
        let txn = br#"{"txn":{"type":"1"}}"#;
        let raw = leaf_hash(txn).to_vec();
        let hexed = hex::encode(leaf_hash(txn)).into_bytes();
        let index = LeafIndex::from_entries(vec![(b"1".to_vec(), raw), (b"2".to_vec(), hexed)]);

        assert_eq!(index.check(b"1", txn), LeafCheck::Match);
        assert_eq!(index.check(b"2", txn), LeafCheck::Match);
        assert_eq!(index.check(b"2", b"tampered"), LeafCheck::Mismatch);
        assert_eq!(index.check(b"3", txn), LeafCheck::Missing);
    }

    #[test]
    fn test_audit_totals() {
        let mut audit = ChainAudit::default();
        audit.record(LeafCheck::Match);
        assert!(audit.is_clean());
        audit.record(LeafCheck::Mismatch);
        audit.record(LeafCheck::Missing);
        assert_eq!(audit, ChainAudit { checked: 3, mismatched: 1, missing: 1 });
        assert!(!audit.is_clean());
    }
}

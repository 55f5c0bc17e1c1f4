//! Entity categories and the name-suffix classifier

use nodestate_core::{CategorySuffixes, PathParts};
use std::fmt;
use std::path::Path;

/// What an entity in a state tree is, as far as the classifier cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A directory carrying the storage sentinels
    StorageDir,
    File,
}

/// Canonicalization category. Exactly one applies per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Append-only transaction ledger
    Ledger,
    /// Pruning trie state
    TrieState,
    MerkleLeaves,
    MerkleNodes,
    /// Signed state roots
    StateSignature,
    /// Node runtime metadata file
    Metadata,
    /// Any other storage directory
    GenericStore,
    /// Any other file
    PlainFile,
}

impl Category {
    /// Classify an entity by its base name
    pub fn classify(name: &str, kind: EntryKind, suffixes: &CategorySuffixes) -> Self {
        let parts = PathParts::of(Path::new(name));
        let ends = |suffix: &str| parts.has_suffix(suffix);

        match kind {
            EntryKind::File if ends(&suffixes.metadata) => Category::Metadata,
            EntryKind::File => Category::PlainFile,
            EntryKind::StorageDir if ends(&suffixes.ledger) => Category::Ledger,
            EntryKind::StorageDir if ends(&suffixes.merkle_leaves) => Category::MerkleLeaves,
            EntryKind::StorageDir if ends(&suffixes.merkle_nodes) => Category::MerkleNodes,
            EntryKind::StorageDir if ends(&suffixes.state_signature) => Category::StateSignature,
            EntryKind::StorageDir if ends(&suffixes.trie_state) => Category::TrieState,
            EntryKind::StorageDir => Category::GenericStore,
        }
    }

    /// Whether this category is read through the store opener
    pub fn is_store(&self) -> bool {
        !matches!(self, Category::Metadata | Category::PlainFile)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Ledger => "ledger",
            Category::TrieState => "trie state",
            Category::MerkleLeaves => "merkle leaves",
            Category::MerkleNodes => "merkle nodes",
            Category::StateSignature => "state signature",
            Category::Metadata => "metadata",
            Category::GenericStore => "store",
            Category::PlainFile => "file",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(name: &str) -> Category {
        Category::classify(name, EntryKind::StorageDir, &CategorySuffixes::default())
    }

    fn file(name: &str) -> Category {
        Category::classify(name, EntryKind::File, &CategorySuffixes::default())
    }

    #[test]
    fn test_store_categories() {
        assert_eq!(store("domain_transactions"), Category::Ledger);
        assert_eq!(store("pool_merkleLeaves"), Category::MerkleLeaves);
        assert_eq!(store("config_merkleNodes"), Category::MerkleNodes);
        assert_eq!(store("domain_state"), Category::TrieState);
        assert_eq!(store("state_signature"), Category::StateSignature);
        assert_eq!(store("state_ts_db"), Category::GenericStore);
        assert_eq!(store("seq_no_db"), Category::GenericStore);
    }

    #[test]
    fn test_file_categories() {
        assert_eq!(file("Node1_info.json"), Category::Metadata);
        assert_eq!(file("domain_transactions"), Category::PlainFile);
        assert_eq!(file("genesis.json"), Category::PlainFile);
    }

    #[test]
    fn test_only_stores_use_the_opener() {
        assert!(Category::Ledger.is_store());
        assert!(Category::GenericStore.is_store());
        assert!(!Category::Metadata.is_store());
        assert!(!Category::PlainFile.is_store());
    }
}

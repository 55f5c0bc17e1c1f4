//! State tree canonicalization
//!
//! Walks a node's data directory and writes one canonical text file per
//! entity into an output tree. Storage directories are read through the
//! store opener and dispatched on their [`Category`]; plain directories are
//! recreated and traversed.

use nodestate_core::{CanonConfig, KvStore, NsError, NsResult};
use nodestate_state::{is_storage_dir, StoreOpener};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Component, Path};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::category::{Category, EntryKind};
use crate::ledger::canonicalize_ledger;
use crate::merkle::LeafIndex;
use crate::normalize::NameNormalizer;
use crate::render::{record_line, render};
use crate::scrub::{scrub_metadata, scrub_signature};
use crate::skip::SkipFilter;

/// Totals for one canonicalized tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CanonStats {
    pub stores: usize,
    pub ledgers: usize,
    pub transactions: usize,
    pub files_copied: usize,
    pub metadata: usize,
    pub skipped: usize,
    /// Transactions whose merkle leaf was missing or different
    pub chain_mismatches: usize,
}

pub struct Canonicalizer<'a> {
    config: &'a CanonConfig,
    opener: &'a StoreOpener,
    skip: SkipFilter,
    normalizer: NameNormalizer,
}

impl<'a> Canonicalizer<'a> {
    pub fn new(config: &'a CanonConfig, opener: &'a StoreOpener, skip: SkipFilter, node: &str) -> Self {
        Self {
            config,
            opener,
            skip,
            normalizer: NameNormalizer::new(node, config.placeholder.clone()),
        }
    }

    /// Canonicalize everything under `data_dir` into `out_root`
    pub fn canonicalize_tree(&self, data_dir: &Path, out_root: &Path) -> NsResult<CanonStats> {
        fs::create_dir_all(out_root)?;
        let mut stats = CanonStats::default();

        let mut walker = WalkDir::new(data_dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = entry?;
            let rel = entry
                .path()
                .strip_prefix(data_dir)
                .map_err(|e| NsError::Io(e.to_string()))?;
            let name = entry.file_name().to_string_lossy().into_owned();

            if entry.file_type().is_dir() {
                if self.skip.skips_dir(&name) || self.is_recorder(rel) {
                    debug!(path = %rel.display(), "Skipping directory");
                    stats.skipped += 1;
                    walker.skip_current_dir();
                    continue;
                }

                if is_storage_dir(entry.path())? {
                    let category = Category::classify(&name, EntryKind::StorageDir, &self.config.suffixes);
                    let out = out_root.join(self.normalizer.path(rel));
                    self.dispatch(category, entry.path(), &name, &out, &mut stats)?;
                    walker.skip_current_dir();
                } else {
                    fs::create_dir_all(out_root.join(self.normalizer.path(rel)))?;
                }
                continue;
            }

            if self.skip.skips_file(&name) {
                debug!(path = %rel.display(), "Skipping file");
                stats.skipped += 1;
                continue;
            }

            let category = Category::classify(&name, EntryKind::File, &self.config.suffixes);
            let parent = out_root.join(self.normalizer.path(rel.parent().unwrap_or(Path::new(""))));
            let out = match category {
                Category::Metadata => parent.join(&*self.normalizer.file_name(&name)),
                _ => parent.join(self.normalizer.segment(&name)),
            };
            self.dispatch(category, entry.path(), &name, &out, &mut stats)?;
        }

        info!(
            node = %self.normalizer.node(),
            stores = stats.stores,
            ledgers = stats.ledgers,
            txns = stats.transactions,
            copied = stats.files_copied,
            skipped = stats.skipped,
            chain_mismatches = stats.chain_mismatches,
            "Canonicalized state tree"
        );
        Ok(stats)
    }

    /// `<node>/<recorder_dir>`: only present when state was captured during
    /// a replay
    fn is_recorder(&self, rel: &Path) -> bool {
        let parts: Vec<_> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s),
                _ => None,
            })
            .collect();
        parts.len() == 2
            && parts[0] == self.normalizer.node()
            && parts[1] == self.config.recorder_dir.as_str()
    }

    fn dispatch(
        &self,
        category: Category,
        src: &Path,
        name: &str,
        out: &Path,
        stats: &mut CanonStats,
    ) -> NsResult<()> {
        debug!(category = %category, store = category.is_store(), src = %src.display(), "Canonicalizing");
        match category {
            Category::Ledger => self.ledger(src, name, out, stats),
            Category::TrieState => self.trie_state(src, name, out, stats),
            Category::MerkleLeaves | Category::MerkleNodes => self.merkle(src, name, out, stats),
            Category::StateSignature => self.state_signature(src, name, out, stats),
            Category::Metadata => self.metadata(src, name, out, stats),
            Category::GenericStore => self.generic_store(src, name, out, stats),
            Category::PlainFile => self.plain_file(src, out, stats),
        }
    }

    fn open(&self, dir: &Path, name: &str, stats: &mut CanonStats) -> NsResult<Box<dyn KvStore>> {
        let opened = self.opener.open(dir, name)?;
        stats.stores += 1;
        Ok(opened.store)
    }

    fn ledger(&self, dir: &Path, name: &str, out: &Path, stats: &mut CanonStats) -> NsResult<()> {
        // Leaves are read and the store closed before the ledger is opened
        let leaves = self.leaves_for(dir, name)?;
        let mut store = self.open(dir, name, stats)?;
        let summary = canonicalize_ledger(name, store.as_mut(), leaves.as_ref(), out)?;

        if !summary.audit.is_clean() {
            warn!(
                ledger = %name,
                mismatched = summary.audit.mismatched,
                missing = summary.audit.missing,
                "Ledger does not match its merkle leaves"
            );
        }
        stats.ledgers += 1;
        stats.transactions += summary.transactions;
        stats.chain_mismatches += summary.audit.mismatched + summary.audit.missing;
        Ok(())
    }

    /// The sibling merkle-leaf store of a ledger, when there is one
    fn leaves_for(&self, ledger_dir: &Path, name: &str) -> NsResult<Option<LeafIndex>> {
        let suffixes = &self.config.suffixes;
        let Some(base) = name.strip_suffix(suffixes.ledger.as_str()) else {
            return Ok(None);
        };
        let leaves_name = format!("{}{}", base, suffixes.merkle_leaves);
        let Some(leaves_dir) = ledger_dir.parent().map(|p| p.join(&leaves_name)) else {
            return Ok(None);
        };
        if self.skip.skips_dir(&leaves_name) || !is_storage_dir(&leaves_dir)? {
            debug!(ledger = %name, "No merkle leaves to audit against");
            return Ok(None);
        }

        let mut store = self.opener.open(&leaves_dir, &leaves_name)?.store;
        let leaves = LeafIndex::from_entries(store.entries()?);
        debug!(ledger = %name, leaves = leaves.len(), "Loaded merkle leaves");
        Ok(Some(leaves))
    }

    fn trie_state(&self, dir: &Path, name: &str, out: &Path, stats: &mut CanonStats) -> NsResult<()> {
        let mut store = self.open(dir, name, stats)?;
        let n = write_records(store.as_mut(), out, |k, v| record_line(k, v))?;
        debug!(store = %name, entries = n, "Trie state written");
        Ok(())
    }

    fn merkle(&self, dir: &Path, name: &str, out: &Path, stats: &mut CanonStats) -> NsResult<()> {
        let mut store = self.open(dir, name, stats)?;
        let n = write_records(store.as_mut(), out, |k, v| record_line(k, v))?;
        debug!(store = %name, entries = n, "Merkle store written");
        Ok(())
    }

    fn state_signature(&self, dir: &Path, name: &str, out: &Path, stats: &mut CanonStats) -> NsResult<()> {
        let mut store = self.open(dir, name, stats)?;
        write_records(store.as_mut(), out, |k, v| match scrub_signature(v) {
            Some(value) if !value.contains(&['\n', '\r'][..]) => format!("{} = {}\n", render(k), value),
            Some(_) => {
                warn!(store = %name, key = %render(k), "Signature value spans several lines, keeping the raw record");
                record_line(k, v)
            }
            None => {
                warn!(store = %name, key = %render(k), "Signature record has no value field");
                record_line(k, v)
            }
        })?;
        Ok(())
    }

    fn generic_store(&self, dir: &Path, name: &str, out: &Path, stats: &mut CanonStats) -> NsResult<()> {
        let mut store = self.open(dir, name, stats)?;
        write_records(store.as_mut(), out, |k, v| record_line(k, v))?;
        Ok(())
    }

    fn metadata(&self, src: &Path, name: &str, out: &Path, stats: &mut CanonStats) -> NsResult<()> {
        let document = fs::read(src)?;
        match scrub_metadata(&document) {
            Some(scrubbed) => {
                fs::write(out, format!("{}\n", scrubbed))?;
                stats.metadata += 1;
            }
            None => {
                warn!(file = %name, "Metadata is not a JSON object, copying as is");
                fs::write(out, &document)?;
                stats.files_copied += 1;
            }
        }
        Ok(())
    }

    fn plain_file(&self, src: &Path, out: &Path, stats: &mut CanonStats) -> NsResult<()> {
        fs::copy(src, out)?;
        stats.files_copied += 1;
        Ok(())
    }
}

/// Write one line per pair of `store` to a fresh `out` file
fn write_records<F>(store: &mut dyn KvStore, out: &Path, mut line: F) -> NsResult<usize>
where
    F: FnMut(&[u8], &[u8]) -> String,
{
    let mut writer = BufWriter::new(File::create(out)?);
    let mut count = 0;
    store.scan(&mut |k, v| {
        writer.write_all(line(k, v).as_bytes())?;
        count += 1;
        Ok(())
    })?;
    writer.flush()?;
    Ok(count)
}

//! Snapshot comparison pipeline
//!
//! validate -> resolve -> canonicalize both -> log tail -> diff, with every
//! temporary directory released exactly once when the run ends.

use nodestate_canon::{CanonStats, Canonicalizer, LogTail, LogTailExtractor, SkipFilter};
use nodestate_core::{join_relative, CompareConfig, NsError, NsResult};
use nodestate_state::{
    validate_input, ArchiveResolver, ResolvedSnapshot, RetainedDir, StoreOpener, TempKind,
    TempResources,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::diff::TreeDiff;

/// Subdirectory of a canonical root holding the canonicalized data tree
pub const CANON_DATA_DIR: &str = "data";

/// What one side of the comparison produced
#[derive(Debug, Clone)]
pub struct SnapshotReport {
    pub node: String,
    pub data_dir: PathBuf,
    pub canon_root: PathBuf,
    pub stats: CanonStats,
    pub log: Option<LogTail>,
}

#[derive(Debug, Clone)]
pub struct CompareOutcome {
    pub left: SnapshotReport,
    pub right: SnapshotReport,
    pub diff: TreeDiff,
}

impl CompareOutcome {
    pub fn is_identical(&self) -> bool {
        self.diff.is_identical()
    }
}

/// A finished run: the comparison result plus whatever was kept on disk
#[derive(Debug)]
pub struct CompareRun {
    pub outcome: NsResult<CompareOutcome>,
    pub retained: Vec<RetainedDir>,
}

struct Side {
    node: String,
    data_dir: PathBuf,
    canon_root: PathBuf,
}

pub struct Comparator {
    config: Arc<CompareConfig>,
    opener: Arc<StoreOpener>,
}

impl Comparator {
    pub fn new(config: CompareConfig, opener: Arc<StoreOpener>) -> Self {
        Self {
            config: Arc::new(config),
            opener,
        }
    }

    /// Compare two snapshots.
    ///
    /// The comparison's own failures are carried in [`CompareRun::outcome`];
    /// the outer error is reserved for failures to release temporary
    /// directories.
    pub async fn run(&self, state1: &Path, state2: &Path) -> NsResult<CompareRun> {
        let mut temps = TempResources::new();
        let outcome = self.compare(state1, state2, &mut temps).await;
        if let Err(e) = &outcome {
            error!("Comparison failed: {}", e);
        }

        let retained = temps.release(self.config.cleanup)?;
        Ok(CompareRun { outcome, retained })
    }

    async fn compare(&self, state1: &Path, state2: &Path, temps: &mut TempResources) -> NsResult<CompareOutcome> {
        let problems: Vec<String> = [("state1", state1), ("state2", state2)]
            .into_iter()
            .filter_map(|(label, path)| validate_input(label, path))
            .collect();
        if !problems.is_empty() {
            return Err(NsError::Validation(problems));
        }

        let left = ArchiveResolver::resolve(state1, temps)?;
        let right = ArchiveResolver::resolve(state2, temps)?;

        let mut problems = Vec::new();
        let left_data = self.data_dir("state1", &left, &mut problems);
        let right_data = self.data_dir("state2", &right, &mut problems);
        if !problems.is_empty() {
            return Err(NsError::Validation(problems));
        }

        let left = Side {
            node: left.node_name,
            data_dir: left_data,
            canon_root: temps.create(TempKind::Canonical, "nodestate-canon-")?,
        };
        let right = Side {
            node: right.node_name,
            data_dir: right_data,
            canon_root: temps.create(TempKind::Canonical, "nodestate-canon-")?,
        };

        let (left, right) = if same_dir(&left.data_dir, &right.data_dir) {
            debug!(dir = %left.data_dir.display(), "Both snapshots share a data directory, canonicalizing in turn");
            let l = self.canonicalize(left).await?;
            let r = self.canonicalize(right).await?;
            (l, r)
        } else {
            let (l, r) = tokio::join!(self.canonicalize(left), self.canonicalize(right));
            (l?, r?)
        };

        let diff = TreeDiff::compute(&left.canon_root, &right.canon_root)?;
        info!(
            left = %left.node,
            right = %right.node,
            differences = diff.differences().len(),
            "Diff complete"
        );

        Ok(CompareOutcome { left, right, diff })
    }

    fn data_dir(&self, label: &str, snapshot: &ResolvedSnapshot, problems: &mut Vec<String>) -> PathBuf {
        let dir = join_relative(&snapshot.root, &self.config.data_dir);
        if !dir.is_dir() {
            problems.push(format!(
                "{}: data directory {} not found in {}",
                label,
                self.config.data_dir.display(),
                snapshot.original.display()
            ));
        }
        dir
    }

    async fn canonicalize(&self, side: Side) -> NsResult<SnapshotReport> {
        let config = self.config.clone();
        let opener = self.opener.clone();
        tokio::task::spawn_blocking(move || canonicalize_snapshot(&config, &opener, side))
            .await
            .map_err(|e| NsError::Runtime(format!("canonicalization task failed: {}", e)))?
    }
}

fn canonicalize_snapshot(config: &CompareConfig, opener: &StoreOpener, side: Side) -> NsResult<SnapshotReport> {
    info!(node = %side.node, data = %side.data_dir.display(), "Canonicalizing snapshot");
    let skip = SkipFilter::new(config.skip_files.iter().cloned(), config.skip_dirs.iter().cloned());
    let canonicalizer = Canonicalizer::new(&config.canon, opener, skip, &side.node);
    let stats = canonicalizer.canonicalize_tree(&side.data_dir, &side.canon_root.join(CANON_DATA_DIR))?;

    let log = LogTailExtractor::new(config.canon.log.clone())?.extract(&side.data_dir, &side.node, &side.canon_root)?;

    Ok(SnapshotReport {
        node: side.node,
        data_dir: side.data_dir,
        canon_root: side.canon_root,
        stats,
        log,
    })
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

//! Temporary directory ownership for a single run
//!
//! Every directory the run creates (archive extractions, canonical trees,
//! replay output) is registered here and released exactly once at the end
//! of the run.

use nodestate_core::NsResult;
use std::fmt;
use std::path::PathBuf;
use tempfile::TempDir;
use tracing::{debug, info};

/// Why a temporary directory exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempKind {
    Extraction,
    Canonical,
    ReplayOutput,
}

impl fmt::Display for TempKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TempKind::Extraction => write!(f, "extraction"),
            TempKind::Canonical => write!(f, "canonical"),
            TempKind::ReplayOutput => write!(f, "replay output"),
        }
    }
}

struct TempResource {
    kind: TempKind,
    dir: TempDir,
}

/// A directory kept on disk because cleanup was disabled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetainedDir {
    pub kind: TempKind,
    pub path: PathBuf,
}

/// The set of temporary directories owned by a run
#[derive(Default)]
pub struct TempResources {
    resources: Vec<TempResource>,
}

impl TempResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a fresh temporary directory
    pub fn create(&mut self, kind: TempKind, prefix: &str) -> NsResult<PathBuf> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        let path = dir.path().to_path_buf();
        debug!(kind = %kind, path = %path.display(), "Created temporary directory");
        self.resources.push(TempResource { kind, dir });
        Ok(path)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Release every directory.
    ///
    /// With `cleanup` the directories are removed and removal errors
    /// propagate. Without it they are left on disk and returned so the
    /// operator can dispose of them.
    pub fn release(self, cleanup: bool) -> NsResult<Vec<RetainedDir>> {
        let mut retained = Vec::new();
        for TempResource { kind, dir } in self.resources {
            if cleanup {
                debug!(kind = %kind, path = %dir.path().display(), "Removing temporary directory");
                dir.close()?;
            } else {
                let path = dir.keep();
                info!(kind = %kind, path = %path.display(), "Keeping temporary directory");
                retained.push(RetainedDir { kind, path });
            }
        }
        Ok(retained)
    }
}

//! Path decomposition into directory, base name, stem and extension

use std::path::{Component, Path, PathBuf};

/// The pieces of a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParts {
    pub dir: PathBuf,
    pub base: String,
    /// Base name up to the first `.`
    pub stem: String,
    /// Everything after the first `.`, e.g. `tar.gz`
    pub ext: String,
}

impl PathParts {
    pub fn of(path: &Path) -> Self {
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let base = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let (stem, ext) = match base.find('.') {
            // leading dot is part of the name (".hidden")
            Some(0) | None => (base.clone(), String::new()),
            Some(i) => (base[..i].to_string(), base[i + 1..].to_string()),
        };

        Self {
            dir,
            base,
            stem,
            ext,
        }
    }

    /// Whether the base name ends with `suffix`
    pub fn has_suffix(&self, suffix: &str) -> bool {
        !suffix.is_empty() && self.base.ends_with(suffix)
    }
}

/// Join `rel` onto `root`, dropping `.` components so parents resolve cleanly
pub fn join_relative(root: &Path, rel: &Path) -> PathBuf {
    let mut out = root.to_path_buf();
    for component in rel.components() {
        match component {
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

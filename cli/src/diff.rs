//! Recursive tree diff
//!
//! Compares two canonical trees the way `diff -r` does: entries present on
//! one side only, file/directory mismatches, and differing file contents.

use nodestate_core::NsResult;
use similar::TextDiff;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const CONTEXT_LINES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Dir,
    File,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Dir => write!(f, "directory"),
            EntryKind::File => write!(f, "regular file"),
        }
    }
}

/// One difference between the trees, paths relative to the roots
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Difference {
    OnlyInLeft(PathBuf),
    OnlyInRight(PathBuf),
    /// A directory on one side and a file on the other
    KindMismatch { path: PathBuf, left_is_dir: bool },
    /// Unified diff of two text files
    Text { path: PathBuf, patch: String },
    Binary(PathBuf),
}

impl Difference {
    pub fn path(&self) -> &Path {
        match self {
            Difference::OnlyInLeft(p) | Difference::OnlyInRight(p) | Difference::Binary(p) => p,
            Difference::KindMismatch { path, .. } | Difference::Text { path, .. } => path,
        }
    }
}

/// Outcome of a recursive comparison
#[derive(Debug, Clone)]
pub struct TreeDiff {
    left: PathBuf,
    right: PathBuf,
    differences: Vec<Difference>,
}

impl TreeDiff {
    pub fn compute(left: &Path, right: &Path) -> NsResult<Self> {
        let mut diff = Self {
            left: left.to_path_buf(),
            right: right.to_path_buf(),
            differences: Vec::new(),
        };
        diff.compare_dir(Path::new(""))?;
        Ok(diff)
    }

    pub fn differences(&self) -> &[Difference] {
        &self.differences
    }

    pub fn is_identical(&self) -> bool {
        self.differences.is_empty()
    }

    /// `diff(1)` exit status: 0 identical, 1 different
    pub fn exit_status(&self) -> i32 {
        if self.is_identical() {
            0
        } else {
            1
        }
    }

    fn compare_dir(&mut self, rel: &Path) -> NsResult<()> {
        let left = listing(&self.left.join(rel))?;
        let right = listing(&self.right.join(rel))?;
        let names: BTreeSet<&String> = left.keys().chain(right.keys()).collect();

        for name in names {
            let path = rel.join(name);
            match (left.get(name), right.get(name)) {
                (Some(_), None) => self.differences.push(Difference::OnlyInLeft(path)),
                (None, Some(_)) => self.differences.push(Difference::OnlyInRight(path)),
                (Some(EntryKind::Dir), Some(EntryKind::Dir)) => self.compare_dir(&path)?,
                (Some(EntryKind::File), Some(EntryKind::File)) => self.compare_file(path)?,
                (Some(l), Some(_)) => self.differences.push(Difference::KindMismatch {
                    path,
                    left_is_dir: *l == EntryKind::Dir,
                }),
                (None, None) => {}
            }
        }
        Ok(())
    }

    fn compare_file(&mut self, rel: PathBuf) -> NsResult<()> {
        let left = fs::read(self.left.join(&rel))?;
        let right = fs::read(self.right.join(&rel))?;
        if left == right {
            return Ok(());
        }

        let difference = match (std::str::from_utf8(&left), std::str::from_utf8(&right)) {
            (Ok(l), Ok(r)) => {
                let patch = TextDiff::from_lines(l, r)
                    .unified_diff()
                    .context_radius(CONTEXT_LINES)
                    .header(
                        &self.left.join(&rel).display().to_string(),
                        &self.right.join(&rel).display().to_string(),
                    )
                    .to_string();
                Difference::Text { path: rel, patch }
            }
            _ => Difference::Binary(rel),
        };
        self.differences.push(difference);
        Ok(())
    }
}

/// Entries directly inside `dir`
fn listing(dir: &Path) -> NsResult<BTreeMap<String, EntryKind>> {
    let mut entries = BTreeMap::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        let kind = if entry.file_type().is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        };
        entries.insert(entry.file_name().to_string_lossy().into_owned(), kind);
    }
    Ok(entries)
}

fn split(root: &Path, rel: &Path) -> (PathBuf, String) {
    let full = root.join(rel);
    let parent = full.parent().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
    let name = rel
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (parent, name)
}

impl fmt::Display for TreeDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for difference in &self.differences {
            match difference {
                Difference::OnlyInLeft(rel) => {
                    let (dir, name) = split(&self.left, rel);
                    writeln!(f, "Only in {}: {}", dir.display(), name)?;
                }
                Difference::OnlyInRight(rel) => {
                    let (dir, name) = split(&self.right, rel);
                    writeln!(f, "Only in {}: {}", dir.display(), name)?;
                }
                Difference::KindMismatch { path, left_is_dir } => {
                    let (l, r) = if *left_is_dir {
                        (EntryKind::Dir, EntryKind::File)
                    } else {
                        (EntryKind::File, EntryKind::Dir)
                    };
                    writeln!(
                        f,
                        "File {} is a {} while file {} is a {}",
                        self.left.join(path).display(),
                        l,
                        self.right.join(path).display(),
                        r
                    )?;
                }
                Difference::Text { path, patch } => {
                    writeln!(f, "diff -r {} {}", self.left.join(path).display(), self.right.join(path).display())?;
                    write!(f, "{}", patch)?;
                }
                Difference::Binary(path) => {
                    writeln!(
                        f,
                        "Binary files {} and {} differ",
                        self.left.join(path).display(),
                        self.right.join(path).display()
                    )?;
                }
            }
        }
        Ok(())
    }
}

//! Configured file and directory names excluded from traversal

use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct SkipFilter {
    files: HashSet<String>,
    dirs: HashSet<String>,
}

impl SkipFilter {
    pub fn new<F, D>(files: F, dirs: D) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn skips_file(&self, name: &str) -> bool {
        self.files.contains(name)
    }

    pub fn skips_dir(&self, name: &str) -> bool {
        self.dirs.contains(name)
    }
}

//! Node name normalization for output paths
//!
//! Two nodes write their state under directories named after themselves.
//! Replacing the node's own name with a fixed placeholder lines the two
//! canonical trees up for diffing.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone)]
pub struct NameNormalizer {
    node: String,
    placeholder: String,
}

impl NameNormalizer {
    pub fn new(node: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            placeholder: placeholder.into(),
        }
    }

    pub fn node(&self) -> &str {
        &self.node
    }

    /// The placeholder when `segment` is exactly the node name
    pub fn segment<'a>(&'a self, segment: &'a str) -> &'a str {
        if !self.node.is_empty() && segment == self.node {
            &self.placeholder
        } else {
            segment
        }
    }

    /// Like [`segment`](Self::segment), also rewriting a `<node>_` prefix.
    /// Used for metadata files named after the node.
    pub fn file_name<'a>(&self, name: &'a str) -> Cow<'a, str> {
        if !self.node.is_empty() && name == self.node {
            return Cow::Owned(self.placeholder.clone());
        }
        match name
            .strip_prefix(self.node.as_str())
            .filter(|rest| !self.node.is_empty() && rest.starts_with('_'))
        {
            Some(rest) => Cow::Owned(format!("{}{}", self.placeholder, rest)),
            None => Cow::Borrowed(name),
        }
    }

    /// Normalize every segment of a relative path
    pub fn path(&self, rel: &Path) -> PathBuf {
        rel.components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy()),
                _ => None,
            })
            .map(|s| self.segment(&s).to_string())
            .collect()
    }
}

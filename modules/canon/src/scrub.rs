//! Scrub rules: field projections that drop legitimately node-specific data
//!
//! A rule keeps exactly one top-level field of a JSON object and discards the
//! rest. The retained field is passed through as its raw JSON text, so its
//! bytes are never altered.

use serde_json::value::RawValue;
use std::collections::HashMap;

/// Retain a single top-level field of a JSON object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrubRule {
    pub field: &'static str,
}

/// State signatures: participants and signature differ between honest nodes
pub const SIGNATURE_RULE: ScrubRule = ScrubRule::retain("value");

/// Runtime metadata: everything except the view is timing or identity
pub const METADATA_RULE: ScrubRule = ScrubRule::retain("view");

impl ScrubRule {
    pub const fn retain(field: &'static str) -> Self {
        Self { field }
    }

    /// The raw JSON of the retained field, or `None` when `record` is not a
    /// JSON object or lacks the field
    pub fn project<'a>(&self, record: &'a [u8]) -> Option<&'a RawValue> {
        let mut fields: HashMap<String, &'a RawValue> = serde_json::from_slice(record).ok()?;
        fields.remove(self.field)
    }
}

/// Canonical text of a signed state record: its raw `value`. The text is
/// a single line only when the stored JSON is compact.
pub fn scrub_signature(record: &[u8]) -> Option<&str> {
    SIGNATURE_RULE.project(record).map(RawValue::get)
}

/// Canonical text of a metadata document: `{"view":<raw>}`, or `{}` without
/// a view. `None` when the document is not a JSON object.
pub fn scrub_metadata(document: &[u8]) -> Option<String> {
    let fields: HashMap<String, &RawValue> = serde_json::from_slice(document).ok()?;
    Some(match fields.get(METADATA_RULE.field) {
        Some(view) => format!("{{\"{}\":{}}}", METADATA_RULE.field, view.get()),
        None => "{}".to_string(),
    })
}

//! Best-effort rendering of raw bytes into single-line text

use std::fmt;

/// A byte string made printable.
///
/// `Raw` is the decode fallback: the bytes were not printable text and are
/// shown as `0x`-prefixed hex instead. It is never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<'a> {
    Text(&'a str),
    Raw(String),
}

impl<'a> Rendered<'a> {
    pub fn is_raw(&self) -> bool {
        matches!(self, Rendered::Raw(_))
    }
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rendered::Text(s) => f.write_str(s),
            Rendered::Raw(s) => f.write_str(s),
        }
    }
}

/// Render bytes as text when they are UTF-8 without control characters,
/// otherwise as hex. The result never contains a line break.
pub fn render(bytes: &[u8]) -> Rendered<'_> {
    match std::str::from_utf8(bytes) {
        Ok(s) if !s.chars().any(char::is_control) => Rendered::Text(s),
        _ => Rendered::Raw(hex_bytes(bytes)),
    }
}

pub fn hex_bytes(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// One canonical `key = value` record line
pub fn record_line(key: &[u8], value: &[u8]) -> String {
    format!("{} = {}\n", render(key), render(value))
}

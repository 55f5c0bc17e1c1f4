//! Core types for nodestate
//!
//! Storage engine identifiers, key orderings and log level parsing shared by
//! the comparator and the replay tool.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::NsError;

/// Name under which integer-ordered stores record their comparator
pub const INTEGER_COMPARATOR: &str = "IntegerComparator";

/// Key-value storage engine family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Engine {
    LevelDb,
    RocksDb,
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::LevelDb => write!(f, "leveldb"),
            Engine::RocksDb => write!(f, "rocksdb"),
        }
    }
}

/// Key ordering a store was written with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyOrdering {
    /// Byte-lexicographic, the engines' default
    Bytewise,
    /// Keys are decimal integers compared numerically
    Integer,
}

impl KeyOrdering {
    /// Compare two keys under this ordering
    pub fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        match self {
            KeyOrdering::Bytewise => a.cmp(b),
            KeyOrdering::Integer => compare_integer_keys(a, b),
        }
    }
}

impl fmt::Display for KeyOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyOrdering::Bytewise => write!(f, "bytewise"),
            KeyOrdering::Integer => write!(f, "integer"),
        }
    }
}

/// Numeric comparison of decimal keys; non-numeric keys fall back to byte order
pub fn compare_integer_keys(a: &[u8], b: &[u8]) -> Ordering {
    match (parse_integer_key(a), parse_integer_key(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

fn parse_integer_key(key: &[u8]) -> Option<i128> {
    std::str::from_utf8(key).ok()?.trim().parse().ok()
}

/// One (engine, ordering) pair the store opener may try
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpenStrategy {
    pub engine: Engine,
    pub ordering: KeyOrdering,
}

impl OpenStrategy {
    pub const fn new(engine: Engine, ordering: KeyOrdering) -> Self {
        Self { engine, ordering }
    }
}

impl fmt::Display for OpenStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} keys)", self.engine, self.ordering)
    }
}

/// Operator-facing log level, accepting the usual aliases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLevel(pub tracing::Level);

impl FromStr for LogLevel {
    type Err = NsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s.to_ascii_lowercase().as_str() {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "info" => tracing::Level::INFO,
            "warn" | "warning" => tracing::Level::WARN,
            "error" | "critical" => tracing::Level::ERROR,
            other => {
                return Err(NsError::validation(format!("unknown log level '{}'", other)))
            }
        };
        Ok(LogLevel(level))
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel(tracing::Level::INFO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_keys_order_numerically() {
        assert_eq!(compare_integer_keys(b"2", b"10"), Ordering::Less);
        assert_eq!(compare_integer_keys(b"10", b"10"), Ordering::Equal);
        assert_eq!(KeyOrdering::Bytewise.compare(b"2", b"10"), Ordering::Greater);
    }

    #[test]
    fn test_integer_keys_fall_back_to_bytes() {
        assert_eq!(compare_integer_keys(b"abc", b"10"), b"abc".as_slice().cmp(b"10"));
    }

    #[test]
    fn test_log_level_aliases() {
        assert_eq!("WARNING".parse::<LogLevel>().unwrap().0, tracing::Level::WARN);
        assert_eq!("critical".parse::<LogLevel>().unwrap().0, tracing::Level::ERROR);
        assert!("loud".parse::<LogLevel>().is_err());
    }
}

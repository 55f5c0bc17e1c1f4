//! Error types for nodestate

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for nodestate
#[derive(Error, Debug)]
pub enum NsError {
    // ============ Input Errors ============
    /// Bad or missing input paths. Collected across both snapshots and
    /// reported together.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Archive error for {}: {reason}", path.display())]
    Archive { path: PathBuf, reason: String },

    // ============ Storage Errors ============
    #[error("Unable to open store '{store}' at {} with any engine", path.display())]
    StorageOpen { store: String, path: PathBuf },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(String),

    // ============ Data Errors ============
    #[error("Serialization failed: {0}")]
    Serialization(String),

    // ============ Configuration Errors ============
    #[error("Configuration error: {0}")]
    Config(String),

    // ============ Collaborator Errors ============
    #[error("Node runtime error: {0}")]
    Runtime(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NsError {
    /// Shorthand for a single validation message
    pub fn validation(message: impl Into<String>) -> Self {
        NsError::Validation(vec![message.into()])
    }

    pub fn archive(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        NsError::Archive {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for NsError {
    fn from(err: std::io::Error) -> Self {
        NsError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for NsError {
    fn from(err: serde_json::Error) -> Self {
        NsError::Serialization(err.to_string())
    }
}

impl From<walkdir::Error> for NsError {
    fn from(err: walkdir::Error) -> Self {
        NsError::Io(err.to_string())
    }
}

//! Configuration types for nodestate

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::NsError;
use crate::traits::NsResult;

/// Comparator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Remove temporary directories on exit
    pub cleanup: bool,

    /// Logging level
    pub log_level: String,

    /// Path from a snapshot root to the node data directory
    pub data_dir: PathBuf,

    /// File names never traversed
    pub skip_files: Vec<String>,

    /// Directory names never traversed
    pub skip_dirs: Vec<String>,

    /// Canonicalization rules
    pub canon: CanonConfig,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            cleanup: true,
            log_level: "info".to_string(),
            data_dir: PathBuf::from("./data/"),
            skip_files: vec![],
            skip_dirs: vec![],
            canon: CanonConfig::default(),
        }
    }
}

impl CompareConfig {
    /// Load a JSON configuration file
    pub fn from_file(path: &Path) -> NsResult<Self> {
        load_json(path)
    }
}

/// Canonicalization rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonConfig {
    /// Name substituted for the node's own name in output paths
    pub placeholder: String,

    /// Replay-recorder directory skipped under the node's top-level directory
    pub recorder_dir: String,

    pub suffixes: CategorySuffixes,

    pub log: LogMarkers,
}

impl Default for CanonConfig {
    fn default() -> Self {
        Self {
            placeholder: "node".to_string(),
            recorder_dir: "recorder".to_string(),
            suffixes: CategorySuffixes::default(),
            log: LogMarkers::default(),
        }
    }
}

/// Name suffixes selecting a canonicalization category
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorySuffixes {
    pub ledger: String,
    pub merkle_leaves: String,
    pub merkle_nodes: String,
    pub trie_state: String,
    pub state_signature: String,
    pub metadata: String,
}

impl Default for CategorySuffixes {
    fn default() -> Self {
        Self {
            ledger: "_transactions".to_string(),
            merkle_leaves: "_merkleLeaves".to_string(),
            merkle_nodes: "_merkleNodes".to_string(),
            trie_state: "_state".to_string(),
            state_signature: "state_signature".to_string(),
            metadata: "_info.json".to_string(),
        }
    }
}

/// Progress markers searched for in the node log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogMarkers {
    pub ordered: String,
    pub executed: String,
}

impl Default for LogMarkers {
    fn default() -> Self {
        Self {
            ordered: "ordered batch request".to_string(),
            executed: "executed batch request".to_string(),
        }
    }
}

/// Replay tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub cleanup: bool,

    pub log_level: String,

    /// Where the runtime writes the replayed state; temporary when unset
    pub output_dir: Option<PathBuf>,

    /// External node runtime command
    pub runtime: String,
}

impl ReplayConfig {
    pub fn from_file(path: &Path) -> NsResult<Self> {
        load_json(path)
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            cleanup: true,
            log_level: "info".to_string(),
            output_dir: None,
            runtime: "node-replay".to_string(),
        }
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> NsResult<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| NsError::Config(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&content).map_err(|e| NsError::Config(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CompareConfig::default();
        assert!(config.cleanup);
        assert_eq!(config.data_dir, PathBuf::from("./data/"));
        assert_eq!(config.canon.suffixes.ledger, "_transactions");
        assert_eq!(config.canon.placeholder, "node");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nodestate.json");
        std::fs::write(&path, r#"{"skip_dirs": ["keys"], "canon": {"placeholder": "X"}}"#).unwrap();
        let config = CompareConfig::from_file(&path).unwrap();

        assert_eq!(config.skip_dirs, vec!["keys".to_string()]);
        assert_eq!(config.canon.placeholder, "X");
        assert_eq!(config.canon.recorder_dir, "recorder");
        assert!(config.cleanup);
    }

    #[test]
    fn test_bad_file_is_config_error() {
        let err = CompareConfig::from_file(Path::new("/nonexistent/nodestate.json")).unwrap_err();
        assert!(matches!(err, NsError::Config(_)));
    }
}

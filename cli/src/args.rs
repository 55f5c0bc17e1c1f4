//! Command line surface of `nsdiff`

use clap::{Parser, ValueEnum};
use nodestate_core::{CompareConfig, NsResult};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum YesNo {
    Yes,
    No,
}

impl From<YesNo> for bool {
    fn from(v: YesNo) -> bool {
        v == YesNo::Yes
    }
}

#[derive(Debug, Parser)]
#[command(name = "nsdiff")]
#[command(about = "Compare the persisted state of two nodes")]
#[command(version)]
pub struct CompareArgs {
    /// First snapshot: zip or tar archive, or a directory
    pub state1: PathBuf,

    /// Second snapshot
    pub state2: PathBuf,

    /// Remove temporary directories on exit
    #[arg(long, value_enum)]
    pub cleanup: Option<YesNo>,

    /// Log level (trace, debug, info, warning, error, critical)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path from a snapshot root to the node data directory
    #[arg(long)]
    pub datadir: Option<PathBuf>,

    /// File name to skip, may be repeated
    #[arg(long = "skip-file", value_name = "NAME")]
    pub skip_files: Vec<String>,

    /// Directory name to skip, may be repeated
    #[arg(long = "skip-dir", value_name = "NAME")]
    pub skip_dirs: Vec<String>,

    /// JSON configuration file; flags given here take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl CompareArgs {
    /// Configuration file (or defaults) overridden by the flags
    pub fn to_config(&self) -> NsResult<CompareConfig> {
        let mut config = match &self.config {
            Some(path) => CompareConfig::from_file(path)?,
            None => CompareConfig::default(),
        };

        if let Some(cleanup) = self.cleanup {
            config.cleanup = cleanup.into();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(dir) = &self.datadir {
            config.data_dir = dir.clone();
        }
        config.skip_files.extend(self.skip_files.iter().cloned());
        config.skip_dirs.extend(self.skip_dirs.iter().cloned());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let args = CompareArgs::try_parse_from(["nsdiff", "a.zip", "b"]).unwrap();
        let config = args.to_config().unwrap();
        assert!(config.cleanup);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.data_dir, PathBuf::from("./data/"));
    }

    #[test]
    fn test_flags() {
        let args = CompareArgs::try_parse_from([
            "nsdiff", "a", "b", "--cleanup", "no", "--log-level", "debug", "--datadir", "node/data",
            "--skip-file", "LOCK", "--skip-dir", "keys", "--skip-dir", "plugins",
        ])
        .unwrap();
        let config = args.to_config().unwrap();
        assert!(!config.cleanup);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.data_dir, PathBuf::from("node/data"));
        assert_eq!(config.skip_files, vec!["LOCK"]);
        assert_eq!(config.skip_dirs, vec!["keys", "plugins"]);
    }

    #[test]
    fn test_cleanup_rejects_other_values() {
        assert!(CompareArgs::try_parse_from(["nsdiff", "a", "b", "--cleanup", "maybe"]).is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nsdiff.json");
        fs::write(&path, r#"{"cleanup": false, "log_level": "warn", "skip_dirs": ["keys"]}"#).unwrap();

        let path_arg = path.to_string_lossy().into_owned();
        let args = CompareArgs::try_parse_from([
            "nsdiff", "a", "b", "--config", path_arg.as_str(), "--log-level", "error", "--skip-dir", "x",
        ])
        .unwrap();
        let config = args.to_config().unwrap();
        assert!(!config.cleanup);
        assert_eq!(config.log_level, "error");
        assert_eq!(config.skip_dirs, vec!["keys", "x"]);
    }
}

//! Node log progress markers
//!
//! Picks the most recent "batch ordered" and "batch executed" positions out
//! of a node's free-text log. Lines are sorted before the last one is taken,
//! since concurrent loggers do not write them in strict order.

use nodestate_core::{LogMarkers, NsError, NsResult};
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const POSITION_PATTERN: &str = r"(?i)view no (\d+), pp_?seq_?no (\d+)";

/// Name of the summary file in the canonical root
pub const LOG_SUMMARY_FILE: &str = "log";

/// `(view, sequence)` of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPosition {
    pub view: u64,
    pub seq: u64,
}

impl fmt::Display for BatchPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.view, self.seq)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogTail {
    pub ordered: Option<BatchPosition>,
    pub executed: Option<BatchPosition>,
}

impl fmt::Display for LogTail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn show(p: &Option<BatchPosition>) -> String {
            p.map(|p| p.to_string()).unwrap_or_else(|| "none".to_string())
        }
        writeln!(f, "last batch ordered: {}", show(&self.ordered))?;
        writeln!(f, "last batch executed: {}", show(&self.executed))
    }
}

pub struct LogTailExtractor {
    markers: LogMarkers,
    position: Regex,
}

impl LogTailExtractor {
    pub fn new(markers: LogMarkers) -> NsResult<Self> {
        let position = Regex::new(POSITION_PATTERN)
            .map_err(|e| NsError::Config(format!("log position pattern: {}", e)))?;
        Ok(Self { markers, position })
    }

    /// `<data parent>/log/<node>.log`, then `<data parent>/<node>.log`
    pub fn locate(data_dir: &Path, node: &str) -> Option<PathBuf> {
        let parent = data_dir.parent()?;
        let file = format!("{}.log", node);
        [parent.join("log").join(&file), parent.join(&file)]
            .into_iter()
            .find(|p| p.is_file())
    }

    /// Last position for each marker among the lines naming `node` as a
    /// whole word
    pub fn tail(&self, text: &str, node: &str) -> NsResult<LogTail> {
        let node = Regex::new(&format!(r"(?:^|\W){}(?:\W|$)", regex::escape(node)))
            .map_err(|e| NsError::Config(format!("node name pattern: {}", e)))?;
        Ok(LogTail {
            ordered: self.last_position(text, &node, &self.markers.ordered),
            executed: self.last_position(text, &node, &self.markers.executed),
        })
    }

    fn last_position(&self, text: &str, node: &Regex, marker: &str) -> Option<BatchPosition> {
        let last = text
            .lines()
            .filter(|line| line.contains(marker) && node.is_match(line))
            .max()?;
        let caps = self.position.captures(last)?;
        Some(BatchPosition {
            view: caps[1].parse().ok()?,
            seq: caps[2].parse().ok()?,
        })
    }

    /// Summarize the node's log into `<canon_root>/log`. Nothing is written
    /// when the node has no log.
    pub fn extract(&self, data_dir: &Path, node: &str, canon_root: &Path) -> NsResult<Option<LogTail>> {
        let Some(log) = Self::locate(data_dir, node) else {
            debug!(node = %node, "No node log found");
            return Ok(None);
        };

        let bytes = fs::read(&log)?;
        let tail = self.tail(&String::from_utf8_lossy(&bytes), node)?;
        fs::write(canon_root.join(LOG_SUMMARY_FILE), tail.to_string())?;
        info!(node = %node, log = %log.display(), ordered = ?tail.ordered, executed = ?tail.executed, "Log tail extracted");
        Ok(Some(tail))
    }
}

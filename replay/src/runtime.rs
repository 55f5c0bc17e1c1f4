//! Node runtime boundary
//!
//! Reconstructing a node and re-executing its recorded traffic belongs to
//! the node software itself. This crate only hands it a resolved recording
//! and an output directory.

use async_trait::async_trait;
use nodestate_core::{NsError, NsResult};
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

/// Something able to replay a recording into an output directory
#[async_trait]
pub trait NodeRuntime: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Replay `recording`, writing the reconstructed state under `output`
    async fn replay(&self, recording: &Path, output: &Path) -> NsResult<()>;
}

/// Runs `<command> <recording> <output>` as a child process
#[derive(Debug, Clone)]
pub struct ProcessRuntime {
    command: String,
}

impl ProcessRuntime {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl NodeRuntime for ProcessRuntime {
    fn name(&self) -> &str {
        &self.command
    }

    async fn replay(&self, recording: &Path, output: &Path) -> NsResult<()> {
        debug!(command = %self.command, recording = %recording.display(), output = %output.display(), "Spawning node runtime");

        let status = Command::new(&self.command)
            .arg(recording)
            .arg(output)
            .status()
            .await
            .map_err(|e| NsError::Runtime(format!("cannot run {}: {}", self.command, e)))?;

        if !status.success() {
            return Err(NsError::Runtime(format!("{} exited with {}", self.command, status)));
        }
        info!(command = %self.command, "Node runtime finished");
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_successful_command() {
        let runtime = ProcessRuntime::new("true");
        runtime.replay(Path::new("/rec"), Path::new("/out")).await.unwrap();
    }

    #[tokio::test]
    async fn test_failing_command_is_runtime_error() {
        let runtime = ProcessRuntime::new("false");
        let err = runtime.replay(Path::new("/rec"), Path::new("/out")).await.unwrap_err();
        assert!(matches!(err, NsError::Runtime(_)));
    }

    #[tokio::test]
    async fn test_missing_command_is_runtime_error() {
        let runtime = ProcessRuntime::new("nodestate-no-such-runtime");
        let err = runtime.replay(Path::new("/rec"), Path::new("/out")).await.unwrap_err();
        assert!(err.to_string().contains("cannot run nodestate-no-such-runtime"));
    }
}

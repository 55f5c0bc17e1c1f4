//! Replay orchestration

use nodestate_core::{NsError, NsResult, ReplayConfig};
use nodestate_state::{validate_input, ArchiveResolver, RetainedDir, TempKind, TempResources};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use crate::runtime::NodeRuntime;

#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    pub node: String,
    pub recording_dir: PathBuf,
    pub output_dir: PathBuf,
}

#[derive(Debug)]
pub struct ReplayRun {
    pub outcome: NsResult<ReplayOutcome>,
    pub retained: Vec<RetainedDir>,
}

pub struct Replayer {
    config: ReplayConfig,
    runtime: Arc<dyn NodeRuntime>,
}

impl Replayer {
    pub fn new(config: ReplayConfig, runtime: Arc<dyn NodeRuntime>) -> Self {
        Self { config, runtime }
    }

    /// Resolve `recording` and hand it to the runtime. Temporary directories
    /// are released once whatever the outcome.
    pub async fn run(&self, recording: &Path) -> NsResult<ReplayRun> {
        let mut temps = TempResources::new();
        let outcome = self.replay(recording, &mut temps).await;
        if let Err(e) = &outcome {
            error!("Replay failed: {}", e);
        }

        let retained = temps.release(self.config.cleanup)?;
        Ok(ReplayRun { outcome, retained })
    }

    async fn replay(&self, recording: &Path, temps: &mut TempResources) -> NsResult<ReplayOutcome> {
        if let Some(problem) = validate_input("recording", recording) {
            return Err(NsError::validation(problem));
        }
        let snapshot = ArchiveResolver::resolve(recording, temps)?;

        let output_dir = match &self.config.output_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                dir.clone()
            }
            None => temps.create(TempKind::ReplayOutput, "nodestate-replay-")?,
        };

        info!(
            node = %snapshot.node_name,
            runtime = %self.runtime.name(),
            output = %output_dir.display(),
            "Replaying recording"
        );
        self.runtime.replay(&snapshot.root, &output_dir).await?;

        Ok(ReplayOutcome {
            node: snapshot.node_name,
            recording_dir: snapshot.root,
            output_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeRuntime {
        calls: Mutex<Vec<(PathBuf, PathBuf)>>,
        fail: bool,
    }

    #[async_trait]
    impl NodeRuntime for FakeRuntime {
        fn name(&self) -> &str {
            "fake"
        }

        async fn replay(&self, recording: &Path, output: &Path) -> NsResult<()> {
            self.calls.lock().push((recording.to_path_buf(), output.to_path_buf()));
            fs::write(output.join("replayed"), b"state")?;
            if self.fail {
                return Err(NsError::Runtime("replay diverged".to_string()));
            }
            Ok(())
        }
    }

    fn recording(tmp: &TempDir) -> PathBuf {
        let dir = tmp.path().join("Alpha");
        fs::create_dir_all(dir.join("data/Alpha/recorder")).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_directory_recording_with_temp_output() {
        let tmp = TempDir::new().unwrap();
        let rec = recording(&tmp);
        let runtime = Arc::new(FakeRuntime::default());
        let replayer = Replayer::new(ReplayConfig::default(), runtime.clone());

        let run = replayer.run(&rec).await.unwrap();
        let outcome = run.outcome.unwrap();
        assert_eq!(outcome.node, "Alpha");
        assert_eq!(outcome.recording_dir, rec);
        assert!(run.retained.is_empty());
        assert!(!outcome.output_dir.exists());
        assert_eq!(runtime.calls.lock().len(), 1);
        assert!(rec.is_dir());
    }

    #[tokio::test]
    async fn test_no_cleanup_keeps_output() {
        let tmp = TempDir::new().unwrap();
        let rec = recording(&tmp);
        let config = ReplayConfig {
            cleanup: false,
            ..ReplayConfig::default()
        };
        let replayer = Replayer::new(config, Arc::new(FakeRuntime::default()));

        let run = replayer.run(&rec).await.unwrap();
        assert_eq!(run.retained.len(), 1);
        assert_eq!(run.retained[0].kind, TempKind::ReplayOutput);
        assert!(run.retained[0].path.join("replayed").is_file());
        fs::remove_dir_all(&run.retained[0].path).unwrap();
    }

    #[tokio::test]
    async fn test_explicit_output_dir_is_not_temporary() {
        let tmp = TempDir::new().unwrap();
        let rec = recording(&tmp);
        let out = tmp.path().join("out");
        let config = ReplayConfig {
            output_dir: Some(out.clone()),
            ..ReplayConfig::default()
        };
        let replayer = Replayer::new(config, Arc::new(FakeRuntime::default()));

        let run = replayer.run(&rec).await.unwrap();
        assert_eq!(run.outcome.unwrap().output_dir, out);
        assert!(out.join("replayed").is_file());
    }

    #[tokio::test]
    async fn test_runtime_failure_still_cleans_up() {
        let tmp = TempDir::new().unwrap();
        let rec = recording(&tmp);
        let runtime = Arc::new(FakeRuntime {
            fail: true,
            ..FakeRuntime::default()
        });
        let replayer = Replayer::new(ReplayConfig::default(), runtime.clone());

        let run = replayer.run(&rec).await.unwrap();
        assert!(matches!(run.outcome, Err(NsError::Runtime(_))));
        let (_, output) = runtime.calls.lock()[0].clone();
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_missing_recording_never_reaches_runtime() {
        let tmp = TempDir::new().unwrap();
        let runtime = Arc::new(FakeRuntime::default());
        let replayer = Replayer::new(ReplayConfig::default(), runtime.clone());

        let run = replayer.run(&tmp.path().join("missing.zip")).await.unwrap();
        assert!(matches!(run.outcome, Err(NsError::Validation(_))));
        assert!(runtime.calls.lock().is_empty());
    }
}

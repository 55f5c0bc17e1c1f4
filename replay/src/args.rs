//! Command line surface of `nsreplay`

use clap::{Parser, ValueEnum};
use nodestate_core::{NsResult, ReplayConfig};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum YesNo {
    Yes,
    No,
}

#[derive(Debug, Parser)]
#[command(name = "nsreplay")]
#[command(about = "Replay a recorded node through the node runtime")]
#[command(version)]
pub struct ReplayArgs {
    /// Recording: zip or tar archive, or a directory
    pub recording: PathBuf,

    /// Remove temporary directories on exit
    #[arg(long, value_enum)]
    pub cleanup: Option<YesNo>,

    /// Log level (trace, debug, info, warning, error, critical)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Where replayed state is written; temporary when omitted
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Node runtime command, invoked as `<cmd> <recording> <output>`
    #[arg(long)]
    pub runtime: Option<String>,

    /// JSON configuration file; flags given here take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl ReplayArgs {
    pub fn to_config(&self) -> NsResult<ReplayConfig> {
        let mut config = match &self.config {
            Some(path) => ReplayConfig::from_file(path)?,
            None => ReplayConfig::default(),
        };

        if let Some(cleanup) = self.cleanup {
            config.cleanup = cleanup == YesNo::Yes;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if let Some(runtime) = &self.runtime {
            config.runtime = runtime.clone();
        }
        Ok(config)
    }
}

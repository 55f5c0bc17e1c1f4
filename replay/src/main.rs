//! nsreplay - replay a recorded node

use clap::Parser;
use colored::Colorize;
use nodestate_core::LogLevel;
use nodestate_replay::{ProcessRuntime, ReplayArgs, Replayer};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> ExitCode {
    let args = ReplayArgs::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: ReplayArgs) -> anyhow::Result<()> {
    let config = args.to_config()?;
    let level: LogLevel = config.log_level.parse()?;

    FmtSubscriber::builder()
        .with_max_level(level.0)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let runtime = Arc::new(ProcessRuntime::new(config.runtime.clone()));
    let run = Replayer::new(config, runtime).run(&args.recording).await?;

    for dir in &run.retained {
        println!("Temporary directory kept: {}", dir.path.display());
    }

    let outcome = run.outcome?;
    println!("{} {}", "Replay complete:".green(), outcome.output_dir.display());
    Ok(())
}

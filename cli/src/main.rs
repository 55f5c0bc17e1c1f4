//! nsdiff - compare the state of two nodes

use clap::Parser;
use colored::Colorize;
use nodestate_cli::{CompareArgs, Comparator};
use nodestate_core::LogLevel;
use nodestate_state::StoreOpener;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CompareArgs::parse();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CompareArgs) -> anyhow::Result<ExitCode> {
    let config = args.to_config()?;
    let level: LogLevel = config.log_level.parse()?;

    FmtSubscriber::builder()
        .with_max_level(level.0)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let comparator = Comparator::new(config, Arc::new(StoreOpener::with_default_engines()));
    let run = comparator.run(&args.state1, &args.state2).await?;

    for dir in &run.retained {
        println!("Temporary directory kept: {}", dir.path.display());
    }

    let outcome = run.outcome?;
    if outcome.is_identical() {
        println!("{}", "Identical state!".green());
        Ok(ExitCode::SUCCESS)
    } else {
        print!("{}", outcome.diff);
        eprintln!(
            "{}",
            format!("State differs! (diff exit status {})", outcome.diff.exit_status()).red()
        );
        Ok(ExitCode::FAILURE)
    }
}

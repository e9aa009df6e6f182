use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use sanity_cli::cli::CliArgs;
use sanity_cli::Runner;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Logs go to stderr; stdout carries the test transcript.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let Some(config) = args.load_config().context("failed to load configuration")? else {
        return Ok(ExitCode::from(1));
    };
    config.log_summary();

    let runner = Runner::new(config).context("failed to build HTTP client")?;
    let outcome = runner.run().await.context("sanity run aborted")?;

    Ok(ExitCode::from(outcome.exit_code()))
}

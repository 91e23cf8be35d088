//! `agent_graylog` — entry point.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use agent_graylog::cli::{env_password, Cli};
use agent_graylog::{Agent, GraylogClient};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match cli.into_config(env_password()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return Ok(ExitCode::from(2));
        }
    };
    tracing::debug!(
        "querying {} for {} section(s)",
        config.api_base,
        config.sections.len()
    );

    let client = GraylogClient::new(&config).context("failed to set up HTTP client")?;
    let agent = Agent::new(&client, &config);

    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    let result = agent.run(&mut stdout.lock(), &mut stderr.lock()).await;

    match result {
        Ok(report) => {
            tracing::info!(
                "finished: {} section(s) written, {} failed",
                report.completed.len(),
                report.failed.len()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::debug!("aborted: {e}");
            Ok(ExitCode::from(e.exit_code()))
        }
    }
}

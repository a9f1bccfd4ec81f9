mod cli;
mod commands;
mod error;
mod metadata;
mod output;

use clap::Parser;
use std::process::ExitCode;
use tracing::{info_span, Instrument};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::CliError;
use crate::metadata::{Metadata, RequestId};

const DEFAULT_LOG_FILTER: &str = "tcgscout=info";

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenv::dotenv();
    init_tracing();

    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

async fn run() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();
    let command = commands::command_name(&cli.command);
    let request_id = RequestId::new_v4();

    let result = commands::run(&cli)
        .instrument(info_span!("command", %request_id, command))
        .await?;

    let meta = Metadata::new(request_id, command, result.latency_ms);
    output::render(&result, &meta, cli.format)?;

    if result.failed {
        return Ok(ExitCode::from(3));
    }

    Ok(ExitCode::SUCCESS)
}

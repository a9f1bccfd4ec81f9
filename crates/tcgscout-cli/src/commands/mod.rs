mod lookup;
mod price;
mod search;
mod sources;

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tcgscout_core::{BotConfig, CommandService, Reply};
use tokio::time::Instant;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub text: String,
    /// The user-facing reply was a failure message.
    pub failed: bool,
    pub latency_ms: u64,
}

impl CommandResult {
    pub fn from_reply(reply: &Reply) -> Result<Self, CliError> {
        let text = match reply {
            Reply::Reports { reports } => reports
                .iter()
                .map(|report| report.to_markdown())
                .collect::<Vec<_>>()
                .join("\n---\n\n"),
            Reply::Notice { message } | Reply::Failure { message } => message.clone(),
        };

        Ok(Self {
            data: serde_json::to_value(reply)?,
            text,
            failed: reply.is_failure(),
            latency_ms: 0,
        })
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }
}

pub const fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Search(_) => "search",
        Command::Price(_) => "price",
        Command::Lookup(_) => "lookup",
        Command::Sources(_) => "sources",
    }
}

pub async fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    let config = load_config(cli)?;
    let service = Arc::new(CommandService::from_config(&config));
    let started = Instant::now();

    let result = match &cli.command {
        Command::Search(args) => search::run(args, service).await?,
        Command::Price(args) => price::run(args, &config, service).await?,
        Command::Lookup(args) => lookup::run(args, service).await?,
        Command::Sources(args) => sources::run(args, &service)?,
    };

    let latency_ms = started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64;
    Ok(result.with_latency(latency_ms))
}

fn load_config(cli: &Cli) -> Result<BotConfig, CliError> {
    let mut config = BotConfig::from_env()?;

    if let Some(timeout_ms) = cli.timeout_ms {
        if timeout_ms == 0 {
            return Err(CliError::Command(String::from(
                "--timeout-ms must be greater than zero",
            )));
        }
        config.source_timeout = Duration::from_millis(timeout_ms);
    }
    if cli.web_search {
        config.enable_web_search = true;
    }

    Ok(config)
}

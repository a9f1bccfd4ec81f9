use std::convert::Infallible;
use std::sync::Arc;

use tcgscout_core::{run_guarded, CardIdentity, CommandService, Game, Reply};
use tracing::info;

use crate::cli::LookupArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &LookupArgs, service: Arc<CommandService>) -> Result<CommandResult, CliError> {
    let card = build_identity(args)?;

    let reply = run_guarded("lookup", async move {
        let (outcome, report) = service.lookup(&card).await;
        info!(
            selected = ?outcome.selected,
            attempts = outcome.attempts.len(),
            latency_ms = outcome.latency_ms,
            "lookup routed"
        );
        Ok::<_, Infallible>(Reply::Reports {
            reports: vec![report],
        })
    })
    .await;

    CommandResult::from_reply(&reply)
}

fn build_identity(args: &LookupArgs) -> Result<CardIdentity, CliError> {
    let mut card = CardIdentity::manual(Game::from(args.game));
    if let Some(name) = &args.name {
        card = card.with_name(name.as_str());
    }
    if let Some(number) = &args.number {
        card = card.with_number(number.as_str());
    }
    if let Some(set_name) = &args.set {
        card = card.with_set(set_name.as_str());
    }
    if let Some(rarity) = &args.rarity {
        card = card.with_rarity(rarity.as_str());
    }

    Ok(card.ensure_lookup()?)
}

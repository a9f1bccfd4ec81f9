use std::convert::Infallible;
use std::sync::Arc;

use tcgscout_core::{run_guarded, BotConfig, CommandService, Game, Reply};

use crate::cli::PriceArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(
    args: &PriceArgs,
    config: &BotConfig,
    service: Arc<CommandService>,
) -> Result<CommandResult, CliError> {
    config.require_gemini_key()?;

    let image_url = args.image_url.trim().to_owned();
    if image_url.is_empty() {
        return Err(CliError::Command(String::from("image url must not be empty")));
    }
    let game_override = args.game.map(Game::from);

    let reply = run_guarded("price", async move {
        let outcome = service.identify(&image_url, game_override).await;
        Ok::<_, Infallible>(Reply::from(outcome))
    })
    .await;

    CommandResult::from_reply(&reply)
}

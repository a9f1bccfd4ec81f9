use std::convert::Infallible;
use std::sync::Arc;

use tcgscout_core::{run_guarded, CommandService, Game, Reply};

use crate::cli::SearchArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &SearchArgs, service: Arc<CommandService>) -> Result<CommandResult, CliError> {
    let query = args.query.clone();
    let game = Game::from(args.game);

    let reply = run_guarded("search", async move {
        let report = service.search_by_number(&query, game).await;
        Ok::<_, Infallible>(Reply::Reports {
            reports: vec![report],
        })
    })
    .await;

    CommandResult::from_reply(&reply)
}

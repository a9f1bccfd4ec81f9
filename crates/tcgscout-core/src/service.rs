//! Command entry points shared by every front end.
//!
//! | Entry point | Path |
//! |-------------|------|
//! | [`CommandService::search_by_number`] | validator, then one source |
//! | [`CommandService::identify`] | recognizer, then the game's route per card |
//! | [`CommandService::lookup`] | hand-built identity straight into the router |
//! | [`CommandService::handle_message`] | trigger rules, then `identify` |
//!
//! [`run_guarded`] is the outermost boundary: whatever a command does, the
//! caller gets a [`Reply`].

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::BotConfig;
use crate::domain::{CardIdentity, Game, PriceResult};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::market_info::MarketInfoLookup;
use crate::presentation::{price_report, search_report, Report, MAX_REPORTS};
use crate::routing::{PriceRouter, PriceRouterBuilder, RouteOutcome};
use crate::trigger::{classify, IncomingMessage, Trigger, UPLOAD_PROMPT};
use crate::validation::{pokemon_series_hint, validate, Validation};
use crate::vision::{CardRecognizer, GeminiRecognizer, Recognition};
use crate::ProviderId;

pub const QUOTA_EXCEEDED_MESSAGE: &str = "⚠️ **API quota exhausted!**\n\n\
    The Gemini free tier allows a limited number of requests per day. \
    Wait about 24 hours and try again, or configure a paid API key.";
pub const NO_CARDS_MESSAGE: &str = "😅 No cards recognized, try a clearer screenshot.";
pub const RECOGNIZER_UNAVAILABLE_MESSAGE: &str =
    "❌ Card recognition is unavailable right now, please try again later.";
pub const FAILURE_MESSAGE: &str = "❌ Something went wrong, please try again later.";

#[derive(Debug, Clone, PartialEq)]
pub enum IdentifyOutcome {
    /// The recognizer's quota is spent; no source was queried.
    QuotaExceeded,
    NoCards,
    RecognizerUnavailable { reason: String },
    Reports(Vec<Report>),
}

/// What a front end delivers to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    Reports { reports: Vec<Report> },
    Notice { message: String },
    Failure { message: String },
}

impl Reply {
    pub fn notice(message: impl Into<String>) -> Self {
        Self::Notice {
            message: message.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

impl From<IdentifyOutcome> for Reply {
    fn from(outcome: IdentifyOutcome) -> Self {
        match outcome {
            IdentifyOutcome::QuotaExceeded => Self::notice(QUOTA_EXCEEDED_MESSAGE),
            IdentifyOutcome::NoCards => Self::notice(NO_CARDS_MESSAGE),
            IdentifyOutcome::RecognizerUnavailable { .. } => Self::Failure {
                message: String::from(RECOGNIZER_UNAVAILABLE_MESSAGE),
            },
            IdentifyOutcome::Reports(reports) => Self::Reports { reports },
        }
    }
}

pub struct CommandService {
    router: Arc<PriceRouter>,
    recognizer: Option<Arc<dyn CardRecognizer>>,
    market_info: Option<MarketInfoLookup>,
}

impl CommandService {
    pub fn new(router: Arc<PriceRouter>) -> Self {
        Self {
            router,
            recognizer: None,
            market_info: None,
        }
    }

    /// Wires the production collaborators from `config` over one shared
    /// HTTP client.
    pub fn from_config(config: &BotConfig) -> Self {
        let http_client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());
        let router = PriceRouterBuilder::new(config.clone())
            .with_http_client(Arc::clone(&http_client))
            .build();

        let mut service = Self::new(Arc::new(router));
        if let Some(api_key) = config.gemini_api_key.as_deref() {
            service = service.with_recognizer(Arc::new(
                GeminiRecognizer::new(Arc::clone(&http_client), api_key)
                    .with_model(config.gemini_model.clone()),
            ));
        }
        if config.enable_web_search {
            service = service.with_market_info(MarketInfoLookup::new(http_client));
        }
        service
    }

    pub fn with_recognizer(mut self, recognizer: Arc<dyn CardRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn with_market_info(mut self, market_info: MarketInfoLookup) -> Self {
        self.market_info = Some(market_info);
        self
    }

    pub fn router(&self) -> &PriceRouter {
        &self.router
    }

    /// Exact card-number search: One Piece through OPTCG, Pokemon through
    /// pokemontcg.io. Invalid numbers never reach a source.
    pub async fn search_by_number(&self, query: &str, game: Game) -> Report {
        let result = match validate(query, game) {
            Validation::Invalid { hint } => PriceResult::format_rejection(hint),
            Validation::Valid { query: number } => self.search_valid_number(&number, game).await,
        };
        info!(query, %game, found = result.found, "number search finished");
        search_report(&result, query, game)
    }

    async fn search_valid_number(&self, number: &str, game: Game) -> PriceResult {
        match game {
            Game::Onepiece => {
                let card = CardIdentity::manual(game).with_number(number.to_ascii_uppercase());
                self.router.query_source(ProviderId::Optcg, &card).await.result
            }
            Game::Pokemon => {
                let card = CardIdentity::manual(game).with_number(number.to_ascii_lowercase());
                let result = self
                    .router
                    .query_source(ProviderId::PokemonTcg, &card)
                    .await
                    .result;
                match (result.found, result.error.is_some()) {
                    (true, _) => result,
                    (false, true) => PriceResult::format_rejection(format!(
                        "⚠️ **Pokemon API temporarily unavailable**\n\n\
                         The Pokemon TCG API is not responding, try again later or search manually.\n\n{}",
                        pokemon_series_hint()
                    )),
                    (false, false) => PriceResult::format_rejection(format!(
                        "😅 **Card not found**\n\nCheck that the card number is correct.\n\n{}",
                        pokemon_series_hint()
                    )),
                }
            }
            Game::Yugioh | Game::Other => PriceResult::not_found(),
        }
    }

    /// Recognizes the cards in `image_url` and prices each of them.
    ///
    /// A quota signal ends the request before any source is queried.
    /// `game_override` replaces the recognized game of every card.
    pub async fn identify(&self, image_url: &str, game_override: Option<Game>) -> IdentifyOutcome {
        let Some(recognizer) = self.recognizer.as_ref() else {
            return IdentifyOutcome::RecognizerUnavailable {
                reason: String::from("no recognizer configured"),
            };
        };

        let mut cards = match recognizer.recognize(image_url).await {
            Ok(Recognition::QuotaExceeded) => {
                warn!("recognizer quota exceeded, skipping price lookups");
                return IdentifyOutcome::QuotaExceeded;
            }
            Ok(Recognition::Cards(cards)) => cards,
            Err(error) => {
                warn!(%error, "card recognition failed");
                return IdentifyOutcome::RecognizerUnavailable {
                    reason: error.to_string(),
                };
            }
        };
        if cards.is_empty() {
            return IdentifyOutcome::NoCards;
        }

        info!(cards = cards.len(), "cards recognized");
        if let Some(game) = game_override {
            for card in &mut cards {
                card.game = game;
            }
        }
        cards.truncate(MAX_REPORTS);

        let reports = join_all(cards.iter().map(|card| self.report_card(card))).await;
        IdentifyOutcome::Reports(reports.into_iter().map(|(_, report)| report).collect())
    }

    /// Prices a hand-built identity and renders it like a recognized card.
    pub async fn lookup(&self, card: &CardIdentity) -> (RouteOutcome, Report) {
        self.report_card(card).await
    }

    async fn report_card(&self, card: &CardIdentity) -> (RouteOutcome, Report) {
        let outcome = self.router.price_card(card).await;
        let market_info = match &self.market_info {
            Some(lookup) if outcome.result.found => lookup.lookup(card).await,
            _ => None,
        };
        let report = price_report(card, &outcome.result, market_info.as_ref());
        (outcome, report)
    }

    /// Applies the chat trigger rules; `None` means stay silent.
    pub async fn handle_message(&self, message: &IncomingMessage) -> Option<Reply> {
        match classify(message) {
            Trigger::Ignore => None,
            Trigger::PromptForImage => Some(Reply::notice(UPLOAD_PROMPT)),
            Trigger::Identify { image_url } => Some(self.identify(&image_url, None).await.into()),
        }
    }
}

/// Runs one command on its own task so neither an error nor a panic can
/// take the process down; both become [`FAILURE_MESSAGE`].
pub async fn run_guarded<F, E>(command: &'static str, task: F) -> Reply
where
    F: Future<Output = Result<Reply, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    match tokio::spawn(task).await {
        Ok(Ok(reply)) => reply,
        Ok(Err(failure)) => {
            error!(command, error = %failure, "command failed");
            Reply::Failure {
                message: String::from(FAILURE_MESSAGE),
            }
        }
        Err(join_error) => {
            error!(command, error = %join_error, "command task aborted");
            Reply::Failure {
                message: String::from(FAILURE_MESSAGE),
            }
        }
    }
}

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::adapters::{
    JustTcgAdapter, OptcgAdapter, PokemonTcgAdapter, TcgplayerAdapter, TokenCache,
};
use crate::config::BotConfig;
use crate::domain::{CardIdentity, Game, PriceResult, SearchLink};
use crate::health::{Dispatch, HealthTracker, SourceHealth};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::price_source::PriceSource;
use crate::ProviderId;

/// Provenance label of the synthesized search-link result.
pub const SEARCH_LINKS_SOURCE: &str = "search-links";

/// A source together with its priority; lower numbers win latency ties.
#[derive(Clone)]
pub struct SourceEntry {
    pub source: Arc<dyn PriceSource>,
    pub priority: u8,
}

impl SourceEntry {
    pub fn new(source: Arc<dyn PriceSource>, priority: u8) -> Self {
        Self { source, priority }
    }
}

/// What happened to one source during a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Found,
    NotFound,
    Failed,
    TimedOut,
    /// Gated after repeated errors or timeouts and still cooling down; not called.
    Skipped,
    /// Missing credentials; not called.
    NotConfigured,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceAttempt {
    pub source: ProviderId,
    pub priority: u8,
    pub outcome: AttemptOutcome,
    pub response_time_ms: Option<u64>,
    /// The call was the single trial let through for a gated source.
    pub probe: bool,
}

/// Result of a routed lookup plus the trail that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteOutcome {
    pub result: PriceResult,
    pub selected: Option<ProviderId>,
    pub attempts: Vec<SourceAttempt>,
    pub latency_ms: u64,
}

/// Fans a card out to several sources and keeps the fastest answer.
///
/// Every call is timeboxed with `tokio::time::timeout`. An expired call's
/// future is dropped, which aborts its HTTP request. Health is recorded for
/// every call that was made, and sources the tracker reports as cooling down
/// are not called at all.
pub struct FallbackRouter {
    health: Arc<HealthTracker>,
    source_timeout: Duration,
}

impl FallbackRouter {
    pub fn new(health: Arc<HealthTracker>, source_timeout: Duration) -> Self {
        Self {
            health,
            source_timeout,
        }
    }

    pub fn health(&self) -> &Arc<HealthTracker> {
        &self.health
    }

    /// Queries all `sources` concurrently and returns the lowest-latency found
    /// result, ties going to the lower priority number. When nothing is found
    /// the result is the search-link fallback, so this never fails.
    pub async fn resolve_with_fallback(
        &self,
        card: &CardIdentity,
        sources: &[SourceEntry],
    ) -> RouteOutcome {
        let started = Instant::now();
        let settled = join_all(sources.iter().map(|entry| self.attempt(card, entry))).await;

        let best = settled
            .iter()
            .enumerate()
            .filter_map(|(index, (attempt, result))| {
                let result = result.as_ref().filter(|result| result.found)?;
                Some((attempt.response_time_ms.unwrap_or(u64::MAX), attempt.priority, index, result))
            })
            .min_by_key(|(response_time_ms, priority, index, _)| (*response_time_ms, *priority, *index))
            .map(|(response_time_ms, _, index, result)| {
                (settled[index].0.source, response_time_ms, result.clone())
            });

        let attempts = settled
            .iter()
            .map(|(attempt, _)| attempt.clone())
            .collect::<Vec<_>>();
        let latency_ms = elapsed_ms(started);

        match best {
            Some((selected, response_time_ms, result)) => {
                info!(
                    source = %selected,
                    response_time_ms,
                    card = card.display_name(),
                    "price found"
                );
                RouteOutcome {
                    result,
                    selected: Some(selected),
                    attempts,
                    latency_ms,
                }
            }
            None => {
                warn!(
                    card = card.display_name(),
                    sources = sources.len(),
                    "all sources failed, answering with search links"
                );
                RouteOutcome {
                    result: search_link_fallback(card),
                    selected: None,
                    attempts,
                    latency_ms,
                }
            }
        }
    }

    /// Queries one source with the same timebox and health bookkeeping, but
    /// without the search-link fallback.
    pub async fn resolve_single(&self, card: &CardIdentity, entry: &SourceEntry) -> RouteOutcome {
        let started = Instant::now();
        let (attempt, result) = self.attempt(card, entry).await;
        let source = attempt.source;

        let result = match (attempt.outcome, result) {
            (_, Some(result)) => result,
            (AttemptOutcome::TimedOut, None) => PriceResult::not_found_with_error(format!(
                "{source} did not answer within {} ms",
                self.source_timeout.as_millis()
            )),
            (AttemptOutcome::Skipped, None) => PriceResult::not_found_with_error(format!(
                "{source} is temporarily unavailable"
            )),
            (_, None) => PriceResult::not_found(),
        };

        RouteOutcome {
            selected: result.found.then_some(source),
            result,
            attempts: vec![attempt],
            latency_ms: elapsed_ms(started),
        }
    }

    async fn attempt(
        &self,
        card: &CardIdentity,
        entry: &SourceEntry,
    ) -> (SourceAttempt, Option<PriceResult>) {
        let source = entry.source.id();
        let mut attempt = SourceAttempt {
            source,
            priority: entry.priority,
            outcome: AttemptOutcome::Skipped,
            response_time_ms: None,
            probe: false,
        };

        if !entry.source.is_configured() {
            debug!(source = %source, "source not configured, not calling it");
            attempt.outcome = AttemptOutcome::NotConfigured;
            return (attempt, None);
        }

        match self.health.allow_dispatch(source) {
            Dispatch::Allow => {}
            Dispatch::Probe => {
                info!(source = %source, "probing unavailable source");
                attempt.probe = true;
            }
            Dispatch::Skip => {
                warn!(source = %source, "skipping unavailable source");
                return (attempt, None);
            }
        }

        let started = Instant::now();
        let answer = tokio::time::timeout(self.source_timeout, entry.source.query(card)).await;
        let response_time_ms = elapsed_ms(started);
        attempt.response_time_ms = Some(response_time_ms);

        match answer {
            Ok(result) => {
                attempt.outcome = if result.found {
                    AttemptOutcome::Found
                } else if result.error.is_some() {
                    AttemptOutcome::Failed
                } else {
                    AttemptOutcome::NotFound
                };
                match attempt.outcome {
                    AttemptOutcome::NotFound => self.health.record_miss(source, response_time_ms),
                    _ => self.health.record(source, result.found, response_time_ms),
                }
                (attempt, Some(result.with_response_time(response_time_ms)))
            }
            Err(_) => {
                self.health.record(source, false, response_time_ms);
                warn!(
                    source = %source,
                    timeout_ms = self.source_timeout.as_millis() as u64,
                    "source timed out"
                );
                attempt.outcome = AttemptOutcome::TimedOut;
                (attempt, None)
            }
        }
    }
}

/// Deterministic stand-in used when every source failed.
///
/// The search query is the card name, the printed number up to any `/`, and
/// the set name.
pub fn search_link_fallback(card: &CardIdentity) -> PriceResult {
    let display_name = card.display_name();
    let mut parts = vec![display_name.to_owned()];
    if let Some(number) = card.card_number.as_deref() {
        let prefix = number.split_once('/').map_or(number, |(head, _)| head).trim();
        // A nameless card is displayed by its number already.
        if !prefix.is_empty() && !display_name.contains(prefix) {
            parts.push(prefix.to_owned());
        }
    }
    if let Some(set_name) = card.set_name.as_deref() {
        parts.push(set_name.to_owned());
    }
    let query = parts.join(" ");
    let encoded = urlencoding::encode(&query);

    let mut result = PriceResult::found(SEARCH_LINKS_SOURCE);
    result.search_links = Some(vec![
        SearchLink::new(
            "TCGPlayer",
            format!(
                "https://www.tcgplayer.com/search/all?productLineName={}&q={encoded}",
                card.game.tcgplayer_product_line()
            ),
        ),
        SearchLink::new(
            "Google",
            format!(
                "https://www.google.com/search?q={}",
                urlencoding::encode(&format!("{query} price"))
            ),
        ),
        SearchLink::new(
            "CardMarket",
            format!(
                "https://www.cardmarket.com/en/{}/Search?searchString={encoded}",
                card.game.cardmarket_segment()
            ),
        ),
    ]);
    result.fill_from_card(card)
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}

/// Source listing used by the `sources` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSnapshot {
    pub id: ProviderId,
    pub name: &'static str,
    pub configured: bool,
    pub games: Vec<Game>,
    pub health: SourceHealth,
}

impl SourceSnapshot {
    pub fn status_label(&self) -> &'static str {
        if !self.configured {
            "not_configured"
        } else if self.health.gated {
            "unavailable"
        } else if self.health.healthy {
            "healthy"
        } else {
            "unhealthy"
        }
    }
}

/// Picks sources per game and delegates to [`FallbackRouter`].
///
/// | Game | Sources (priority order) | Mode |
/// |------|--------------------------|------|
/// | `pokemon` | Pokemon TCG, TCGPlayer, JustTCG | concurrent fallback |
/// | `onepiece` | OPTCG | single |
/// | `yugioh` | TCGPlayer | single |
/// | `other` | JustTCG | single |
pub struct PriceRouter {
    fallback: FallbackRouter,
    sources: HashMap<ProviderId, Arc<dyn PriceSource>>,
}

impl PriceRouter {
    pub fn new(fallback: FallbackRouter, sources: Vec<Arc<dyn PriceSource>>) -> Self {
        let sources = sources
            .into_iter()
            .map(|source| (source.id(), source))
            .collect();
        Self { fallback, sources }
    }

    pub const fn plan(game: Game) -> &'static [ProviderId] {
        match game {
            Game::Pokemon => &[ProviderId::PokemonTcg, ProviderId::Tcgplayer, ProviderId::Justtcg],
            Game::Onepiece => &[ProviderId::Optcg],
            Game::Yugioh => &[ProviderId::Tcgplayer],
            Game::Other => &[ProviderId::Justtcg],
        }
    }

    pub fn health(&self) -> &Arc<HealthTracker> {
        self.fallback.health()
    }

    /// Prices one recognized card according to its game.
    pub async fn price_card(&self, card: &CardIdentity) -> RouteOutcome {
        let plan = Self::plan(card.game);
        debug!(game = %card.game, card = card.display_name(), "pricing card");

        if let [single] = plan {
            return self.query_source(*single, card).await;
        }

        let entries = plan
            .iter()
            .zip(1u8..)
            .filter_map(|(provider, priority)| {
                self.sources
                    .get(provider)
                    .map(|source| SourceEntry::new(Arc::clone(source), priority))
            })
            .collect::<Vec<_>>();
        self.fallback.resolve_with_fallback(card, &entries).await
    }

    /// Queries exactly one source, bypassing the game plan.
    pub async fn query_source(&self, provider: ProviderId, card: &CardIdentity) -> RouteOutcome {
        match self.sources.get(&provider) {
            Some(source) => {
                self.fallback
                    .resolve_single(card, &SourceEntry::new(Arc::clone(source), 1))
                    .await
            }
            None => RouteOutcome {
                result: PriceResult::not_found_with_error(format!(
                    "source '{provider}' is not registered"
                )),
                selected: None,
                attempts: Vec::new(),
                latency_ms: 0,
            },
        }
    }

    /// Every registered source with its games and current health.
    pub fn snapshot(&self) -> Vec<SourceSnapshot> {
        ProviderId::ALL
            .into_iter()
            .filter_map(|provider| {
                let source = self.sources.get(&provider)?;
                Some(SourceSnapshot {
                    id: provider,
                    name: provider.display_name(),
                    configured: source.is_configured(),
                    games: Game::ALL
                        .into_iter()
                        .filter(|game| Self::plan(*game).contains(&provider))
                        .collect(),
                    health: self.health().get(provider).unwrap_or_default(),
                })
            })
            .collect()
    }
}

/// Builds a [`PriceRouter`] from [`BotConfig`].
///
/// The health tracker, token cache and HTTP client are shared handles; pass
/// your own to observe or script them, otherwise fresh ones are created.
///
/// ```rust,ignore
/// use tcgscout_core::{BotConfig, PriceRouterBuilder};
///
/// let router = PriceRouterBuilder::new(BotConfig::from_env()?).build();
/// ```
#[derive(Default)]
pub struct PriceRouterBuilder {
    config: BotConfig,
    http_client: Option<Arc<dyn HttpClient>>,
    health: Option<Arc<HealthTracker>>,
    tokens: Option<Arc<TokenCache>>,
    overrides: Vec<Arc<dyn PriceSource>>,
}

impl PriceRouterBuilder {
    pub fn new(config: BotConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn with_health_tracker(mut self, health: Arc<HealthTracker>) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_token_cache(mut self, tokens: Arc<TokenCache>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Replaces the built-in source with the same id.
    pub fn with_source(mut self, source: Arc<dyn PriceSource>) -> Self {
        self.overrides.push(source);
        self
    }

    pub fn build(self) -> PriceRouter {
        let http_client = self
            .http_client
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));
        let health = self
            .health
            .unwrap_or_else(|| Arc::new(HealthTracker::new(self.config.health)));
        let tokens = self.tokens.unwrap_or_default();

        let mut sources: Vec<Arc<dyn PriceSource>> = vec![
            Arc::new(PokemonTcgAdapter::new(Arc::clone(&http_client))),
            Arc::new(TcgplayerAdapter::new(
                Arc::clone(&http_client),
                self.config.tcgplayer.clone(),
                tokens,
            )),
            Arc::new(JustTcgAdapter::new(
                Arc::clone(&http_client),
                self.config.justtcg_api_key.clone(),
            )),
            Arc::new(OptcgAdapter::new(http_client)),
        ];
        for source in self.overrides {
            sources.retain(|existing| existing.id() != source.id());
            sources.push(source);
        }

        PriceRouter::new(
            FallbackRouter::new(health, self.config.source_timeout),
            sources,
        )
    }
}

//! # tcgscout Core
//!
//! Card recognition, price lookups and reply building for the tcgscout
//! trading-card price bot.
//!
//! ## Overview
//!
//! This crate provides everything between a screenshot and a reply:
//!
//! - **Domain models** for recognized cards and normalized price results
//! - **Input validation** for exact card-number searches
//! - **Price source adapters** with declarative field mapping tables
//! - **Health tracking** that gates dispatch to failing sources
//! - **Fallback routing** that fans out, keeps the fastest answer and never fails
//! - **Presentation** into platform-neutral reports
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Price sources (OPTCG, Pokemon TCG, TCGPlayer, JustTCG) |
//! | [`cache`] | In-memory TTL cache |
//! | [`config`] | Environment configuration |
//! | [`domain`] | Card identity, games, price results |
//! | [`error`] | Core error types |
//! | [`field_map`] | Provider JSON to [`PriceResult`] mapping tables |
//! | [`health`] | Per-source health registry and dispatch gating |
//! | [`http_client`] | HTTP client abstraction |
//! | [`market_info`] | Optional market headline lookup |
//! | [`presentation`] | Report builders and Markdown rendering |
//! | [`price_source`] | Price source trait and adapter errors |
//! | [`routing`] | Fallback router and per-game routing |
//! | [`service`] | Command entry points |
//! | [`source`] | Provider identifiers |
//! | [`trigger`] | Chat message trigger rules |
//! | [`validation`] | Card-number format checks |
//! | [`vision`] | Card recognition from screenshots |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tcgscout_core::{BotConfig, CommandService, Game};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BotConfig::from_env()?;
//!     let service = CommandService::from_config(&config);
//!
//!     let report = service.search_by_number("OP05-119", Game::Onepiece).await;
//!     println!("{}", report.to_markdown());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / Chat     │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Command Service │────▶│ Card Recognizer  │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  Price Router   │────▶│ Health Tracker   │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Price Source    │────▶│ HTTP Client      │
//! │ (Adapter Trait) │     │ (reqwest)        │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Price sources never fail at their boundary. Adapter-internal failures are
//! structured and folded into the result:
//!
//! ```rust
//! use tcgscout_core::{ProviderId, SourceError, SourceErrorKind};
//!
//! let error = SourceError::upstream_status(ProviderId::Optcg, 503);
//! assert_eq!(error.kind(), SourceErrorKind::UpstreamStatus);
//! assert!(error.retryable());
//!
//! let result = error.into_result();
//! assert!(!result.found);
//! assert!(result.error.is_some());
//! ```
//!
//! ## Security
//!
//! - API keys are read from environment variables only (never logged)
//! - Keys travel in headers, never in logged URLs

pub mod adapters;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod field_map;
pub mod health;
pub mod http_client;
pub mod market_info;
pub mod presentation;
pub mod price_source;
pub mod routing;
pub mod service;
pub mod source;
pub mod trigger;
pub mod validation;
pub mod vision;

#[cfg(test)]
mod test_support;

// Adapter implementations
pub use adapters::{
    JustTcgAdapter, OptcgAdapter, PokemonTcgAdapter, TcgplayerAdapter, TcgplayerCredentials,
    TokenCache,
};

// Caching
pub use cache::CacheStore;

// Configuration
pub use config::BotConfig;

// Domain models
pub use domain::{
    CardIdentity, Confidence, Game, PricePoint, PriceResult, PriceTable, RelatedCard, SearchLink,
};

// Error types
pub use error::{ConfigError, ValidationError, VisionError};

// Health
pub use health::{Dispatch, HealthPolicy, HealthTracker, SourceHealth};

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
};

// Market info
pub use market_info::{MarketInfo, MarketInfoLookup};

// Presentation
pub use presentation::{Report, ReportField, MAX_REPORTS};

// Price source trait and errors
pub use price_source::{PriceSource, QueryFuture, SourceError, SourceErrorKind};

// Routing types
pub use routing::{
    AttemptOutcome, FallbackRouter, PriceRouter, PriceRouterBuilder, RouteOutcome, SourceAttempt,
    SourceEntry, SourceSnapshot,
};

// Commands
pub use service::{run_guarded, CommandService, IdentifyOutcome, Reply};

// Source identifiers
pub use source::ProviderId;

// Trigger rules
pub use trigger::{Attachment, IncomingMessage, Trigger};

// Validation
pub use validation::Validation;

// Recognition
pub use vision::{CardRecognizer, GeminiRecognizer, Recognition, RecognizeFuture};

//! CLI argument definitions for tcgscout.
//!
//! The CLI drives the same command service the chat front end uses, so every
//! reply a user would see in chat can be reproduced from a terminal.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `search` | Price a card by its exact card number |
//! | `price` | Identify the cards in a screenshot and price each one |
//! | `lookup` | Price a hand-described card through the game's routing |
//! | `sources` | List price sources with priority and current health |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `text` | Output format (text, json) |
//! | `--timeout-ms` | from env, else `8000` | Per-source timeout in ms |
//! | `--web-search` | from env, else `false` | Attach a market headline to priced cards |
//!
//! # Examples
//!
//! ```bash
//! # Exact number search
//! tcgscout search --game onepiece OP05-119
//!
//! # Identify a screenshot (needs GEMINI_API_KEY)
//! tcgscout price https://cdn.example.com/pull.png --format json
//!
//! # Manual lookup
//! tcgscout lookup --game pokemon --name Charizard --number 4/102
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use tcgscout_core::Game;

/// 🃏 tcgscout - trading card price lookups
///
/// Recognize cards from screenshots and price them across Pokemon TCG,
/// TCGPlayer, JustTCG and OPTCG with automatic fallback.
#[derive(Debug, Parser)]
#[command(
    name = "tcgscout",
    author,
    version,
    about = "Trading card recognition and price lookups",
    long_about = "tcgscout identifies trading cards from screenshots and looks up \
their market prices. Features include:\n\
\n\
  • Card recognition through Gemini Vision\n\
  • Concurrent price sources with fastest-answer fallback\n\
  • Health tracking that skips failing sources\n\
  • Search links whenever no source has a price\n\
\n\
Configuration is read from the environment or a .env file.\n\
Use 'tcgscout <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for replies.
    ///
    /// - text: Markdown rendering of each report (default)
    /// - json: The reply as a single JSON object
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Per-source timeout in milliseconds, overriding TCGSCOUT_SOURCE_TIMEOUT_MS.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Attach a market headline to priced cards.
    #[arg(long, global = true, default_value_t = false)]
    pub web_search: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Markdown text, one block per report.
    Text,
    /// Single JSON object.
    Json,
}

/// Games accepted by exact-number search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchGame {
    Onepiece,
    Pokemon,
}

impl From<SearchGame> for Game {
    fn from(game: SearchGame) -> Self {
        match game {
            SearchGame::Onepiece => Self::Onepiece,
            SearchGame::Pokemon => Self::Pokemon,
        }
    }
}

/// Every game the router knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GameArg {
    Pokemon,
    Onepiece,
    Yugioh,
    Other,
}

impl From<GameArg> for Game {
    fn from(game: GameArg) -> Self {
        match game {
            GameArg::Pokemon => Self::Pokemon,
            GameArg::Onepiece => Self::Onepiece,
            GameArg::Yugioh => Self::Yugioh,
            GameArg::Other => Self::Other,
        }
    }
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// 🔍 Price a card by its exact card number.
    ///
    /// The number is checked against the game's format first; malformed
    /// numbers get a hint instead of a lookup.
    ///
    /// # Examples
    ///
    ///   tcgscout search --game onepiece OP05-119
    ///   tcgscout search --game pokemon sv8-199
    Search(SearchArgs),

    /// 📸 Identify the cards in a screenshot and price each one.
    ///
    /// Requires GEMINI_API_KEY. At most ten cards are priced per image.
    ///
    /// # Examples
    ///
    ///   tcgscout price https://cdn.example.com/pull.png
    ///   tcgscout price https://cdn.example.com/pull.png --game pokemon
    Price(PriceArgs),

    /// 🧾 Price a hand-described card through the game's routing.
    ///
    /// # Examples
    ///
    ///   tcgscout lookup --game pokemon --name Charizard --number 4/102
    ///   tcgscout lookup --game yugioh --name "Dark Magician"
    Lookup(LookupArgs),

    /// 🔌 List price sources with priority and current health.
    Sources(SourcesArgs),
}

/// Arguments for the `search` command.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Game whose number format applies.
    #[arg(long, value_enum)]
    pub game: SearchGame,

    /// Exact card number (e.g., OP10-005, sv8-199).
    pub query: String,
}

/// Arguments for the `price` command.
#[derive(Debug, Args)]
pub struct PriceArgs {
    /// URL of the card screenshot.
    pub image_url: String,

    /// Treat every recognized card as this game.
    #[arg(long, value_enum)]
    pub game: Option<GameArg>,
}

/// Arguments for the `lookup` command.
#[derive(Debug, Args)]
pub struct LookupArgs {
    #[arg(long, value_enum)]
    pub game: GameArg,

    /// English card name.
    #[arg(long)]
    pub name: Option<String>,

    /// Printed card number.
    #[arg(long)]
    pub number: Option<String>,

    /// Set or expansion name.
    #[arg(long)]
    pub set: Option<String>,

    #[arg(long)]
    pub rarity: Option<String>,
}

/// Arguments for the `sources` command.
#[derive(Debug, Args)]
pub struct SourcesArgs {
    /// Include health details (failures, last check, response time).
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_requires_a_supported_game() {
        let cli = Cli::try_parse_from(["tcgscout", "search", "--game", "onepiece", "OP05-119"])
            .expect("valid search");
        match cli.command {
            Command::Search(args) => {
                assert_eq!(Game::from(args.game), Game::Onepiece);
                assert_eq!(args.query, "OP05-119");
            }
            other => panic!("unexpected command {other:?}"),
        }

        assert!(Cli::try_parse_from(["tcgscout", "search", "--game", "yugioh", "LOB-001"]).is_err());
    }

    #[test]
    fn global_options_apply_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "tcgscout",
            "sources",
            "--format",
            "json",
            "--timeout-ms",
            "2500",
        ])
        .expect("valid sources");

        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.timeout_ms, Some(2500));
        assert!(!cli.web_search);
    }

    #[test]
    fn lookup_fields_are_optional() {
        let cli = Cli::try_parse_from(["tcgscout", "lookup", "--game", "other", "--name", "Mox"])
            .expect("valid lookup");
        let Command::Lookup(args) = cli.command else {
            panic!("expected lookup");
        };
        assert_eq!(args.name.as_deref(), Some("Mox"));
        assert!(args.number.is_none());
    }
}

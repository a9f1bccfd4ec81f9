//! Card-number checks for the search-by-number command.
//!
//! Queries are rejected with user-facing guidance rather than errors. A
//! near-miss One Piece number is never padded and searched; the corrected
//! form is only suggested.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::Game;

/// Known Pokemon series codes, in the order they are suggested.
pub const POKEMON_SERIES: &[(&str, &str)] = &[
    ("base1", "Base Set"),
    ("swsh1", "Sword & Shield"),
    ("swsh4", "Vivid Voltage"),
    ("swsh5", "Battle Styles"),
    ("swsh12", "Silver Tempest"),
    ("sv1", "Scarlet & Violet"),
    ("sv2", "Paldea Evolved"),
    ("sv3", "Obsidian Flames"),
    ("sv4", "Lost Origin"),
    ("sv5", "151"),
    ("sv6", "Crown Zenith"),
];

const SUGGESTED_SERIES: usize = 10;

static ALLOWED_CHARACTERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9/\-]+$").expect("allowed character pattern is a valid regex")
});

static ONEPIECE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(OP|EB|PRB)\d{2}-\d{3}$").expect("one piece number pattern is a valid regex")
});

static ONEPIECE_SHORT_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(OP|EB|PRB)(\d{2})-(\d{1,2})$")
        .expect("one piece short number pattern is a valid regex")
});

static POKEMON_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[A-Z]{2,4}\d{1,2}-\d{1,3}$").expect("pokemon number pattern is a valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The trimmed query, ready to send to a source.
    Valid { query: String },
    Invalid { hint: String },
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Valid { .. } => None,
            Self::Invalid { hint } => Some(hint),
        }
    }

    fn invalid(hint: impl Into<String>) -> Self {
        Self::Invalid { hint: hint.into() }
    }
}

/// Checks `query` against the numbering convention of `game`.
pub fn validate(query: &str, game: Game) -> Validation {
    let query = query.trim();
    if !ALLOWED_CHARACTERS.is_match(query) {
        return Validation::invalid(
            "❌ **Exact card numbers only**\n\n\
             Search by the printed card number; names and set names are not supported.",
        );
    }

    match game {
        Game::Onepiece => validate_onepiece(query),
        Game::Pokemon if POKEMON_NUMBER.is_match(query) => Validation::Valid {
            query: query.to_owned(),
        },
        Game::Pokemon => Validation::invalid(pokemon_series_hint()),
        Game::Yugioh | Game::Other => Validation::invalid(
            "❌ **Game not supported**\n\nNumber search currently supports One Piece and Pokemon cards.",
        ),
    }
}

fn validate_onepiece(query: &str) -> Validation {
    if ONEPIECE_NUMBER.is_match(query) {
        return Validation::Valid {
            query: query.to_owned(),
        };
    }

    if let Some(captures) = ONEPIECE_SHORT_NUMBER.captures(query) {
        let corrected = format!(
            "{}{}-{:0>3}",
            captures[1].to_ascii_uppercase(),
            &captures[2],
            &captures[3]
        );
        return Validation::invalid(format!(
            "💡 **Format hint**: the card number needs 3 digits\n\n\
             You entered: `{query}`\nCorrect format: `{corrected}`\n\n\
             Try again with the full card number."
        ));
    }

    Validation::invalid(
        "💡 **One Piece card number format**\n\n\
         `OPxx-yyy` - main sets (e.g. OP01-001)\n\
         `EBxx-yyy` - Extra Booster (e.g. EB01-001)\n\
         `PRBxx-yyy` - Premium Booster (e.g. PRB01-001)\n\n\
         The card number must have 3 digits, zero-padded.",
    )
}

/// Lists the first known series codes with a few example numbers.
pub fn pokemon_series_hint() -> String {
    let series = POKEMON_SERIES
        .iter()
        .take(SUGGESTED_SERIES)
        .map(|(code, name)| format!("`{code}` - {name}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "💡 **Pokemon card number format**\n\n\
         Format: `series-number`\nExamples: `swsh4-136`, `sv1-1`, `base1-4`\n\n\
         **Common series codes:**\n{series}"
    )
}

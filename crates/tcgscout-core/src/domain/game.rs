use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::ValidationError;

/// Card game a recognized card belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Game {
    Pokemon,
    Onepiece,
    Yugioh,
    #[default]
    Other,
}

impl Game {
    pub const ALL: [Self; 4] = [Self::Pokemon, Self::Onepiece, Self::Yugioh, Self::Other];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pokemon => "pokemon",
            Self::Onepiece => "onepiece",
            Self::Yugioh => "yugioh",
            Self::Other => "other",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Pokemon => "Pokemon TCG",
            Self::Onepiece => "One Piece TCG",
            Self::Yugioh => "Yu-Gi-Oh TCG",
            Self::Other => "TCG",
        }
    }

    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Pokemon => "⚡",
            Self::Onepiece => "🏴‍☠️",
            Self::Yugioh => "🃏",
            Self::Other => "🎴",
        }
    }

    /// `productLineName` used by TCGPlayer search pages.
    pub const fn tcgplayer_product_line(self) -> &'static str {
        match self {
            Self::Pokemon => "pokemon",
            Self::Onepiece => "one-piece-card-game",
            Self::Yugioh => "yugioh",
            Self::Other => "all",
        }
    }

    /// Path segment used by Cardmarket search pages.
    pub const fn cardmarket_segment(self) -> &'static str {
        match self {
            Self::Pokemon => "Pokemon",
            Self::Onepiece => "OnePiece",
            Self::Yugioh => "YuGiOh",
            Self::Other => "Magic",
        }
    }

    /// Maps free-form model output onto a game, falling back to [`Game::Other`].
    pub fn from_lossy(value: &str) -> Self {
        let normalized = value
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "pokemon" | "pokmon" | "ptcg" => Self::Pokemon,
            "onepiece" | "optcg" => Self::Onepiece,
            "yugioh" | "ygo" => Self::Yugioh,
            _ => Self::Other,
        }
    }
}

impl Display for Game {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Game {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pokemon" => Ok(Self::Pokemon),
            "onepiece" => Ok(Self::Onepiece),
            "yugioh" => Ok(Self::Yugioh),
            "other" => Ok(Self::Other),
            other => Err(ValidationError::InvalidGame {
                value: other.to_owned(),
            }),
        }
    }
}

impl<'de> Deserialize<'de> for Game {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::from_lossy).unwrap_or_default())
    }
}

/// How sure the recognizer (or the user) is about a card identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
    Manual,
}

impl FromStr for Confidence {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            "manual" => Ok(Self::Manual),
            other => Err(ValidationError::InvalidConfidence {
                value: other.to_owned(),
            }),
        }
    }
}

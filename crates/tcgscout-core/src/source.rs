use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical price provider identifiers used for routing and health tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    PokemonTcg,
    Tcgplayer,
    Justtcg,
    Optcg,
}

impl ProviderId {
    pub const ALL: [Self; 4] = [Self::PokemonTcg, Self::Tcgplayer, Self::Justtcg, Self::Optcg];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PokemonTcg => "pokemon_tcg",
            Self::Tcgplayer => "tcgplayer",
            Self::Justtcg => "justtcg",
            Self::Optcg => "optcg",
        }
    }

    /// Provenance label shown to users next to a price.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::PokemonTcg => "Pokemon TCG API",
            Self::Tcgplayer => "TCGPlayer API",
            Self::Justtcg => "JustTCG API",
            Self::Optcg => "OPTCG API",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pokemon_tcg" | "pokemontcg" => Ok(Self::PokemonTcg),
            "tcgplayer" => Ok(Self::Tcgplayer),
            "justtcg" => Ok(Self::Justtcg),
            "optcg" => Ok(Self::Optcg),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_identifier_from_its_own_label() {
        for provider in ProviderId::ALL {
            assert_eq!(provider.as_str().parse::<ProviderId>(), Ok(provider));
        }
    }

    #[test]
    fn rejects_unknown_source() {
        let error = "cardmarket".parse::<ProviderId>().expect_err("unknown source");
        assert_eq!(
            error,
            ValidationError::InvalidSource {
                value: String::from("cardmarket")
            }
        );
    }
}

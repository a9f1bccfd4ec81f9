use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::{Confidence, Game};
use crate::ValidationError;

/// A card worth a look, suggested by the recognizer next to the identified card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedCard {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub reason: Option<String>,
}

/// Structured guess about a physical card.
///
/// Produced by the vision recognizer (keys follow the model's snake_case reply)
/// or built by hand for manual lookups. Every field except `game` may be
/// absent, and malformed values degrade to `None` instead of failing the
/// whole record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardIdentity {
    #[serde(default)]
    pub game: Game,
    #[serde(rename = "name_en", default, deserialize_with = "lenient_text")]
    pub name_english: Option<String>,
    #[serde(rename = "name_jp", default, deserialize_with = "lenient_text")]
    pub name_japanese: Option<String>,
    #[serde(rename = "name_cn", default, deserialize_with = "lenient_text")]
    pub name_chinese: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub card_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub rarity: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub set_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_parse")]
    pub confidence: Option<Confidence>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub ocr_raw: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub collectible_value: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub market_popularity: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub competitive_usage: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub highlights: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub release_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_related")]
    pub related_cards: Vec<RelatedCard>,
}

impl CardIdentity {
    /// Starts a user-supplied identity with `manual` confidence.
    pub fn manual(game: Game) -> Self {
        Self {
            game,
            confidence: Some(Confidence::Manual),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name_english = non_empty(name.into());
        self
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.card_number = non_empty(number.into());
        self
    }

    pub fn with_set(mut self, set_name: impl Into<String>) -> Self {
        self.set_name = non_empty(set_name.into());
        self
    }

    pub fn with_rarity(mut self, rarity: impl Into<String>) -> Self {
        self.rarity = non_empty(rarity.into());
        self
    }

    /// Rejects manual identities that carry neither a name nor a number.
    pub fn ensure_lookup(self) -> Result<Self, ValidationError> {
        if self.is_lookup_meaningful() {
            Ok(self)
        } else {
            Err(ValidationError::EmptyLookup)
        }
    }

    pub fn is_lookup_meaningful(&self) -> bool {
        self.name_english.is_some() || self.card_number.is_some()
    }

    /// Best human-readable name, in English → Chinese → Japanese order.
    pub fn display_name(&self) -> &str {
        self.name_english
            .as_deref()
            .or(self.name_chinese.as_deref())
            .or(self.name_japanese.as_deref())
            .or(self.card_number.as_deref())
            .unwrap_or("Unknown card")
    }

    /// Card number with whitespace removed, as providers expect it.
    pub fn compact_number(&self) -> Option<String> {
        self.card_number
            .as_deref()
            .map(|number| number.split_whitespace().collect::<String>())
            .filter(|number| !number.is_empty())
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Accepts strings and numbers; anything else (or blank text) becomes `None`.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(text)) => non_empty(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

fn lenient_parse<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = lenient_text(deserializer)?;
    Ok(raw.and_then(|value| value.parse().ok()))
}

fn lenient_related<'de, D>(deserializer: D) -> Result<Vec<RelatedCard>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = raw else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<RelatedCard>(item).ok())
        .filter(|related| related.name.is_some())
        .collect())
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::CardIdentity;

/// Prices for one printing variant, in USD.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub market: Option<f64>,
    pub low: Option<f64>,
    pub mid: Option<f64>,
    pub high: Option<f64>,
}

impl PricePoint {
    /// First available amount in market → low → mid → high order.
    pub fn headline(&self) -> Option<f64> {
        self.market.or(self.low).or(self.mid).or(self.high)
    }

    pub fn is_empty(&self) -> bool {
        self.headline().is_none()
    }
}

/// Variant label (`normal`, `holofoil`, ...) to prices.
pub type PriceTable = BTreeMap<String, PricePoint>;

/// Variant preferred when a result carries several.
pub const DEFAULT_VARIANT: &str = "normal";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLink {
    pub name: String,
    pub url: String,
}

impl SearchLink {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Common output of every price source.
///
/// Optional fields serialize as `null` so downstream renderers always see the
/// same keys. `found == true` implies a non-empty `source`, and
/// `found == false` implies `prices` is `None`; the constructors keep both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResult {
    pub found: bool,
    pub name: Option<String>,
    pub set: Option<String>,
    pub number: Option<String>,
    pub rarity: Option<String>,
    pub image: Option<String>,
    pub prices: Option<PriceTable>,
    pub source: Option<String>,
    /// Set by the router; only used for ranking.
    #[serde(rename = "responseTime")]
    pub response_time_ms: Option<u64>,
    pub search_links: Option<Vec<SearchLink>>,
    pub url: Option<String>,
    #[serde(default)]
    pub details: BTreeMap<String, String>,
    pub error: Option<String>,
    pub format_hint: Option<String>,
}

impl PriceResult {
    pub fn not_found() -> Self {
        Self::default()
    }

    /// Not found because the source could not be asked, as opposed to a clean miss.
    pub fn not_found_with_error(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Rejected before any source was contacted.
    pub fn format_rejection(hint: impl Into<String>) -> Self {
        Self {
            format_hint: Some(hint.into()),
            ..Self::default()
        }
    }

    /// A found result with an empty price table; callers fill in the rest.
    pub fn found(source: impl Into<String>) -> Self {
        let source = source.into();
        debug_assert!(!source.is_empty(), "found results need a source label");
        Self {
            found: true,
            prices: Some(PriceTable::new()),
            source: Some(source),
            ..Self::default()
        }
    }

    pub fn format_error(&self) -> bool {
        self.format_hint.is_some()
    }

    /// Fills descriptive fields the provider left empty from the recognized card.
    pub fn fill_from_card(mut self, card: &CardIdentity) -> Self {
        if self.name.is_none() {
            self.name = card.name_english.clone();
        }
        if self.set.is_none() {
            self.set = card.set_name.clone();
        }
        if self.number.is_none() {
            self.number = card.card_number.clone();
        }
        if self.rarity.is_none() {
            self.rarity = card.rarity.clone();
        }
        self
    }

    pub fn with_response_time(mut self, response_time_ms: u64) -> Self {
        self.response_time_ms = Some(response_time_ms);
        self
    }

    /// Headline USD amount: the `normal` variant when it has one, otherwise
    /// the first variant carrying any price. Always `None` when not found.
    pub fn headline_price(&self) -> Option<f64> {
        if !self.found {
            return None;
        }
        let prices = self.prices.as_ref()?;
        prices
            .get(DEFAULT_VARIANT)
            .and_then(PricePoint::headline)
            .or_else(|| prices.values().find_map(PricePoint::headline))
    }

    pub fn is_search_link_fallback(&self) -> bool {
        self.search_links.as_ref().is_some_and(|links| !links.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Game;

    #[test]
    fn not_found_result_serializes_every_key_as_null() {
        let json = serde_json::to_value(PriceResult::not_found()).expect("serializes");
        let object = json.as_object().expect("object");

        for key in [
            "name",
            "set",
            "number",
            "rarity",
            "image",
            "prices",
            "source",
            "responseTime",
            "searchLinks",
            "url",
            "error",
            "formatHint",
        ] {
            assert_eq!(object.get(key), Some(&serde_json::Value::Null), "{key}");
        }
        assert_eq!(object.get("found"), Some(&serde_json::Value::Bool(false)));
    }

    #[test]
    fn headline_prefers_normal_then_first_priced_variant() {
        let mut result = PriceResult::found("OPTCG API");
        let prices = result.prices.get_or_insert_with(PriceTable::new);
        prices.insert(
            String::from("holofoil"),
            PricePoint {
                low: Some(4.5),
                ..PricePoint::default()
            },
        );
        assert_eq!(result.headline_price(), Some(4.5));

        result.prices.get_or_insert_with(PriceTable::new).insert(
            String::from(DEFAULT_VARIANT),
            PricePoint {
                market: Some(1.25),
                ..PricePoint::default()
            },
        );
        assert_eq!(result.headline_price(), Some(1.25));
    }

    #[test]
    fn card_fields_fill_only_gaps() {
        let card = CardIdentity::manual(Game::Onepiece)
            .with_name("Monkey.D.Luffy")
            .with_number("OP01-024")
            .with_set("Romance Dawn");
        let mut result = PriceResult::found("OPTCG API");
        result.name = Some(String::from("Monkey D. Luffy"));

        let result = result.fill_from_card(&card);
        assert_eq!(result.name.as_deref(), Some("Monkey D. Luffy"));
        assert_eq!(result.number.as_deref(), Some("OP01-024"));
        assert_eq!(result.set.as_deref(), Some("Romance Dawn"));
        assert_eq!(result.rarity, None);
    }

    #[test]
    fn rejection_is_a_format_error_without_prices() {
        let result = PriceResult::format_rejection("try OP10-005");
        assert!(result.format_error());
        assert!(!result.found);
        assert!(result.prices.is_none());
        assert_eq!(result.headline_price(), None);
    }
}

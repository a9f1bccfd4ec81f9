use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;

use crate::adapters::{fetch_json, settle};
use crate::domain::{CardIdentity, PriceResult, DEFAULT_VARIANT};
use crate::field_map::{first_text, FieldMap, PricePointMap};
use crate::http_client::{HttpClient, HttpRequest};
use crate::price_source::{PriceSource, QueryFuture, SourceError};
use crate::ProviderId;

pub const POKEMON_TCG_BASE_URL: &str = "https://api.pokemontcg.io/v2";

/// `{series}-{number}` ids such as `sv1-1` or `swsh4-136`.
static CARD_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z]{2,4}\d{1,2}-\d{1,3}$").expect("card id pattern is a valid regex")
});

const FIELDS: FieldMap = FieldMap {
    name: &["/name"],
    set: &["/set/name"],
    number: &["/number"],
    rarity: &["/rarity"],
    image: &["/images/large", "/images/small"],
    prices: &[
        (
            DEFAULT_VARIANT,
            PricePointMap {
                market: &[
                    "/cardmarket/prices/averageSellPrice",
                    "/tcgplayer/prices/normal/market",
                ],
                low: &["/cardmarket/prices/lowPrice", "/tcgplayer/prices/normal/low"],
                mid: &["/tcgplayer/prices/normal/mid"],
                high: &["/tcgplayer/prices/normal/high"],
            },
        ),
        (
            "holofoil",
            PricePointMap {
                market: &["/tcgplayer/prices/holofoil/market"],
                low: &["/tcgplayer/prices/holofoil/low"],
                mid: &["/tcgplayer/prices/holofoil/mid"],
                high: &["/tcgplayer/prices/holofoil/high"],
            },
        ),
    ],
    details: &[("hp", "/hp"), ("types", "/types")],
};

/// Pokemon prices from pokemontcg.io.
///
/// Cards are fetched by id when the card number has the `series-number`
/// shape, otherwise by an exact-name search limited to one result.
#[derive(Clone)]
pub struct PokemonTcgAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl PokemonTcgAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: String::from(POKEMON_TCG_BASE_URL),
            timeout_ms: 8_000,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn is_card_id(value: &str) -> bool {
        CARD_ID.is_match(value)
    }

    fn lookup_request(&self, card: &CardIdentity) -> Result<HttpRequest, SourceError> {
        let base = self.base_url.trim_end_matches('/');
        let url = match (card.compact_number(), card.name_english.as_deref()) {
            (Some(number), _) if Self::is_card_id(&number) => {
                format!("{base}/cards/{}", urlencoding::encode(&number))
            }
            (_, Some(name)) => {
                let query = format!("name:\"{}\"", name.replace('"', ""));
                format!("{base}/cards?q={}&pageSize=1", urlencoding::encode(&query))
            }
            _ => {
                return Err(SourceError::invalid_request(
                    "pokemon lookups need a card id or an English name",
                ))
            }
        };

        Ok(HttpRequest::get(url)
            .with_header("accept", "application/json")
            .with_timeout_ms(self.timeout_ms))
    }

    async fn lookup(&self, card: &CardIdentity) -> Result<PriceResult, SourceError> {
        let request = self.lookup_request(card)?;
        let Some(body) =
            fetch_json(self.http_client.as_ref(), ProviderId::PokemonTcg, request).await?
        else {
            return Ok(PriceResult::not_found());
        };

        // `/cards/{id}` answers with an object, the search with a list.
        let record = match body.get("data") {
            Some(Value::Array(items)) => items.first(),
            Some(record @ Value::Object(_)) => Some(record),
            _ => None,
        };
        let Some(record) = record.filter(|record| first_text(record, FIELDS.name).is_some())
        else {
            return Ok(PriceResult::not_found());
        };

        let mut result = FIELDS.apply(record, ProviderId::PokemonTcg.display_name());
        result.url = first_text(record, &["/tcgplayer/url", "/cardmarket/url"]);
        Ok(result.fill_from_card(card))
    }
}

impl PriceSource for PokemonTcgAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::PokemonTcg
    }

    fn query<'a>(&'a self, card: &'a CardIdentity) -> QueryFuture<'a> {
        Box::pin(async move { settle(self.id(), self.lookup(card).await) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Game;
    use crate::http_client::HttpError;
    use crate::test_support::ScriptedHttpClient;
    use serde_json::json;

    #[test]
    fn recognizes_series_number_ids() {
        assert!(PokemonTcgAdapter::is_card_id("sv1-1"));
        assert!(PokemonTcgAdapter::is_card_id("swsh4-136"));
        assert!(PokemonTcgAdapter::is_card_id("BASE1-4"));
        assert!(!PokemonTcgAdapter::is_card_id("045/264"));
        assert!(!PokemonTcgAdapter::is_card_id("sv-1"));
    }

    #[tokio::test]
    async fn fetches_by_id_and_prefers_cardmarket_prices() {
        let http = Arc::new(ScriptedHttpClient::new().on_json(
            "/cards/swsh4-136",
            200,
            json!({"data": {
                "name": "Pikachu",
                "number": "136",
                "rarity": "Rare",
                "hp": "60",
                "types": ["Lightning"],
                "set": {"name": "Vivid Voltage"},
                "images": {"small": "s.png", "large": "l.png"},
                "cardmarket": {"prices": {"averageSellPrice": 3.1, "lowPrice": null}},
                "tcgplayer": {
                    "url": "https://prices.pokemontcg.io/tcgplayer/swsh4-136",
                    "prices": {"normal": {"market": 2.9, "low": 1.4}}
                }
            }}),
        ));
        let adapter = PokemonTcgAdapter::new(http.clone());
        let card = CardIdentity::manual(Game::Pokemon).with_number("swsh4-136");

        let result = adapter.query(&card).await;

        assert!(result.found);
        assert_eq!(result.source.as_deref(), Some("Pokemon TCG API"));
        assert_eq!(result.image.as_deref(), Some("l.png"));
        let normal = result.prices.as_ref().and_then(|p| p.get("normal")).copied();
        assert_eq!(normal.and_then(|p| p.market), Some(3.1));
        assert_eq!(normal.and_then(|p| p.low), Some(1.4));
        assert_eq!(result.details.get("hp").map(String::as_str), Some("60"));
        assert!(result.url.is_some());
        assert_eq!(http.recorded_requests()[0].timeout_ms, 8_000);
    }

    #[tokio::test]
    async fn falls_back_to_name_search_for_printed_numbers() {
        let http = Arc::new(ScriptedHttpClient::new().on_json(
            "/cards?q=",
            200,
            json!({"data": [{"name": "Pikachu", "set": {"name": "Scarlet & Violet"}}]}),
        ));
        let adapter = PokemonTcgAdapter::new(http.clone());
        let card = CardIdentity::manual(Game::Pokemon)
            .with_name("Pikachu")
            .with_number("045/264");

        let result = adapter.query(&card).await;

        assert!(result.found);
        assert_eq!(result.number.as_deref(), Some("045/264"));
        assert_eq!(
            http.recorded_requests()[0].url,
            "https://api.pokemontcg.io/v2/cards?q=name%3A%22Pikachu%22&pageSize=1"
        );
    }

    #[tokio::test]
    async fn timeout_is_distinguishable_from_not_found() {
        let http = Arc::new(
            ScriptedHttpClient::new()
                .on("sv1-1", Err(HttpError::timeout("deadline elapsed")))
                .on_json("sv1-999", 404, json!({"error": "not found"})),
        );
        let adapter = PokemonTcgAdapter::new(http);

        let unavailable = adapter
            .query(&CardIdentity::manual(Game::Pokemon).with_number("sv1-1"))
            .await;
        let missing = adapter
            .query(&CardIdentity::manual(Game::Pokemon).with_number("sv1-999"))
            .await;

        assert!(!unavailable.found && unavailable.error.is_some());
        assert!(!missing.found && missing.error.is_none());
    }
}

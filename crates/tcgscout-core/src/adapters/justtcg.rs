use std::sync::Arc;

use crate::adapters::{fetch_json, settle};
use crate::domain::{CardIdentity, PriceResult, DEFAULT_VARIANT};
use crate::field_map::{first_text, FieldMap, PricePointMap};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::price_source::{PriceSource, QueryFuture, SourceError};
use crate::ProviderId;

pub const JUSTTCG_BASE_URL: &str = "https://api.justtcg.com/v1";

const FIELDS: FieldMap = FieldMap {
    name: &["/name"],
    set: &["/set_name", "/set"],
    number: &["/card_number", "/number"],
    rarity: &["/rarity"],
    image: &["/image_url"],
    prices: &[(
        DEFAULT_VARIANT,
        PricePointMap {
            market: &["/variants/0/market_price", "/variants/0/price"],
            low: &["/variants/0/low_price"],
            mid: &[],
            high: &[],
        },
    )],
    details: &[("condition", "/variants/0/condition")],
};

/// Catch-all multi-game source; disabled without an API key.
#[derive(Clone)]
pub struct JustTcgAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: Option<String>,
    base_url: String,
    timeout_ms: u64,
}

impl JustTcgAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        Self {
            http_client,
            api_key,
            base_url: String::from(JUSTTCG_BASE_URL),
            timeout_ms: 8_000,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn lookup(&self, card: &CardIdentity) -> Result<PriceResult, SourceError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(SourceError::not_configured(ProviderId::Justtcg));
        };
        let Some(name) = card.name_english.as_deref() else {
            return Err(SourceError::invalid_request("justtcg lookups need an English name"));
        };

        let request = HttpRequest::get(format!(
            "{}/cards?search={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(name)
        ))
        .with_auth(&HttpAuth::BearerToken(api_key.to_owned()))
        .with_timeout_ms(self.timeout_ms);

        let Some(body) = fetch_json(self.http_client.as_ref(), ProviderId::Justtcg, request).await?
        else {
            return Ok(PriceResult::not_found());
        };
        let Some(record) = body
            .pointer("/data/0")
            .filter(|record| first_text(record, FIELDS.name).is_some())
        else {
            return Ok(PriceResult::not_found());
        };

        Ok(FIELDS
            .apply(record, ProviderId::Justtcg.display_name())
            .fill_from_card(card))
    }
}

impl PriceSource for JustTcgAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Justtcg
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn query<'a>(&'a self, card: &'a CardIdentity) -> QueryFuture<'a> {
        Box::pin(async move { settle(self.id(), self.lookup(card).await) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Game;
    use crate::test_support::ScriptedHttpClient;
    use serde_json::json;

    #[tokio::test]
    async fn maps_first_card_and_first_variant() {
        let http = Arc::new(ScriptedHttpClient::new().on_json(
            "/cards?search=Blue-Eyes",
            200,
            json!({"data": [{
                "name": "Blue-Eyes White Dragon",
                "set_name": "Legend of Blue Eyes",
                "card_number": "LOB-001",
                "variants": [
                    {"condition": "Near Mint", "market_price": 45.0, "low_price": 38.5},
                    {"condition": "Played", "market_price": 20.0}
                ]
            }]}),
        ));
        let adapter = JustTcgAdapter::new(http.clone(), Some(String::from("jt-key")));
        let card = CardIdentity::manual(Game::Other).with_name("Blue-Eyes White Dragon");

        let result = adapter.query(&card).await;

        assert!(result.found);
        assert_eq!(result.source.as_deref(), Some("JustTCG API"));
        assert_eq!(result.number.as_deref(), Some("LOB-001"));
        assert_eq!(result.headline_price(), Some(45.0));
        assert_eq!(
            result.details.get("condition").map(String::as_str),
            Some("Near Mint")
        );
        assert_eq!(
            http.recorded_requests()[0]
                .headers
                .get("authorization")
                .map(String::as_str),
            Some("Bearer jt-key")
        );
        assert_eq!(http.recorded_requests()[0].timeout_ms, 8_000);
    }

    #[tokio::test]
    async fn empty_search_and_missing_key_are_misses() {
        let http = Arc::new(ScriptedHttpClient::new().on_json("/cards", 200, json!({"data": []})));
        let card = CardIdentity::manual(Game::Other).with_name("Nothing");

        let keyed = JustTcgAdapter::new(http.clone(), Some(String::from("jt-key")));
        let unkeyed = JustTcgAdapter::new(http.clone(), None);

        assert!(!keyed.query(&card).await.found);
        assert!(!unkeyed.query(&card).await.found);
        assert!(!unkeyed.is_configured());
        assert_eq!(http.request_count(), 1);
    }
}

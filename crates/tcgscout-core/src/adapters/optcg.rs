use std::sync::Arc;

use crate::adapters::{fetch_json, first_record, settle};
use crate::domain::{CardIdentity, PriceResult, DEFAULT_VARIANT};
use crate::field_map::{first_text, FieldMap, PricePointMap};
use crate::http_client::{HttpClient, HttpRequest};
use crate::price_source::{PriceSource, QueryFuture, SourceError};
use crate::ProviderId;

pub const OPTCG_BASE_URL: &str = "https://optcgapi.com/api";

const FIELDS: FieldMap = FieldMap {
    name: &["/card_name"],
    set: &["/set_name"],
    number: &["/card_set_id"],
    rarity: &["/rarity"],
    image: &["/card_image"],
    prices: &[(
        DEFAULT_VARIANT,
        PricePointMap {
            market: &["/market_price"],
            low: &["/inventory_price"],
            mid: &[],
            high: &[],
        },
    )],
    details: &[
        ("color", "/card_color"),
        ("type", "/card_type"),
        ("cost", "/card_cost"),
        ("power", "/card_power"),
    ],
};

/// One Piece prices from the free OPTCG API, looked up by card number.
#[derive(Clone)]
pub struct OptcgAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl OptcgAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: String::from(OPTCG_BASE_URL),
            timeout_ms: 10_000,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn lookup(&self, card: &CardIdentity) -> Result<PriceResult, SourceError> {
        let Some(number) = card.compact_number() else {
            return Err(SourceError::invalid_request("optcg lookups need a card number"));
        };

        let url = format!(
            "{}/sets/card/{}/",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&number)
        );
        let request = HttpRequest::get(url)
            .with_header("accept", "application/json")
            .with_timeout_ms(self.timeout_ms);

        let Some(body) = fetch_json(self.http_client.as_ref(), ProviderId::Optcg, request).await?
        else {
            return Ok(PriceResult::not_found());
        };

        // The API answers unknown numbers with an empty list or an error object.
        let Some(record) = first_record(&body).filter(|record| {
            first_text(record, FIELDS.name).is_some() || first_text(record, FIELDS.number).is_some()
        }) else {
            return Ok(PriceResult::not_found());
        };

        let mut result = FIELDS.apply(record, ProviderId::Optcg.display_name());
        if result.number.is_none() {
            result.number = Some(number);
        }
        Ok(result.fill_from_card(card))
    }
}

impl PriceSource for OptcgAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Optcg
    }

    fn query<'a>(&'a self, card: &'a CardIdentity) -> QueryFuture<'a> {
        Box::pin(async move { settle(self.id(), self.lookup(card).await) })
    }
}

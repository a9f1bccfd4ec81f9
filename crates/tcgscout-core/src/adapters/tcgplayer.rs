use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use crate::adapters::{fetch_json, settle};
use crate::domain::{CardIdentity, PriceResult, DEFAULT_VARIANT};
use crate::field_map::{first_text, FieldMap, PricePointMap};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::price_source::{PriceSource, QueryFuture, SourceError, SourceErrorKind};
use crate::ProviderId;

pub const TCGPLAYER_BASE_URL: &str = "https://api.tcgplayer.com";

/// Lifetime given to a freshly issued bearer token.
const TOKEN_TTL: Duration = Duration::from_secs(3_600);

const PRODUCT_FIELDS: FieldMap = FieldMap {
    name: &["/name"],
    set: &[],
    number: &["/productVariant"],
    rarity: &[],
    image: &["/imageUrl"],
    prices: &[],
    details: &[],
};

const PRICE_ROW: PricePointMap = PricePointMap {
    market: &["/marketPrice"],
    low: &["/lowPrice"],
    mid: &["/midPrice"],
    high: &["/highPrice"],
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcgplayerCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Bearer token shared by every TCGPlayer lookup.
///
/// Refreshes are not serialized: two lookups that both find the cache empty
/// both fetch a token and the later write wins.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached token unless it is absent or expired.
    pub fn get(&self) -> Option<String> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .filter(|token| Instant::now() < token.expires_at)
            .map(|token| token.value.clone())
    }

    pub fn store(&self, value: impl Into<String>, ttl: Duration) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(CachedToken {
            value: value.into(),
            expires_at: Instant::now() + ttl,
        });
    }

    /// Forgets the token so the next lookup fetches a fresh one.
    pub fn clear(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Multi-game prices from the TCGPlayer catalog and pricing APIs.
#[derive(Clone)]
pub struct TcgplayerAdapter {
    http_client: Arc<dyn HttpClient>,
    credentials: Option<TcgplayerCredentials>,
    tokens: Arc<TokenCache>,
    base_url: String,
    timeout_ms: u64,
}

impl TcgplayerAdapter {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        credentials: Option<TcgplayerCredentials>,
        tokens: Arc<TokenCache>,
    ) -> Self {
        Self {
            http_client,
            credentials,
            tokens,
            base_url: String::from(TCGPLAYER_BASE_URL),
            timeout_ms: 8_000,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    async fn access_token(&self, credentials: &TcgplayerCredentials) -> Result<String, SourceError> {
        if let Some(token) = self.tokens.get() {
            return Ok(token);
        }

        debug!(source = %ProviderId::Tcgplayer, "refreshing bearer token");
        let request = HttpRequest::post(format!("{}/token", self.base())).with_form(&[
            ("grant_type", "client_credentials"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
        ])
        .with_timeout_ms(self.timeout_ms);
        let body = fetch_json(self.http_client.as_ref(), ProviderId::Tcgplayer, request)
            .await?
            .ok_or_else(|| SourceError::unavailable("tcgplayer token endpoint not found"))?;
        let token: TokenResponse = serde_json::from_value(body).map_err(|error| {
            SourceError::malformed(format!("tcgplayer token response is invalid: {error}"))
        })?;

        self.tokens.store(token.access_token.clone(), TOKEN_TTL);
        Ok(token.access_token)
    }

    /// Runs a bearer-authenticated request; a 401 drops the cached token.
    async fn fetch_authorized(&self, request: HttpRequest) -> Result<Option<Value>, SourceError> {
        let outcome = fetch_json(self.http_client.as_ref(), ProviderId::Tcgplayer, request).await;
        if matches!(&outcome, Err(error) if error.kind() == SourceErrorKind::Unauthorized) {
            debug!(source = %ProviderId::Tcgplayer, "bearer token rejected, clearing it");
            self.tokens.clear();
        }
        outcome
    }

    async fn lookup(&self, card: &CardIdentity) -> Result<PriceResult, SourceError> {
        let Some(credentials) = self.credentials.as_ref() else {
            return Err(SourceError::not_configured(ProviderId::Tcgplayer));
        };
        let Some(name) = card.name_english.as_deref() else {
            return Err(SourceError::invalid_request("tcgplayer lookups need an English name"));
        };

        let auth = HttpAuth::BearerToken(self.access_token(credentials).await?);

        let search = HttpRequest::get(format!(
            "{}/v2.0/catalog/products?productName={}&limit=5",
            self.base(),
            urlencoding::encode(name)
        ))
        .with_header("accept", "application/json")
        .with_auth(&auth)
        .with_timeout_ms(self.timeout_ms);
        let Some(products) = self.fetch_authorized(search).await? else {
            return Ok(PriceResult::not_found());
        };
        let Some(product) = products.pointer("/results/0") else {
            return Ok(PriceResult::not_found());
        };
        let Some(product_id) = first_text(product, &["/productId"]) else {
            return Err(SourceError::malformed("tcgplayer product has no productId"));
        };

        let pricing = HttpRequest::get(format!(
            "{}/v1.39/pricing/product/{}",
            self.base(),
            urlencoding::encode(&product_id)
        ))
        .with_header("accept", "application/json")
        .with_auth(&auth)
        .with_timeout_ms(self.timeout_ms);
        let rows = self
            .fetch_authorized(pricing)
            .await?
            .ok_or_else(|| SourceError::unavailable("tcgplayer pricing endpoint not found"))?;

        let mut result = PRODUCT_FIELDS.apply(product, ProviderId::Tcgplayer.display_name());
        result.set = set_from_product_url(product);
        result.url = Some(format!("https://www.tcgplayer.com/product/{product_id}"));
        if let (Some(prices), Some(Value::Array(rows))) = (result.prices.as_mut(), rows.get("results")) {
            for row in rows {
                let label = first_text(row, &["/subTypeName"])
                    .map(|label| label.to_ascii_lowercase())
                    .unwrap_or_else(|| String::from(DEFAULT_VARIANT));
                let point = PRICE_ROW.extract(row);
                if !point.is_empty() {
                    prices.insert(label, point);
                }
            }
        }

        Ok(result.fill_from_card(card))
    }
}

/// Product URLs look like `https://www.tcgplayer.com/product/{id}/{set}/...`.
fn set_from_product_url(product: &Value) -> Option<String> {
    first_text(product, &["/productUrl", "/url"])?
        .split('/')
        .nth(5)
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
}

impl PriceSource for TcgplayerAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Tcgplayer
    }

    fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    fn query<'a>(&'a self, card: &'a CardIdentity) -> QueryFuture<'a> {
        Box::pin(async move { settle(self.id(), self.lookup(card).await) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Game;
    use crate::http_client::HttpMethod;
    use crate::test_support::ScriptedHttpClient;
    use serde_json::json;

    fn credentials() -> Option<TcgplayerCredentials> {
        Some(TcgplayerCredentials {
            client_id: String::from("client"),
            client_secret: String::from("secret"),
        })
    }

    fn scripted() -> ScriptedHttpClient {
        ScriptedHttpClient::new()
            .on_json("/token", 200, json!({"access_token": "bearer-1", "expires_in": 1209599}))
            .on_json(
                "/catalog/products",
                200,
                json!({"results": [{
                    "productId": 8812,
                    "name": "Dark Magician",
                    "imageUrl": "https://tcgplayer.test/8812.jpg",
                    "productUrl": "https://www.tcgplayer.com/product/8812/yugioh-legend-of-blue-eyes/dark-magician"
                }]}),
            )
            .on_json(
                "/pricing/product/8812",
                200,
                json!({"results": [
                    {"subTypeName": "Unlimited", "marketPrice": 12.5, "lowPrice": 9.0, "midPrice": 11.0, "highPrice": 20.0},
                    {"subTypeName": "1st Edition", "marketPrice": null, "lowPrice": null, "midPrice": null, "highPrice": null}
                ]}),
            )
    }

    #[tokio::test]
    async fn authenticates_then_searches_then_prices() {
        let http = Arc::new(scripted());
        let adapter = TcgplayerAdapter::new(http.clone(), credentials(), Arc::new(TokenCache::new()));
        let card = CardIdentity::manual(Game::Yugioh).with_name("Dark Magician");

        let result = adapter.query(&card).await;

        assert!(result.found);
        assert_eq!(result.source.as_deref(), Some("TCGPlayer API"));
        assert_eq!(result.set.as_deref(), Some("yugioh-legend-of-blue-eyes"));
        assert_eq!(result.url.as_deref(), Some("https://www.tcgplayer.com/product/8812"));
        let prices = result.prices.as_ref().expect("prices");
        assert_eq!(prices.len(), 1);
        assert_eq!(prices.get("unlimited").and_then(|p| p.market), Some(12.5));

        let requests = http.recorded_requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert!(requests[0]
            .body
            .as_deref()
            .is_some_and(|body| body.contains("grant_type=client_credentials")));
        assert_eq!(
            requests[1].headers.get("authorization").map(String::as_str),
            Some("Bearer bearer-1")
        );
    }

    #[tokio::test]
    async fn cached_token_is_reused_across_lookups() {
        let http = Arc::new(scripted());
        let tokens = Arc::new(TokenCache::new());
        let adapter = TcgplayerAdapter::new(http.clone(), credentials(), tokens);
        let card = CardIdentity::manual(Game::Yugioh).with_name("Dark Magician");

        adapter.query(&card).await;
        adapter.query(&card).await;

        let token_calls = http
            .recorded_requests()
            .iter()
            .filter(|request| request.url.ends_with("/token"))
            .count();
        assert_eq!(token_calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn token_expires_after_its_ttl() {
        let tokens = TokenCache::new();
        tokens.store("bearer-1", Duration::from_secs(60));
        assert_eq!(tokens.get().as_deref(), Some("bearer-1"));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(tokens.get(), None);
    }

    #[tokio::test]
    async fn rejected_token_is_dropped_and_refetched() {
        let http = Arc::new(
            ScriptedHttpClient::new()
                .on_json("/token", 200, json!({"access_token": "bearer-2"}))
                .on_json("/catalog/products", 401, json!({"errors": ["Unauthorized"]})),
        );
        let tokens = Arc::new(TokenCache::new());
        tokens.store("revoked", TOKEN_TTL);
        let adapter = TcgplayerAdapter::new(http.clone(), credentials(), Arc::clone(&tokens));
        let card = CardIdentity::manual(Game::Yugioh).with_name("Dark Magician");

        let first = adapter.query(&card).await;
        assert!(!first.found);
        assert!(first.error.as_deref().is_some_and(|error| error.contains("401")));
        assert_eq!(tokens.get(), None);

        adapter.query(&card).await;
        let requests = http.recorded_requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(
            requests[0].headers.get("authorization").map(String::as_str),
            Some("Bearer revoked")
        );
        assert!(requests[1].url.ends_with("/token"));
        assert_eq!(
            requests[2].headers.get("authorization").map(String::as_str),
            Some("Bearer bearer-2")
        );
    }

    #[tokio::test]
    async fn every_request_carries_the_adapter_timeout() {
        let http = Arc::new(scripted());
        let adapter = TcgplayerAdapter::new(http.clone(), credentials(), Arc::new(TokenCache::new()));

        adapter
            .query(&CardIdentity::manual(Game::Yugioh).with_name("Dark Magician"))
            .await;

        let requests = http.recorded_requests();
        assert_eq!(requests.len(), 3);
        assert!(requests.iter().all(|request| request.timeout_ms == 8_000));
    }

    #[tokio::test]
    async fn missing_credentials_skip_the_network() {
        let http = Arc::new(scripted());
        let adapter = TcgplayerAdapter::new(http.clone(), None, Arc::new(TokenCache::new()));

        let result = adapter
            .query(&CardIdentity::manual(Game::Yugioh).with_name("Dark Magician"))
            .await;

        assert!(!adapter.is_configured());
        assert!(!result.found);
        assert_eq!(http.request_count(), 0);
    }
}

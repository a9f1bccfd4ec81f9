//! Adapters and the recognizer against a local HTTP server, through the
//! production reqwest client.

use std::sync::Arc;

use mockito::{Matcher, Server};
use serde_json::json;
use tcgscout_core::{
    CardIdentity, CardRecognizer, Game, GeminiRecognizer, HttpClient, JustTcgAdapter,
    OptcgAdapter, PokemonTcgAdapter, PriceSource, Recognition, ReqwestHttpClient,
    TcgplayerAdapter, TcgplayerCredentials, TokenCache,
};

fn http() -> Arc<dyn HttpClient> {
    Arc::new(ReqwestHttpClient::new())
}

#[tokio::test]
async fn optcg_prices_a_one_piece_card_by_number() {
    // Given: OPTCG knows OP05-119
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/sets/card/OP05-119/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([{
                "card_name": "Monkey.D.Luffy",
                "set_name": "Awakening of the New Era",
                "card_set_id": "OP05-119",
                "rarity": "SEC",
                "market_price": 182.4,
                "inventory_price": "170.00",
                "card_color": "Purple"
            }])
            .to_string(),
        )
        .create_async()
        .await;
    let adapter = OptcgAdapter::new(http()).with_base_url(server.url());

    // When: the card is queried
    let card = CardIdentity::manual(Game::Onepiece).with_number("OP05-119");
    let result = adapter.query(&card).await;

    // Then: the record is mapped into a priced result
    mock.assert_async().await;
    assert!(result.found);
    assert_eq!(result.name.as_deref(), Some("Monkey.D.Luffy"));
    assert_eq!(result.rarity.as_deref(), Some("SEC"));
    assert_eq!(result.headline_price(), Some(182.4));
    assert_eq!(result.details.get("color").map(String::as_str), Some("Purple"));
}

#[tokio::test]
async fn pokemon_ids_are_fetched_directly() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/cards/sv3-125")
        .with_status(200)
        .with_body(
            json!({
                "data": {
                    "name": "Charizard ex",
                    "number": "125",
                    "rarity": "Double Rare",
                    "set": {"name": "Obsidian Flames"},
                    "images": {"small": "https://images.test/s.png", "large": "https://images.test/l.png"},
                    "tcgplayer": {
                        "url": "https://prices.test/charizard",
                        "prices": {"holofoil": {"low": 20.0, "market": 28.75}}
                    }
                }
            })
            .to_string(),
        )
        .create_async()
        .await;
    let adapter = PokemonTcgAdapter::new(http()).with_base_url(server.url());

    let card = CardIdentity::manual(Game::Pokemon).with_number("sv3-125");
    let result = adapter.query(&card).await;

    mock.assert_async().await;
    assert!(result.found);
    assert_eq!(result.set.as_deref(), Some("Obsidian Flames"));
    assert_eq!(result.image.as_deref(), Some("https://images.test/l.png"));
    assert_eq!(result.url.as_deref(), Some("https://prices.test/charizard"));
    assert_eq!(result.headline_price(), Some(28.75));
}

#[tokio::test]
async fn pokemon_names_are_searched_and_empty_pages_are_misses() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/cards")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "name:\"Pikachu\"".into()),
            Matcher::UrlEncoded("pageSize".into(), "1".into()),
        ]))
        .with_status(200)
        .with_body(json!({"data": [], "totalCount": 0}).to_string())
        .create_async()
        .await;
    let adapter = PokemonTcgAdapter::new(http()).with_base_url(server.url());

    let card = CardIdentity::manual(Game::Pokemon).with_name("Pikachu");
    let result = adapter.query(&card).await;

    mock.assert_async().await;
    assert!(!result.found);
    assert!(result.error.is_none());
}

#[tokio::test]
async fn tcgplayer_reuses_its_bearer_token() {
    // Given: token, catalog and pricing endpoints
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/token")
        .match_body(Matcher::Regex(String::from("grant_type=client_credentials")))
        .with_status(200)
        .with_body(json!({"access_token": "tok-1", "expires_in": 1209599}).to_string())
        .expect(1)
        .create_async()
        .await;
    let catalog = server
        .mock("GET", "/v2.0/catalog/products")
        .match_query(Matcher::UrlEncoded("productName".into(), "Dark Magician".into()))
        .match_header("authorization", "Bearer tok-1")
        .with_status(200)
        .with_body(
            json!({"results": [{
                "productId": 4521,
                "name": "Dark Magician",
                "imageUrl": "https://images.test/dm.jpg",
                "url": "https://www.tcgplayer.com/product/4521/yugioh-legend-of-blue-eyes/dark-magician"
            }]})
            .to_string(),
        )
        .expect(2)
        .create_async()
        .await;
    let pricing = server
        .mock("GET", "/v1.39/pricing/product/4521")
        .match_header("authorization", "Bearer tok-1")
        .with_status(200)
        .with_body(
            json!({"results": [
                {"subTypeName": "1st Edition", "marketPrice": 64.0, "lowPrice": 50.0},
                {"subTypeName": "Unlimited", "marketPrice": null}
            ]})
            .to_string(),
        )
        .expect(2)
        .create_async()
        .await;
    let adapter = TcgplayerAdapter::new(
        http(),
        Some(TcgplayerCredentials {
            client_id: String::from("id"),
            client_secret: String::from("secret"),
        }),
        Arc::new(TokenCache::new()),
    )
    .with_base_url(server.url());
    let card = CardIdentity::manual(Game::Yugioh).with_name("Dark Magician");

    // When: the card is priced twice
    let first = adapter.query(&card).await;
    let second = adapter.query(&card).await;

    // Then: one token served both lookups
    token.assert_async().await;
    catalog.assert_async().await;
    pricing.assert_async().await;
    assert!(first.found && second.found);
    assert_eq!(first.set.as_deref(), Some("yugioh-legend-of-blue-eyes"));
    assert_eq!(first.url.as_deref(), Some("https://www.tcgplayer.com/product/4521"));
    let prices = first.prices.as_ref().expect("prices");
    assert_eq!(prices.get("1st edition").and_then(|point| point.market), Some(64.0));
    assert!(!prices.contains_key("unlimited"));
}

#[tokio::test]
async fn justtcg_sends_its_key_as_a_bearer_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/cards")
        .match_query(Matcher::UrlEncoded("search".into(), "Black Lotus".into()))
        .match_header("authorization", "Bearer jt-key")
        .with_status(200)
        .with_body(
            json!({"data": [{
                "name": "Black Lotus",
                "set": "Alpha",
                "variants": [{"condition": "Near Mint", "price": 30000.0}]
            }]})
            .to_string(),
        )
        .create_async()
        .await;
    let adapter =
        JustTcgAdapter::new(http(), Some(String::from("jt-key"))).with_base_url(server.url());

    let card = CardIdentity::manual(Game::Other).with_name("Black Lotus");
    let result = adapter.query(&card).await;

    mock.assert_async().await;
    assert!(result.found);
    assert_eq!(result.headline_price(), Some(30000.0));
    assert_eq!(result.details.get("condition").map(String::as_str), Some("Near Mint"));
}

#[tokio::test]
async fn gemini_recognizes_cards_from_a_downloaded_image() {
    // Given: an image host and a model that sees one card
    let mut server = Server::new_async().await;
    let image = server
        .mock("GET", "/uploads/pull.png")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body(vec![0x89, b'P', b'N', b'G'])
        .create_async()
        .await;
    let model_text = "```json\n[{\"game\": \"onepiece\", \"name_en\": \"Nami\", \"card_number\": \"OP01-016\", \"confidence\": \"high\"}]\n```";
    let model = server
        .mock("POST", "/models/gemini-2.5-flash-lite:generateContent")
        .match_header("x-goog-api-key", "g-key")
        .match_body(Matcher::Regex(String::from("\"mime_type\":\"image/png\"")))
        .with_status(200)
        .with_body(
            json!({"candidates": [{"content": {"parts": [{"text": model_text}]}}]}).to_string(),
        )
        .create_async()
        .await;
    let recognizer = GeminiRecognizer::new(http(), "g-key").with_base_url(server.url());

    // When: the screenshot is recognized
    let image_url = format!("{}/uploads/pull.png", server.url());
    let recognition = recognizer.recognize(&image_url).await.expect("recognition");

    // Then: the fenced JSON reply becomes one card
    image.assert_async().await;
    model.assert_async().await;
    let Recognition::Cards(cards) = recognition else {
        panic!("expected cards");
    };
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].game, Game::Onepiece);
    assert_eq!(cards[0].card_number.as_deref(), Some("OP01-016"));
}

#[tokio::test]
async fn gemini_rate_limits_are_reported_as_quota() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/uploads/pull.jpg")
        .with_status(200)
        .with_body(vec![0xff, 0xd8])
        .create_async()
        .await;
    server
        .mock("POST", Matcher::Regex(String::from(":generateContent$")))
        .with_status(429)
        .with_body(
            json!({"error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}})
                .to_string(),
        )
        .create_async()
        .await;
    let recognizer = GeminiRecognizer::new(http(), "g-key").with_base_url(server.url());

    let image_url = format!("{}/uploads/pull.jpg", server.url());
    let recognition = recognizer.recognize(&image_url).await;

    assert_eq!(recognition, Ok(Recognition::QuotaExceeded));
}

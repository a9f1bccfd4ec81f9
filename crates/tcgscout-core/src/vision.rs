//! Card recognition from screenshots.
//!
//! [`CardRecognizer`] is the seam the command service depends on;
//! [`GeminiRecognizer`] implements it on top of the Gemini
//! `generateContent` endpoint.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::DEFAULT_GEMINI_MODEL;
use crate::domain::CardIdentity;
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::VisionError;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const IMAGE_TIMEOUT_MS: u64 = 15_000;
const RECOGNITION_TIMEOUT_MS: u64 = 60_000;

const IDENTIFY_PROMPT: &str = r#"You are an expert trading card game card identifier. Look closely at the card(s) in the image.

Read these fields from each card:
1. game: "pokemon", "onepiece", "yugioh" or "other"
2. name_en: the full card name from the title area
3. name_jp: the Japanese name printed on the card
4. name_cn: the Chinese name (translated)
5. card_number: the printed card number, character by character (e.g. OP10-005, OP03-051, 045/264)
6. rarity: the rarity mark (e.g. SEC, SR, SSR, L, UC, C)
7. set_name: the set name from the card's small print
8. ocr_raw: the key text on the card (name, number, rarity only, at most 30 characters)
9. confidence: "high", "medium" or "low"

Then add an analysis from your own knowledge:
10. description: a short summary of the card's effect (at most 100 characters)
11. collectible_value: one of "Collector's gem", "High collectible value", "Medium collectible value", "Common card", "Basic card"
12. market_popularity: one of "Very hot", "Hot", "Average", "Niche"
13. competitive_usage: one of "Staple", "Occasional", "Rarely played", "Casual"
14. highlights: one or two selling points (at most 50 characters)
15. release_date: release date as YYYY-MM-DD when known
16. related_cards: 1-3 related popular or valuable cards, each {"name", "reason"}

Accuracy rules:
- If card_number or set_name cannot be read clearly, use null.
- Prefer null over a wrong value.
- related_cards must contain at least one card.

Reply with a JSON array of card objects and nothing else."#;

/// Outcome of one recognition call.
#[derive(Debug, Clone, PartialEq)]
pub enum Recognition {
    Cards(Vec<CardIdentity>),
    /// The model's quota is exhausted; no retry within this request.
    QuotaExceeded,
}

pub type RecognizeFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Recognition, VisionError>> + Send + 'a>>;

pub trait CardRecognizer: Send + Sync {
    fn recognize<'a>(&'a self, image_url: &'a str) -> RecognizeFuture<'a>;
}

#[derive(Clone)]
pub struct GeminiRecognizer {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiRecognizer {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            model: String::from(DEFAULT_GEMINI_MODEL),
            base_url: String::from(GEMINI_BASE_URL),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn download(&self, image_url: &str) -> Result<Vec<u8>, VisionError> {
        let response = self
            .http_client
            .execute(HttpRequest::get(image_url).with_timeout_ms(IMAGE_TIMEOUT_MS))
            .await
            .map_err(|error| VisionError::ImageDownload {
                message: error.to_string(),
            })?;
        if !response.is_success() {
            return Err(VisionError::ImageDownload {
                message: format!("status {}", response.status),
            });
        }
        Ok(response.body)
    }

    async fn identify(&self, image_url: &str) -> Result<Recognition, VisionError> {
        let image = self.download(image_url).await?;
        debug!(bytes = image.len(), "card image downloaded");

        let body = json!({
            "contents": [{
                "parts": [
                    {"text": IDENTIFY_PROMPT},
                    {"inline_data": {"mime_type": mime_type(image_url), "data": STANDARD.encode(&image)}}
                ]
            }],
            "generationConfig": {
                "temperature": 0.1,
                "maxOutputTokens": 4000,
                "responseMimeType": "application/json"
            }
        });
        let request = HttpRequest::post(format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        ))
        .with_auth(&HttpAuth::Header {
            name: String::from("x-goog-api-key"),
            value: self.api_key.clone(),
        })
        .with_json_body(&body)
        .with_timeout_ms(RECOGNITION_TIMEOUT_MS);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| VisionError::Transport {
                message: error.to_string(),
            })?;
        debug!(status = response.status, model = %self.model, "recognition response");

        let reply = match response.json() {
            Ok(reply) => reply,
            Err(_) if response.status == 429 => return Ok(Recognition::QuotaExceeded),
            Err(error) if response.is_success() => {
                return Err(VisionError::Malformed {
                    message: error.to_string(),
                })
            }
            Err(_) => {
                return Err(VisionError::UpstreamStatus {
                    status: response.status,
                    message: response.text(),
                })
            }
        };

        if response.status == 429 || reply.pointer("/error/code").and_then(Value::as_u64) == Some(429)
        {
            warn!(model = %self.model, "recognition quota exceeded");
            return Ok(Recognition::QuotaExceeded);
        }
        if !response.is_success() {
            let message = reply
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("no error message")
                .to_owned();
            return Err(VisionError::UpstreamStatus {
                status: response.status,
                message,
            });
        }

        let text = reply
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .unwrap_or("[]");
        Ok(Recognition::Cards(parse_cards(text)))
    }
}

impl CardRecognizer for GeminiRecognizer {
    fn recognize<'a>(&'a self, image_url: &'a str) -> RecognizeFuture<'a> {
        Box::pin(self.identify(image_url))
    }
}

fn mime_type(image_url: &str) -> &'static str {
    if image_url.contains(".png") {
        "image/png"
    } else {
        "image/jpeg"
    }
}

/// Reads the model's reply text into card identities.
///
/// Accepts a bare array, an object with a `cards` array, or a single card
/// object carrying `game`. Markdown code fences are stripped first. Anything
/// else yields no cards.
pub fn parse_cards(text: &str) -> Vec<CardIdentity> {
    let cleaned = text.replace("```json", "").replace("```", "");
    let parsed = match serde_json::from_str::<Value>(cleaned.trim()) {
        Ok(parsed) => parsed,
        Err(error) => {
            warn!(%error, "recognition reply is not JSON");
            return Vec::new();
        }
    };

    let items = match parsed {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("cards") {
            Some(Value::Array(items)) => items,
            _ if object.contains_key("game") => vec![Value::Object(object)],
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| match serde_json::from_value::<CardIdentity>(item) {
            Ok(card) => Some(card),
            Err(error) => {
                warn!(%error, "skipping unreadable card in recognition reply");
                None
            }
        })
        .collect()
}

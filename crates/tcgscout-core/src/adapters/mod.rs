//! Price provider adapters.
//!
//! | Adapter | Provider | Auth | Lookup key |
//! |---------|----------|------|------------|
//! | [`OptcgAdapter`] | optcgapi.com | none | card number |
//! | [`PokemonTcgAdapter`] | pokemontcg.io | none | card id, else name |
//! | [`TcgplayerAdapter`] | TCGPlayer | client-credentials bearer token | name |
//! | [`JustTcgAdapter`] | JustTCG | API key bearer | name |

mod justtcg;
mod optcg;
mod pokemon_tcg;
mod tcgplayer;

pub use justtcg::{JustTcgAdapter, JUSTTCG_BASE_URL};
pub use optcg::{OptcgAdapter, OPTCG_BASE_URL};
pub use pokemon_tcg::{PokemonTcgAdapter, POKEMON_TCG_BASE_URL};
pub use tcgplayer::{TcgplayerAdapter, TcgplayerCredentials, TokenCache, TCGPLAYER_BASE_URL};

use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::PriceResult;
use crate::http_client::{HttpClient, HttpRequest};
use crate::price_source::{SourceError, SourceErrorKind};
use crate::ProviderId;

/// Executes `request` and decodes a JSON body. A 404 is a clean miss.
pub(crate) async fn fetch_json(
    http: &dyn HttpClient,
    provider: ProviderId,
    request: HttpRequest,
) -> Result<Option<Value>, SourceError> {
    debug!(source = %provider, url = %request.url, "querying provider");
    let response = http
        .execute(request)
        .await
        .map_err(|error| SourceError::from_transport(provider, &error))?;
    debug!(source = %provider, status = response.status, "provider responded");

    if response.status == 404 {
        return Ok(None);
    }
    if response.status == 401 {
        return Err(SourceError::unauthorized(provider));
    }
    if !response.is_success() {
        return Err(SourceError::upstream_status(provider, response.status));
    }

    response
        .json()
        .map(Some)
        .map_err(|error| SourceError::malformed(format!("{provider} returned invalid JSON: {error}")))
}

/// Folds an adapter outcome into its public answer, logging failures.
pub(crate) fn settle(provider: ProviderId, outcome: Result<PriceResult, SourceError>) -> PriceResult {
    match outcome {
        Ok(result) => result,
        Err(error) => {
            match error.kind() {
                SourceErrorKind::NotConfigured | SourceErrorKind::InvalidRequest => {
                    debug!(source = %provider, code = error.code(), "lookup skipped: {}", error.message());
                }
                _ => {
                    warn!(source = %provider, code = error.code(), "lookup failed: {}", error.message());
                }
            }
            error.into_result()
        }
    }
}

/// First element of an array body, or the body itself when it is an object.
pub(crate) fn first_record(body: &Value) -> Option<&Value> {
    match body {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
    .filter(|record| record.is_object())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_record_accepts_arrays_and_objects() {
        assert_eq!(first_record(&json!([{"a": 1}, {"a": 2}])), Some(&json!({"a": 1})));
        assert_eq!(first_record(&json!({"a": 3})), Some(&json!({"a": 3})));
        assert_eq!(first_record(&json!([])), None);
        assert_eq!(first_record(&json!("nope")), None);
    }
}

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tcgscout_core::{
    CardIdentity, Game, HttpClient, HttpError, HttpRequest, HttpResponse, JustTcgAdapter,
    OptcgAdapter, PokemonTcgAdapter, PriceSource, ProviderId, TcgplayerAdapter,
    TcgplayerCredentials, TokenCache,
};

/// Answers every request with the same canned outcome.
struct CannedHttpClient {
    outcome: Result<HttpResponse, HttpError>,
    calls: AtomicUsize,
}

impl CannedHttpClient {
    fn new(outcome: Result<HttpResponse, HttpError>) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HttpClient for CannedHttpClient {
    fn execute<'a>(
        &'a self,
        _request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self.outcome.clone();
        Box::pin(async move { outcome })
    }
}

#[derive(Clone)]
struct SourceCase {
    id: ProviderId,
    source: Arc<dyn PriceSource>,
}

fn source_cases(http: Arc<CannedHttpClient>) -> Vec<SourceCase> {
    let credentials = TcgplayerCredentials {
        client_id: String::from("client"),
        client_secret: String::from("secret"),
    };

    vec![
        SourceCase {
            id: ProviderId::Optcg,
            source: Arc::new(OptcgAdapter::new(http.clone())),
        },
        SourceCase {
            id: ProviderId::PokemonTcg,
            source: Arc::new(PokemonTcgAdapter::new(http.clone())),
        },
        SourceCase {
            id: ProviderId::Tcgplayer,
            source: Arc::new(TcgplayerAdapter::new(
                http.clone(),
                Some(credentials),
                Arc::new(TokenCache::new()),
            )),
        },
        SourceCase {
            id: ProviderId::Justtcg,
            source: Arc::new(JustTcgAdapter::new(http, Some(String::from("key")))),
        },
    ]
}

fn any_card() -> CardIdentity {
    CardIdentity::manual(Game::Pokemon)
        .with_name("Charizard")
        .with_number("sv3-125")
}

#[test]
fn every_source_reports_its_own_id() {
    let http = CannedHttpClient::new(Ok(HttpResponse::ok_json("{}")));

    for case in source_cases(http) {
        assert_eq!(case.source.id(), case.id);
        assert!(case.source.is_configured(), "source '{}'", case.id);
    }
}

#[tokio::test]
async fn transport_failures_become_not_found_with_error() {
    let http = CannedHttpClient::new(Err(HttpError::new("connection refused")));

    for case in source_cases(http) {
        let result = case.source.query(&any_card()).await;

        assert!(!result.found, "source '{}': found", case.id);
        assert!(result.error.is_some(), "source '{}': error set", case.id);
        assert!(result.prices.is_none(), "source '{}': no prices", case.id);
    }
}

#[tokio::test]
async fn server_errors_become_not_found_with_error() {
    let http = CannedHttpClient::new(Ok(HttpResponse::new(503, "unavailable")));

    for case in source_cases(http) {
        let result = case.source.query(&any_card()).await;

        assert!(!result.found, "source '{}': found", case.id);
        let error = result
            .error
            .unwrap_or_else(|| panic!("source '{}': error missing", case.id));
        assert!(error.contains("503"), "source '{}': {error}", case.id);
    }
}

#[tokio::test]
async fn invalid_json_is_reported_not_raised() {
    let http = CannedHttpClient::new(Ok(HttpResponse::new(200, "<html>oops</html>")));

    for case in source_cases(http) {
        let result = case.source.query(&any_card()).await;

        assert!(!result.found, "source '{}': found", case.id);
        assert!(result.error.is_some(), "source '{}': error set", case.id);
    }
}

#[tokio::test]
async fn missing_records_are_clean_misses() {
    let http = CannedHttpClient::new(Ok(HttpResponse::new(404, "")));

    for case in source_cases(http) {
        let result = case.source.query(&any_card()).await;

        assert!(!result.found, "source '{}': found", case.id);
        // A token 404 is a failure for tcgplayer; every other 404 is a miss.
        if case.id != ProviderId::Tcgplayer {
            assert!(result.error.is_none(), "source '{}': error", case.id);
        }
    }
}

#[tokio::test]
async fn sources_without_credentials_make_no_requests() {
    let http = CannedHttpClient::new(Ok(HttpResponse::ok_json("{}")));
    let unconfigured: Vec<Arc<dyn PriceSource>> = vec![
        Arc::new(TcgplayerAdapter::new(
            http.clone(),
            None,
            Arc::new(TokenCache::new()),
        )),
        Arc::new(JustTcgAdapter::new(http.clone(), None)),
    ];

    for source in unconfigured {
        assert!(!source.is_configured());
        let result = source.query(&any_card()).await;
        assert!(!result.found);
        assert!(result.error.is_none());
    }
    assert_eq!(http.calls(), 0);
}

#[tokio::test]
async fn cards_without_lookup_keys_are_not_sent_upstream() {
    let http = CannedHttpClient::new(Ok(HttpResponse::ok_json("{}")));
    let empty = CardIdentity::manual(Game::Other);

    for case in source_cases(http.clone()) {
        let result = case.source.query(&empty).await;
        assert!(!result.found, "source '{}': found", case.id);
    }
    assert_eq!(http.calls(), 0);
}

//! Scripted transport shared by the unit tests of this crate.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use serde_json::Value;

use crate::http_client::{HttpClient, HttpError, HttpRequest, HttpResponse};

struct Route {
    fragment: String,
    response: Result<HttpResponse, HttpError>,
}

/// Answers requests by the first route whose fragment occurs in the URL and
/// records every request it sees.
#[derive(Default)]
pub(crate) struct ScriptedHttpClient {
    routes: Vec<Route>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(mut self, fragment: &str, response: Result<HttpResponse, HttpError>) -> Self {
        self.routes.push(Route {
            fragment: fragment.to_owned(),
            response,
        });
        self
    }

    pub(crate) fn on_json(self, fragment: &str, status: u16, body: Value) -> Self {
        self.on(fragment, Ok(HttpResponse::new(status, body.to_string())))
    }

    pub(crate) fn recorded_requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.recorded_requests().len()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let response = self
            .routes
            .iter()
            .find(|route| request.url.contains(&route.fragment))
            .map(|route| route.response.clone())
            .unwrap_or_else(|| Err(HttpError::new(format!("no scripted response for {}", request.url))));
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .push(request);

        Box::pin(async move { response })
    }
}

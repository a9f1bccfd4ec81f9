//! Price source trait and adapter error types.
//!
//! Every provider implements [`PriceSource`]. The contract is deliberately
//! infallible: a source answers with a [`PriceResult`] whatever happens
//! upstream, and failures show up as `found == false` (with `error` set when
//! the provider could not be asked at all).
//!
//! Inside an adapter, fallible steps return [`SourceError`] and are folded into
//! a result once, at the adapter boundary, through [`SourceError::into_result`].

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::domain::{CardIdentity, PriceResult};
use crate::http_client::HttpError;
use crate::ProviderId;

/// Boxed future returned by [`PriceSource::query`].
pub type QueryFuture<'a> = Pin<Box<dyn Future<Output = PriceResult> + Send + 'a>>;

/// Price provider contract.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; one instance serves every
/// concurrent lookup.
pub trait PriceSource: Send + Sync {
    /// Returns the unique provider identifier.
    fn id(&self) -> ProviderId;

    /// Whether the credentials this source needs are present.
    fn is_configured(&self) -> bool {
        true
    }

    /// Looks up prices for `card`. Never panics on missing card fields and
    /// never returns an error; see the module docs.
    fn query<'a>(&'a self, card: &'a CardIdentity) -> QueryFuture<'a>;
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    NotConfigured,
    InvalidRequest,
    Unavailable,
    Timeout,
    Unauthorized,
    UpstreamStatus,
    Malformed,
}

/// Structured error used inside adapters before it is folded into a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn not_configured(provider: ProviderId) -> Self {
        Self {
            kind: SourceErrorKind::NotConfigured,
            message: format!("source '{provider}' has no credentials configured"),
            retryable: false,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Timeout,
            message: message.into(),
            retryable: true,
        }
    }

    /// The provider rejected the credentials (HTTP 401).
    pub fn unauthorized(provider: ProviderId) -> Self {
        Self {
            kind: SourceErrorKind::Unauthorized,
            message: format!("{provider} rejected the credentials (status 401)"),
            retryable: true,
        }
    }

    pub fn upstream_status(provider: ProviderId, status: u16) -> Self {
        Self {
            kind: SourceErrorKind::UpstreamStatus,
            message: format!("{provider} upstream returned status {status}"),
            retryable: status >= 500 || status == 429,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Malformed,
            message: message.into(),
            retryable: false,
        }
    }

    /// Classifies a transport failure for `provider`.
    pub fn from_transport(provider: ProviderId, error: &HttpError) -> Self {
        let message = format!("{provider} transport error: {}", error.message());
        if error.timed_out() {
            Self::timeout(message)
        } else {
            Self::unavailable(message)
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::NotConfigured => "source.not_configured",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::Timeout => "source.timeout",
            SourceErrorKind::Unauthorized => "source.unauthorized",
            SourceErrorKind::UpstreamStatus => "source.upstream_status",
            SourceErrorKind::Malformed => "source.malformed",
        }
    }

    /// Folds the error into the adapter's public answer.
    ///
    /// A missing credential or a request that cannot be built is a plain miss;
    /// anything that reached (or tried to reach) the provider carries its
    /// message so callers can tell "unavailable" apart from "not found".
    pub fn into_result(self) -> PriceResult {
        match self.kind {
            SourceErrorKind::NotConfigured | SourceErrorKind::InvalidRequest => {
                PriceResult::not_found()
            }
            _ => PriceResult::not_found_with_error(self.to_string()),
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_timeouts_are_classified_separately() {
        let timeout = SourceError::from_transport(
            ProviderId::PokemonTcg,
            &HttpError::timeout("deadline elapsed"),
        );
        let refused =
            SourceError::from_transport(ProviderId::PokemonTcg, &HttpError::new("refused"));

        assert_eq!(timeout.kind(), SourceErrorKind::Timeout);
        assert_eq!(timeout.code(), "source.timeout");
        assert_eq!(refused.kind(), SourceErrorKind::Unavailable);
        assert!(refused.retryable());
    }

    #[test]
    fn unconfigured_source_folds_into_a_clean_miss() {
        let result = SourceError::not_configured(ProviderId::Justtcg).into_result();
        assert!(!result.found);
        assert_eq!(result.error, None);
    }

    #[test]
    fn upstream_failure_keeps_its_message() {
        let result = SourceError::upstream_status(ProviderId::Optcg, 503).into_result();
        assert!(!result.found);
        assert!(result.prices.is_none());
        assert_eq!(
            result.error.as_deref(),
            Some("optcg upstream returned status 503 (source.upstream_status)")
        );
    }
}

//! Failure taxonomy shared by every geocoder.

use thiserror::Error;

use crate::ProviderKind;

/// Coarse classification of a [`GeocodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Bad or empty input, caught before any network call.
    Validation,
    /// Connection, DNS, TLS, timeout or non-200 status.
    Transport,
    /// Malformed, empty or unexpectedly shaped payload.
    Parse,
    /// Well-formed response without a usable location.
    NotFound,
    /// The caller's cancellation signal fired.
    Cancelled,
    /// The provider reported that a quota was exceeded.
    RateLimit,
    /// The provider rejected the request with its own status.
    Provider,
    /// Every provider tried by an orchestrator failed.
    Exhausted,
}

impl FailureKind {
    /// Return the kind as a `snake_case` `&str`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Transport => "transport",
            Self::Parse => "parse",
            Self::NotFound => "not_found",
            Self::Cancelled => "cancelled",
            Self::RateLimit => "rate_limit",
            Self::Provider => "provider",
            Self::Exhausted => "exhausted",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure variant of [`crate::GeocodeResult`].
///
/// URLs embedded in the variants are always redacted: API keys never appear
/// in error messages.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum GeocodeError {
    /// The request was rejected before any network call.
    #[error("invalid geocode request: {reason}")]
    Validation {
        /// Human-readable reason.
        reason: String,
    },
    /// The provider answered with a non-200 HTTP status.
    #[error("request to {url} failed with status {status}")]
    Http {
        /// Redacted request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// The request could not be delivered.
    #[error("network error contacting {url}: {message}")]
    Network {
        /// Redacted request URL.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The request did not complete in time.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Redacted request URL.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The payload could not be interpreted.
    #[error("failed to parse provider response: {message}")]
    Parse {
        /// Description of the shape mismatch.
        message: String,
    },
    /// The provider found nothing, or returned the `(0, 0)` sentinel.
    #[error("no location found: {reason}")]
    NotFound {
        /// Human-readable reason.
        reason: String,
    },
    /// The caller cancelled the operation.
    #[error("cancellation requested")]
    Cancelled,
    /// The provider reported an exceeded quota.
    #[error("provider rate limit exceeded: {message}")]
    RateLimited {
        /// HTTP status, when the limit was signalled over HTTP.
        status: Option<u16>,
        /// Provider message.
        message: String,
    },
    /// The provider rejected the request with its own status code.
    #[error("provider returned status {code}: {message}")]
    Service {
        /// Provider status code, e.g. `REQUEST_DENIED`.
        code: String,
        /// Provider message, possibly empty.
        message: String,
    },
    /// Every provider tried by an orchestrator failed.
    #[error("all providers failed: {}", summarise(.failures))]
    Exhausted {
        /// Per-provider failures in the order they were tried.
        failures: Vec<ProviderFailure>,
    },
}

/// One provider's failure inside [`GeocodeError::Exhausted`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderFailure {
    /// Provider that failed.
    pub provider: ProviderKind,
    /// Why it failed.
    pub error: GeocodeError,
}

fn summarise(failures: &[ProviderFailure]) -> String {
    if failures.is_empty() {
        return "no providers were configured".to_owned();
    }
    failures
        .iter()
        .map(|failure| format!("{}: {}", failure.provider, failure.error))
        .collect::<Vec<_>>()
        .join("; ")
}

impl GeocodeError {
    /// Shorthand for [`GeocodeError::Validation`].
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`GeocodeError::Parse`].
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Shorthand for [`GeocodeError::NotFound`].
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound {
            reason: reason.into(),
        }
    }

    /// Classify the error into the failure taxonomy.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation { .. } => FailureKind::Validation,
            Self::Http { .. } | Self::Network { .. } | Self::Timeout { .. } => {
                FailureKind::Transport
            }
            Self::Parse { .. } => FailureKind::Parse,
            Self::NotFound { .. } => FailureKind::NotFound,
            Self::Cancelled => FailureKind::Cancelled,
            Self::RateLimited { .. } => FailureKind::RateLimit,
            Self::Service { .. } => FailureKind::Provider,
            Self::Exhausted { .. } => FailureKind::Exhausted,
        }
    }

    /// HTTP-equivalent status code, where one is known.
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Validation { .. } => Some(400),
            Self::Http { status, .. } => Some(*status),
            Self::RateLimited { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether the error reports a cancelled operation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(GeocodeError::validation("address required"), FailureKind::Validation)]
    #[case(GeocodeError::Http { url: "u".into(), status: 500 }, FailureKind::Transport)]
    #[case(GeocodeError::Timeout { url: "u".into(), timeout_secs: 3 }, FailureKind::Transport)]
    #[case(GeocodeError::parse("bad json"), FailureKind::Parse)]
    #[case(GeocodeError::not_found("ZERO_RESULTS"), FailureKind::NotFound)]
    #[case(GeocodeError::Cancelled, FailureKind::Cancelled)]
    #[case(
        GeocodeError::RateLimited { status: Some(429), message: String::new() },
        FailureKind::RateLimit
    )]
    #[case(
        GeocodeError::Service { code: "REQUEST_DENIED".into(), message: String::new() },
        FailureKind::Provider
    )]
    fn kinds_follow_taxonomy(#[case] error: GeocodeError, #[case] expected: FailureKind) {
        assert_eq!(error.kind(), expected);
    }

    #[test]
    fn http_status_is_exposed() {
        let error = GeocodeError::Http {
            url: "https://example.org".into(),
            status: 503,
        };
        assert_eq!(error.http_status(), Some(503));
        assert_eq!(GeocodeError::validation("x").http_status(), Some(400));
        assert_eq!(GeocodeError::Cancelled.http_status(), None);
    }

    #[test]
    fn exhausted_message_lists_each_provider() {
        let error = GeocodeError::Exhausted {
            failures: vec![
                ProviderFailure {
                    provider: ProviderKind::Esri,
                    error: GeocodeError::not_found("location result was null"),
                },
                ProviderFailure {
                    provider: ProviderKind::Google,
                    error: GeocodeError::Cancelled,
                },
            ],
        };
        let message = error.to_string();
        assert!(message.contains("esri: no location found: location result was null"));
        assert!(message.contains("google: cancellation requested"));
        assert_eq!(error.kind(), FailureKind::Exhausted);
    }
}

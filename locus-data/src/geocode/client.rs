//! The shared provider pipeline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use locus_core::{
    Coordinate, GeocodeError, GeocodeRequest, GeocodeResult, GeocodeSuccess, NormalisedAddress,
    ProviderKind,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::Geocoder;
use super::providers::{ParseOutcome, ParsedLocation, ProviderSpec, QueryContext, spec_for};
use crate::config::{DEFAULT_MAX_TRIES, DEFAULT_USER_AGENT, ProviderSettings};
use crate::throttle::RateLimiter;
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};

/// HTTP status providers use to signal an exceeded quota.
const TOO_MANY_REQUESTS: u16 = 429;

/// Raised when a client is requested for a provider without a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no geocoding client exists for provider {0}")]
pub struct UnsupportedProvider(pub ProviderKind);

/// Geocoder for one provider.
///
/// Every provider runs the same steps: normalise the address, resolve the
/// credential, wait for the rate limiter, send, classify the status, parse,
/// and reject the `(0, 0)` sentinel. Clients are cheap to clone; share the
/// transport and limiter between clones to share connections and throttling.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use locus_core::GeocodeRequest;
/// use locus_data::transport::ReqwestTransport;
/// use locus_data::{Geocoder, ProviderClient};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = Arc::new(ReqwestTransport::new()?);
/// let client = ProviderClient::osm(transport);
/// let request = GeocodeRequest::new("10 Downing Street, London");
/// let success = client.geocode(&request, &CancellationToken::new()).await?;
/// println!("{}", success.coordinate);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ProviderClient {
    spec: &'static ProviderSpec,
    transport: Arc<dyn Transport>,
    settings: ProviderSettings,
    limiter: Option<Arc<RateLimiter>>,
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("provider", &self.spec.kind)
            .field("base_url", &self.base_url())
            .field("api_key", &self.settings.api_key.as_ref().map(|_| "<redacted>"))
            .field("limiter", &self.limiter)
            .field("transport", &"<dyn Transport>")
            .finish()
    }
}

impl ProviderClient {
    /// Create an unthrottled client for `provider` with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedProvider`] for [`ProviderKind::Unknown`].
    pub fn new(
        provider: ProviderKind,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, UnsupportedProvider> {
        spec_for(provider)
            .map(|spec| Self::from_spec(spec, transport))
            .ok_or(UnsupportedProvider(provider))
    }

    /// Create a client from an explicit strategy bundle.
    #[must_use]
    pub fn from_spec(spec: &'static ProviderSpec, transport: Arc<dyn Transport>) -> Self {
        Self {
            spec,
            transport,
            settings: ProviderSettings::default(),
            limiter: None,
        }
    }

    /// Esri ArcGIS World Geocoder client.
    #[must_use]
    pub fn esri(transport: Arc<dyn Transport>) -> Self {
        Self::from_spec(&super::providers::esri::SPEC, transport)
    }

    /// Google Geocoding API client.
    #[must_use]
    pub fn google(transport: Arc<dyn Transport>) -> Self {
        Self::from_spec(&super::providers::google::SPEC, transport)
    }

    /// MapQuest Geocoding API client.
    #[must_use]
    pub fn mapquest(transport: Arc<dyn Transport>) -> Self {
        Self::from_spec(&super::providers::mapquest::SPEC, transport)
    }

    /// Geoapify client; requires an API key.
    #[must_use]
    pub fn geoapify(transport: Arc<dyn Transport>) -> Self {
        Self::from_spec(&super::providers::geoapify::SPEC, transport)
    }

    /// OSM Nominatim client.
    #[must_use]
    pub fn osm(transport: Arc<dyn Transport>) -> Self {
        Self::from_spec(&super::providers::osm::SPEC, transport)
    }

    /// Geocodio client.
    #[must_use]
    pub fn geocodio(transport: Arc<dyn Transport>) -> Self {
        Self::from_spec(&super::providers::geocodio::SPEC, transport)
    }

    /// Replace the provider settings.
    #[must_use]
    pub fn with_settings(mut self, settings: ProviderSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Throttle every request through `limiter`.
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// The provider this client speaks for.
    #[must_use]
    pub fn provider(&self) -> ProviderKind {
        self.spec.kind
    }

    /// Settings in effect.
    #[must_use]
    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    /// Geocode without waiting for the rate limiter.
    ///
    /// Intended for callers that enforce spacing themselves; the provider's
    /// usage policy still applies.
    pub async fn geocode_unthrottled(
        &self,
        request: &GeocodeRequest,
        cancel: &CancellationToken,
    ) -> GeocodeResult {
        self.run(request, cancel, false).await
    }

    fn base_url(&self) -> &str {
        self.settings
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(self.spec.default_base_url)
    }

    fn api_key<'a>(&'a self, request: &'a GeocodeRequest) -> Option<&'a str> {
        [request.api_key.as_deref(), self.settings.api_key.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|key| !key.is_empty())
    }

    fn user_agent(&self) -> &str {
        self.settings
            .user_agent
            .as_deref()
            .map(str::trim)
            .filter(|agent| !agent.is_empty())
            .unwrap_or(DEFAULT_USER_AGENT)
    }

    fn max_tries(&self, request: &GeocodeRequest) -> u32 {
        if !self.spec.retry.bounded {
            return 1;
        }
        request
            .max_tries
            .or(self.settings.max_tries)
            .unwrap_or(DEFAULT_MAX_TRIES)
            .max(1)
    }

    async fn run(
        &self,
        request: &GeocodeRequest,
        cancel: &CancellationToken,
        throttled: bool,
    ) -> GeocodeResult {
        let provider = self.provider();
        let outcome = self.attempt_all(request, cancel, throttled).await;
        match &outcome {
            Ok(success) => log::info!(
                "{provider} geocoded {:?} to {}",
                request.address.trim(),
                success.coordinate
            ),
            Err(GeocodeError::Cancelled) => {
                log::debug!("{provider} geocode of {:?} cancelled", request.address.trim());
            }
            Err(error) => log::error!(
                "{provider} failed to geocode {:?}: {error}",
                request.address.trim()
            ),
        }
        outcome
    }

    async fn attempt_all(
        &self,
        request: &GeocodeRequest,
        cancel: &CancellationToken,
        throttled: bool,
    ) -> GeocodeResult {
        let address = NormalisedAddress::parse(&request.address)?;
        if address.was_truncated() {
            log::warn!(
                "{} address truncated from {} characters",
                self.provider(),
                address.original_chars()
            );
        }
        let context = QueryContext {
            address: address.as_str(),
            api_key: self.api_key(request),
            request,
        };
        let http_request = self.build_request(&context)?;

        let max_tries = self.max_tries(request);
        let mut attempt = 1;
        loop {
            match self.attempt(&http_request, &context, cancel, throttled).await {
                Attempt::Done(outcome) => return outcome,
                Attempt::Retry(error) if attempt < max_tries => {
                    log::warn!(
                        "{} attempt {attempt}/{max_tries} failed, retrying: {error}",
                        self.provider()
                    );
                    self.back_off(attempt, cancel).await?;
                    attempt += 1;
                }
                Attempt::Retry(error) => return Err(error),
            }
        }
    }

    fn build_request(&self, context: &QueryContext<'_>) -> Result<HttpRequest, GeocodeError> {
        if self.spec.requires_api_key && context.api_key.is_none() {
            return Err(GeocodeError::validation(format!(
                "{} requires an API key",
                self.provider()
            )));
        }
        let mut request = HttpRequest::get(self.base_url(), self.spec.path)
            .with_params((self.spec.build_query)(context));
        if self.spec.requires_user_agent {
            request = request.with_header("User-Agent", self.user_agent());
        }
        Ok(request)
    }

    async fn back_off(&self, attempt: u32, cancel: &CancellationToken) -> Result<(), GeocodeError> {
        let Some(step) = self.spec.retry.backoff_step else {
            return Ok(());
        };
        let delay = step.saturating_mul(attempt);
        if delay == Duration::ZERO {
            return Ok(());
        }
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(GeocodeError::Cancelled),
            () = tokio::time::sleep(delay) => Ok(()),
        }
    }

    async fn attempt(
        &self,
        request: &HttpRequest,
        context: &QueryContext<'_>,
        cancel: &CancellationToken,
        throttled: bool,
    ) -> Attempt {
        if cancel.is_cancelled() {
            return Attempt::Done(Err(GeocodeError::Cancelled));
        }
        if throttled
            && let Some(limiter) = &self.limiter
            && let Err(error) = limiter.acquire(cancel).await
        {
            return Attempt::Done(Err(error));
        }

        log::debug!("{} {request}", self.provider());
        let response = match self.transport.send(request, cancel).await {
            Ok(response) => response,
            Err(error) => {
                return Attempt::Done(Err(self.convert_transport_error(request, error, cancel)));
            }
        };
        self.classify(request, response, context)
    }

    /// Convert a transport failure, reporting cancellation whenever the
    /// caller's token has fired.
    fn convert_transport_error(
        &self,
        request: &HttpRequest,
        error: TransportError,
        cancel: &CancellationToken,
    ) -> GeocodeError {
        if cancel.is_cancelled() {
            return GeocodeError::Cancelled;
        }
        match error {
            TransportError::Cancelled => GeocodeError::Cancelled,
            TransportError::Network { message } => GeocodeError::Network {
                url: request.redacted_url(),
                message,
            },
            TransportError::Timeout { timeout_secs } => GeocodeError::Timeout {
                url: request.redacted_url(),
                timeout_secs,
            },
            TransportError::InvalidUrl { message } => {
                GeocodeError::validation(format!("invalid provider URL: {message}"))
            }
        }
    }

    fn classify(
        &self,
        request: &HttpRequest,
        response: HttpResponse,
        context: &QueryContext<'_>,
    ) -> Attempt {
        if response.status == TOO_MANY_REQUESTS {
            let error = GeocodeError::RateLimited {
                status: Some(TOO_MANY_REQUESTS),
                message: format!("{} answered 429 Too Many Requests", request.redacted_url()),
            };
            return if self.spec.retry.retry_on_too_many_requests {
                Attempt::Retry(error)
            } else {
                Attempt::Done(Err(error))
            };
        }
        if response.status != 200 {
            return Attempt::Done(Err(GeocodeError::Http {
                url: request.redacted_url(),
                status: response.status,
            }));
        }
        if response.body.trim().is_empty() {
            return Attempt::Done(Err(GeocodeError::parse("content was empty")));
        }

        match (self.spec.parse)(&response.body, context) {
            ParseOutcome::Located(location) => {
                Attempt::Done(self.success_from(location, response.body))
            }
            ParseOutcome::Retryable(error) => Attempt::Retry(error),
            ParseOutcome::Failed(error) => Attempt::Done(Err(error)),
        }
    }

    fn success_from(&self, location: ParsedLocation, raw_payload: String) -> GeocodeResult {
        let ParsedLocation {
            lat,
            lng,
            precision,
            details,
        } = location;
        let mut coordinate = Coordinate::new(lat, lng)
            .map_err(|err| GeocodeError::parse(err.to_string()))?
            .with_provider(self.provider());
        if coordinate.is_null_island() {
            return Err(GeocodeError::not_found(
                "provider returned the (0, 0) sentinel",
            ));
        }
        if let Some(precision) = precision {
            coordinate = coordinate.with_precision(precision);
        }
        let success = GeocodeSuccess::new(coordinate, raw_payload);
        Ok(match details {
            Some(details) => success.with_details(details),
            None => success,
        })
    }
}

/// Result of one request/response exchange.
enum Attempt {
    Done(GeocodeResult),
    Retry(GeocodeError),
}

#[async_trait]
impl Geocoder for ProviderClient {
    fn provider(&self) -> ProviderKind {
        self.spec.kind
    }

    async fn geocode(&self, request: &GeocodeRequest, cancel: &CancellationToken) -> GeocodeResult {
        self.run(request, cancel, true).await
    }
}

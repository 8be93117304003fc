//! Fallback and parallel composition of several geocoders.
//!
//! The fallback strategy asks providers one at a time in the caller's order
//! and stops at the first success. The parallel strategy asks them all at
//! once, returns the first success, and cancels the stragglers. Both report
//! [`GeocodeError::Exhausted`] with one entry per provider when nothing
//! succeeds.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{FuturesUnordered, StreamExt};
use locus_core::{GeocodeError, GeocodeRequest, GeocodeResult, ProviderFailure, ProviderKind};
use tokio_util::sync::CancellationToken;

use crate::config::GeocoderConfig;
use crate::geocode::{Geocoder, ProviderClient};
use crate::throttle::RateLimiterRegistry;
use crate::transport::Transport;

/// How an orchestrator combines providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// One provider at a time, in order.
    #[default]
    Fallback,
    /// All providers concurrently; first success wins.
    Parallel,
}

impl Strategy {
    /// Return the strategy as a lowercase `&str`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fallback => "fallback",
            Self::Parallel => "parallel",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fallback" | "sequential" => Ok(Self::Fallback),
            "parallel" | "race" => Ok(Self::Parallel),
            other => Err(format!("unknown strategy: {other}")),
        }
    }
}

/// A set of geocoders addressed by provider.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use locus_core::{GeocodeError, GeocodeRequest, ProviderKind};
/// use locus_data::GeocodeOrchestrator;
/// use locus_data::test_support::StubGeocoder;
/// use tokio_util::sync::CancellationToken;
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build()?.block_on(async {
/// let orchestrator = GeocodeOrchestrator::new()
///     .with_geocoder(Arc::new(StubGeocoder::failing(
///         ProviderKind::Esri,
///         GeocodeError::not_found("location result was null"),
///     )))
///     .with_geocoder(Arc::new(StubGeocoder::succeeding(ProviderKind::Osm, 51.5, -0.12)));
///
/// let success = orchestrator
///     .geocode_with_fallback(
///         &GeocodeRequest::new("London"),
///         &[ProviderKind::Esri, ProviderKind::Osm],
///         &CancellationToken::new(),
///     )
///     .await?;
/// assert_eq!(success.coordinate.provider(), ProviderKind::Osm);
/// # Ok::<(), GeocodeError>(())
/// # })?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Default)]
pub struct GeocodeOrchestrator {
    geocoders: Vec<Arc<dyn Geocoder>>,
}

impl std::fmt::Debug for GeocodeOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let providers: Vec<ProviderKind> = self.geocoders.iter().map(|g| g.provider()).collect();
        f.debug_struct("GeocodeOrchestrator")
            .field("providers", &providers)
            .finish()
    }
}

impl GeocodeOrchestrator {
    /// An orchestrator with no geocoders.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `geocoder`, replacing any earlier one for the same provider.
    #[must_use]
    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        let provider = geocoder.provider();
        self.geocoders.retain(|existing| existing.provider() != provider);
        self.geocoders.push(geocoder);
        self
    }

    /// One [`ProviderClient`] per provider, sharing `transport` and the
    /// limiters described by `config`.
    #[must_use]
    pub fn from_config(config: &GeocoderConfig, transport: Arc<dyn Transport>) -> Self {
        let limiters = RateLimiterRegistry::from_config(config);
        ProviderKind::ALL
            .into_iter()
            .filter_map(|provider| {
                let client = ProviderClient::new(provider, Arc::clone(&transport)).ok()?;
                let client = client.with_settings(config.settings(provider).clone());
                Some(match limiters.get(provider) {
                    Some(limiter) => client.with_rate_limiter(limiter),
                    None => client,
                })
            })
            .fold(Self::new(), |orchestrator, client| {
                orchestrator.with_geocoder(Arc::new(client))
            })
    }

    /// The geocoder registered for `provider`.
    #[must_use]
    pub fn geocoder(&self, provider: ProviderKind) -> Option<Arc<dyn Geocoder>> {
        self.geocoders
            .iter()
            .find(|geocoder| geocoder.provider() == provider)
            .cloned()
    }

    /// Providers with a registered geocoder, in registration order.
    #[must_use]
    pub fn providers(&self) -> Vec<ProviderKind> {
        self.geocoders.iter().map(|geocoder| geocoder.provider()).collect()
    }

    /// Try each provider in `order` until one succeeds.
    ///
    /// Providers with no registered geocoder are recorded as validation
    /// failures and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Cancelled`] if `cancel` fires, otherwise
    /// [`GeocodeError::Exhausted`] listing every provider's failure in order.
    pub async fn geocode_with_fallback(
        &self,
        request: &GeocodeRequest,
        order: &[ProviderKind],
        cancel: &CancellationToken,
    ) -> GeocodeResult {
        let mut failures = Vec::with_capacity(order.len());
        for &provider in order {
            if cancel.is_cancelled() {
                return Err(GeocodeError::Cancelled);
            }
            let outcome = match self.geocoder(provider) {
                Some(geocoder) => geocoder.geocode(request, cancel).await,
                None => Err(missing(provider)),
            };
            match outcome {
                Ok(success) => return Ok(success),
                Err(GeocodeError::Cancelled) if cancel.is_cancelled() => {
                    return Err(GeocodeError::Cancelled);
                }
                Err(error) => {
                    log::warn!("{provider} failed, trying next provider: {error}");
                    failures.push(ProviderFailure { provider, error });
                }
            }
        }
        Err(GeocodeError::Exhausted { failures })
    }

    /// Ask every provider in `order` at once and keep the first success.
    ///
    /// Outstanding requests are cancelled as soon as one provider succeeds.
    /// Duplicate providers in `order` are asked once.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Cancelled`] if `cancel` fires, otherwise
    /// [`GeocodeError::Exhausted`] with failures listed in `order`.
    pub async fn geocode_parallel(
        &self,
        request: &GeocodeRequest,
        order: &[ProviderKind],
        cancel: &CancellationToken,
    ) -> GeocodeResult {
        let mut unique: Vec<ProviderKind> = Vec::with_capacity(order.len());
        for &provider in order {
            if !unique.contains(&provider) {
                unique.push(provider);
            }
        }

        let race = cancel.child_token();
        let mut pending: FuturesUnordered<_> = unique
            .iter()
            .enumerate()
            .map(|(position, &provider)| {
                let geocoder = self.geocoder(provider);
                let race = &race;
                async move {
                    let outcome = match geocoder {
                        Some(geocoder) => geocoder.geocode(request, race).await,
                        None => Err(missing(provider)),
                    };
                    (position, provider, outcome)
                }
            })
            .collect();

        let mut failures: Vec<(usize, ProviderFailure)> = Vec::with_capacity(unique.len());
        let winner = loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => break Err(GeocodeError::Cancelled),
                next = pending.next() => next,
            };
            let Some((position, provider, outcome)) = next else {
                break Err(exhausted(failures));
            };
            match outcome {
                Ok(success) => break Ok(success),
                Err(error) => {
                    log::debug!("{provider} failed during parallel geocode: {error}");
                    failures.push((position, ProviderFailure { provider, error }));
                }
            }
        };
        race.cancel();
        winner
    }

    /// Wrap this orchestrator as a single [`Geocoder`].
    #[must_use]
    pub fn into_geocoder(self, order: Vec<ProviderKind>, strategy: Strategy) -> OrchestratedGeocoder {
        OrchestratedGeocoder {
            orchestrator: self,
            order,
            strategy,
        }
    }
}

fn missing(provider: ProviderKind) -> GeocodeError {
    GeocodeError::validation(format!("no geocoder registered for {provider}"))
}

fn exhausted(mut failures: Vec<(usize, ProviderFailure)>) -> GeocodeError {
    failures.sort_by_key(|(position, _)| *position);
    GeocodeError::Exhausted {
        failures: failures.into_iter().map(|(_, failure)| failure).collect(),
    }
}

/// An orchestrator bound to a provider order and strategy.
///
/// Reports [`ProviderKind::Unknown`] as its provider; the winning
/// coordinate still carries the provider that produced it.
#[derive(Debug, Clone)]
pub struct OrchestratedGeocoder {
    orchestrator: GeocodeOrchestrator,
    order: Vec<ProviderKind>,
    strategy: Strategy,
}

impl OrchestratedGeocoder {
    /// The provider order.
    #[must_use]
    pub fn order(&self) -> &[ProviderKind] {
        &self.order
    }

    /// The composition strategy.
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }
}

#[async_trait]
impl Geocoder for OrchestratedGeocoder {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Unknown
    }

    async fn geocode(&self, request: &GeocodeRequest, cancel: &CancellationToken) -> GeocodeResult {
        match self.strategy {
            Strategy::Fallback => {
                self.orchestrator
                    .geocode_with_fallback(request, &self.order, cancel)
                    .await
            }
            Strategy::Parallel => {
                self.orchestrator
                    .geocode_parallel(request, &self.order, cancel)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubGeocoder, StubTransport};
    use locus_core::FailureKind;
    use rstest::{fixture, rstest};
    use std::time::Duration;
    use tokio::time::Instant;

    #[fixture]
    fn request() -> GeocodeRequest {
        GeocodeRequest::new("10 Downing Street, London")
    }

    fn not_found(provider: ProviderKind) -> Arc<StubGeocoder> {
        Arc::new(StubGeocoder::failing(
            provider,
            GeocodeError::not_found("ZERO_RESULTS"),
        ))
    }

    fn found(provider: ProviderKind) -> Arc<StubGeocoder> {
        Arc::new(StubGeocoder::succeeding(provider, 51.5033635, -0.1276248))
    }

    fn failure_providers(error: &GeocodeError) -> Vec<ProviderKind> {
        match error {
            GeocodeError::Exhausted { failures } => {
                failures.iter().map(|failure| failure.provider).collect()
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn fallback_stops_at_first_success(request: GeocodeRequest) {
        let esri = not_found(ProviderKind::Esri);
        let osm = found(ProviderKind::Osm);
        let google = found(ProviderKind::Google);
        let orchestrator = GeocodeOrchestrator::new()
            .with_geocoder(esri.clone())
            .with_geocoder(osm.clone())
            .with_geocoder(google.clone());

        let success = orchestrator
            .geocode_with_fallback(
                &request,
                &[ProviderKind::Esri, ProviderKind::Osm, ProviderKind::Google],
                &CancellationToken::new(),
            )
            .await
            .expect("osm succeeds");

        assert_eq!(success.coordinate.provider(), ProviderKind::Osm);
        assert_eq!((esri.calls(), osm.calls(), google.calls()), (1, 1, 0));
    }

    #[rstest]
    #[tokio::test]
    async fn fallback_reports_every_failure_in_order(request: GeocodeRequest) {
        let orchestrator = GeocodeOrchestrator::new()
            .with_geocoder(not_found(ProviderKind::Google))
            .with_geocoder(not_found(ProviderKind::Esri));

        let error = orchestrator
            .geocode_with_fallback(
                &request,
                &[ProviderKind::Esri, ProviderKind::Geocodio, ProviderKind::Google],
                &CancellationToken::new(),
            )
            .await
            .expect_err("nothing succeeds");

        assert_eq!(
            failure_providers(&error),
            vec![ProviderKind::Esri, ProviderKind::Geocodio, ProviderKind::Google]
        );
        let GeocodeError::Exhausted { failures } = error else {
            unreachable!("checked above");
        };
        assert_eq!(failures[1].error.kind(), FailureKind::Validation);
    }

    #[rstest]
    #[tokio::test]
    async fn empty_order_is_exhausted_with_no_failures(request: GeocodeRequest) {
        let error = GeocodeOrchestrator::new()
            .geocode_with_fallback(&request, &[], &CancellationToken::new())
            .await
            .expect_err("nothing to try");
        assert_eq!(error, GeocodeError::Exhausted { failures: vec![] });
    }

    #[rstest]
    #[tokio::test]
    async fn fallback_honours_cancellation(request: GeocodeRequest) {
        let esri = found(ProviderKind::Esri);
        let orchestrator = GeocodeOrchestrator::new().with_geocoder(esri.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let error = orchestrator
            .geocode_with_fallback(&request, &[ProviderKind::Esri], &cancel)
            .await
            .expect_err("cancelled");
        assert!(error.is_cancelled());
        assert_eq!(esri.calls(), 0);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn parallel_returns_fastest_success_and_cancels_the_rest(request: GeocodeRequest) {
        let slow = Arc::new(
            StubGeocoder::succeeding(ProviderKind::Google, 38.8976763, -77.0365298)
                .with_delay(Duration::from_secs(30)),
        );
        let fast = Arc::new(
            StubGeocoder::succeeding(ProviderKind::Osm, 51.5033635, -0.1276248)
                .with_delay(Duration::from_millis(200)),
        );
        let orchestrator = GeocodeOrchestrator::new()
            .with_geocoder(slow)
            .with_geocoder(fast);
        let started = Instant::now();

        let success = orchestrator
            .geocode_parallel(
                &request,
                &[ProviderKind::Google, ProviderKind::Osm],
                &CancellationToken::new(),
            )
            .await
            .expect("osm wins");

        assert_eq!(success.coordinate.provider(), ProviderKind::Osm);
        assert_eq!(started.elapsed(), Duration::from_millis(200));
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn parallel_failures_follow_caller_order(request: GeocodeRequest) {
        let orchestrator = GeocodeOrchestrator::new()
            .with_geocoder(Arc::new(
                StubGeocoder::failing(ProviderKind::Esri, GeocodeError::not_found("none"))
                    .with_delay(Duration::from_secs(3)),
            ))
            .with_geocoder(Arc::new(
                StubGeocoder::failing(ProviderKind::MapQuest, GeocodeError::not_found("none"))
                    .with_delay(Duration::from_secs(1)),
            ));

        let error = orchestrator
            .geocode_parallel(
                &request,
                &[ProviderKind::Esri, ProviderKind::MapQuest, ProviderKind::Esri],
                &CancellationToken::new(),
            )
            .await
            .expect_err("nothing succeeds");

        assert_eq!(
            failure_providers(&error),
            vec![ProviderKind::Esri, ProviderKind::MapQuest]
        );
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn parallel_honours_caller_cancellation(request: GeocodeRequest) {
        let orchestrator = GeocodeOrchestrator::new().with_geocoder(Arc::new(
            StubGeocoder::succeeding(ProviderKind::Esri, 1.0, 1.0)
                .with_delay(Duration::from_secs(60)),
        ));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let error = orchestrator
            .geocode_parallel(&request, &[ProviderKind::Esri], &cancel)
            .await
            .expect_err("cancelled");
        assert!(error.is_cancelled());
    }

    #[rstest]
    #[case(Strategy::Fallback)]
    #[case(Strategy::Parallel)]
    #[tokio::test]
    async fn orchestrated_geocoder_delegates(request: GeocodeRequest, #[case] strategy: Strategy) {
        let geocoder = GeocodeOrchestrator::new()
            .with_geocoder(not_found(ProviderKind::Esri))
            .with_geocoder(found(ProviderKind::Geocodio))
            .into_geocoder(vec![ProviderKind::Esri, ProviderKind::Geocodio], strategy);

        assert_eq!(geocoder.provider(), ProviderKind::Unknown);
        let success = geocoder
            .geocode(&request, &CancellationToken::new())
            .await
            .expect("geocodio succeeds");
        assert_eq!(success.coordinate.provider(), ProviderKind::Geocodio);
    }

    #[test]
    fn from_config_registers_every_provider() {
        let transport: Arc<dyn Transport> = Arc::new(StubTransport::new());
        let orchestrator = GeocodeOrchestrator::from_config(&GeocoderConfig::default(), transport);
        assert_eq!(orchestrator.providers(), ProviderKind::ALL.to_vec());
    }

    #[test]
    fn with_geocoder_replaces_same_provider() {
        let orchestrator = GeocodeOrchestrator::new()
            .with_geocoder(found(ProviderKind::Osm))
            .with_geocoder(not_found(ProviderKind::Osm));
        assert_eq!(orchestrator.providers(), vec![ProviderKind::Osm]);
    }

    #[rstest]
    #[case("fallback", Strategy::Fallback)]
    #[case(" Parallel ", Strategy::Parallel)]
    #[case("race", Strategy::Parallel)]
    fn strategy_parses(#[case] input: &str, #[case] expected: Strategy) {
        assert_eq!(input.parse::<Strategy>(), Ok(expected));
    }
}

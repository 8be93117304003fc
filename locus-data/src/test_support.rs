//! Test utilities for geocoding.
//!
//! [`StubTransport`] replays scripted HTTP replies so provider clients can be
//! exercised without a network. [`StubGeocoder`] stands in for a whole
//! provider when testing orchestration.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use locus_core::{Coordinate, GeocodeError, GeocodeRequest, GeocodeResult, GeocodeSuccess, ProviderKind};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::geocode::Geocoder;
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};

type Reply = Result<HttpResponse, TransportError>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sleep for `delay`, or fail as soon as `cancel` fires.
async fn pause(delay: Option<Duration>, cancel: &CancellationToken) -> Result<(), ()> {
    let Some(delay) = delay else {
        return Ok(());
    };
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(()),
        () = tokio::time::sleep(delay) => Ok(()),
    }
}

/// Scripted `Transport` for testing.
///
/// Replies are served in order; once only one remains it is repeated for
/// every further call. Each request is captured along with the instant it
/// arrived.
///
/// # Example
///
/// ```
/// use locus_data::test_support::StubTransport;
/// use locus_data::transport::{HttpRequest, Transport};
/// use tokio_util::sync::CancellationToken;
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build()?.block_on(async {
/// let transport = StubTransport::new()
///     .with_reply(503, "")
///     .with_reply(200, "[]");
/// let request = HttpRequest::get("https://example.org", "/search");
/// let cancel = CancellationToken::new();
///
/// assert_eq!(transport.send(&request, &cancel).await.map(|r| r.status), Ok(503));
/// assert_eq!(transport.send(&request, &cancel).await.map(|r| r.status), Ok(200));
/// assert_eq!(transport.send(&request, &cancel).await.map(|r| r.status), Ok(200));
/// assert_eq!(transport.calls(), 3);
/// # });
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct StubTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<(Instant, HttpRequest)>>,
    delay: Option<Duration>,
}

impl StubTransport {
    /// A transport with no scripted replies; every call fails with a network
    /// error until one is added.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that always answers `status` with `body`.
    #[must_use]
    pub fn replying(status: u16, body: impl Into<String>) -> Self {
        Self::new().with_reply(status, body)
    }

    /// Queue an HTTP reply.
    #[must_use]
    pub fn with_reply(self, status: u16, body: impl Into<String>) -> Self {
        lock(&self.replies).push_back(Ok(HttpResponse::new(status, body)));
        self
    }

    /// Queue a transport failure.
    #[must_use]
    pub fn with_error(self, error: TransportError) -> Self {
        lock(&self.replies).push_back(Err(error));
        self
    }

    /// Delay every reply by `delay`; cancellation interrupts the delay.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of requests received.
    pub fn calls(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Requests received, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests)
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }

    /// Instants at which requests arrived, oldest first.
    pub fn call_instants(&self) -> Vec<Instant> {
        lock(&self.requests).iter().map(|(at, _)| *at).collect()
    }

    fn next_reply(&self) -> Reply {
        let mut replies = lock(&self.replies);
        let reply = if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        };
        reply.unwrap_or_else(|| {
            Err(TransportError::Network {
                message: "no scripted reply".to_owned(),
            })
        })
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn send(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, TransportError> {
        lock(&self.requests).push((Instant::now(), request.clone()));
        pause(self.delay, cancel)
            .await
            .map_err(|()| TransportError::Cancelled)?;
        self.next_reply()
    }
}

/// Stub `Geocoder` with a fixed outcome.
///
/// # Example
///
/// ```
/// use locus_core::{GeocodeRequest, ProviderKind};
/// use locus_data::Geocoder;
/// use locus_data::test_support::StubGeocoder;
/// use tokio_util::sync::CancellationToken;
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build()?.block_on(async {
/// let geocoder = StubGeocoder::succeeding(ProviderKind::Osm, 51.5, -0.12);
/// let request = GeocodeRequest::new("London");
/// let success = geocoder.geocode(&request, &CancellationToken::new()).await?;
/// assert_eq!(success.coordinate.provider(), ProviderKind::Osm);
/// # Ok::<(), locus_core::GeocodeError>(())
/// # })?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct StubGeocoder {
    provider: ProviderKind,
    outcome: GeocodeResult,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubGeocoder {
    /// A geocoder resolving every address to `(lat, lng)`.
    ///
    /// # Panics
    ///
    /// Panics if `(lat, lng)` is out of range.
    #[must_use]
    pub fn succeeding(provider: ProviderKind, lat: f64, lng: f64) -> Self {
        let coordinate = Coordinate::new(lat, lng)
            .unwrap_or_else(|err| panic!("stub coordinate must be valid: {err}"))
            .with_provider(provider);
        Self::with_outcome(provider, Ok(GeocodeSuccess::new(coordinate, "{}")))
    }

    /// A geocoder failing every call with `error`.
    #[must_use]
    pub fn failing(provider: ProviderKind, error: GeocodeError) -> Self {
        Self::with_outcome(provider, Err(error))
    }

    fn with_outcome(provider: ProviderKind, outcome: GeocodeResult) -> Self {
        Self {
            provider,
            outcome,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Answer only after `delay`; cancellation interrupts the delay.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of geocode calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    fn provider(&self) -> ProviderKind {
        self.provider
    }

    async fn geocode(&self, _request: &GeocodeRequest, cancel: &CancellationToken) -> GeocodeResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        pause(self.delay, cancel)
            .await
            .map_err(|()| GeocodeError::Cancelled)?;
        self.outcome.clone()
    }
}

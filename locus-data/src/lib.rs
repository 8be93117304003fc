//! Geocoding provider clients for the Locus engine.
//!
//! Responsibilities:
//! - Speak each provider's HTTP protocol and translate its payload into a
//!   [`locus_core::GeocodeResult`].
//! - Throttle requests per provider and compose providers into fallback or
//!   parallel strategies.
//! - Offer a blocking facade for synchronous callers.
//!
//! Boundaries:
//! - Domain types, validation rules and geometry live in `locus-core`.
//! - No caching or persistence of results.
//!
//! Invariants:
//! - API keys never appear in logs or error messages.
//! - No global mutable state; limiters are owned by whoever composes the
//!   clients.
//! - Every asynchronous operation honours its cancellation token.

pub mod blocking;
pub mod config;
pub mod geocode;
pub mod orchestrator;
pub mod throttle;
pub mod transport;

#[doc(hidden)]
pub mod test_support;

pub use blocking::BlockingGeocoder;
pub use config::{
    DEFAULT_MAX_TRIES, DEFAULT_USER_AGENT, GeocoderConfig, HttpTransportConfig, MAX_MIN_INTERVAL,
    ProviderSettings, default_min_interval,
};
pub use geocode::{Geocoder, ProviderClient, UnsupportedProvider};
pub use orchestrator::{GeocodeOrchestrator, OrchestratedGeocoder, Strategy};
pub use throttle::{RateLimiter, RateLimiterRegistry};
pub use transport::{ReqwestTransport, Transport, TransportBuildError};
pub use tokio_util::sync::CancellationToken;

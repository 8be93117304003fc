//! Provider clients behind one asynchronous geocode contract.
//!
//! All six providers run through the same [`ProviderClient`] pipeline:
//! validate, throttle, call, parse, classify. What differs per provider
//! (endpoint, query shape, response schema, retry policy) lives in a static
//! strategy bundle under [`providers`].

mod client;
pub mod providers;

use async_trait::async_trait;
use locus_core::{GeocodeRequest, GeocodeResult, ProviderKind};
use tokio_util::sync::CancellationToken;

pub use client::{ProviderClient, UnsupportedProvider};

/// Resolves addresses to coordinates.
///
/// Implementations never return early with a panic or propagate errors past
/// their own boundary: every outcome is a [`GeocodeResult`].
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Provider this geocoder speaks for; [`ProviderKind::Unknown`] for
    /// composites.
    fn provider(&self) -> ProviderKind;

    /// Resolve `request`, giving up promptly once `cancel` fires.
    async fn geocode(&self, request: &GeocodeRequest, cancel: &CancellationToken)
    -> GeocodeResult;
}

#[async_trait]
impl<G: Geocoder + ?Sized> Geocoder for std::sync::Arc<G> {
    fn provider(&self) -> ProviderKind {
        (**self).provider()
    }

    async fn geocode(
        &self,
        request: &GeocodeRequest,
        cancel: &CancellationToken,
    ) -> GeocodeResult {
        (**self).geocode(request, cancel).await
    }
}

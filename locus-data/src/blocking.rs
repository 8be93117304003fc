//! Synchronous access to any [`Geocoder`].

use locus_core::{GeocodeError, GeocodeRequest, GeocodeResult, ProviderKind};
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use tokio_util::sync::CancellationToken;

use crate::geocode::Geocoder;
use crate::transport::TransportBuildError;

/// Blocking wrapper around an asynchronous geocoder.
///
/// The wrapper owns a `current_thread` Tokio runtime that is reused across
/// calls. When called from inside a multi-threaded Tokio runtime (detected via
/// [`Handle::try_current()`] and [`RuntimeFlavor::MultiThread`]) it borrows
/// that runtime through [`tokio::task::block_in_place`] instead.
///
/// A `current_thread` runtime can neither use `block_in_place` nor host a
/// nested `block_on`, so from inside one the wrapper drives its own runtime on
/// a scoped worker thread. The caller's runtime is blocked for the duration
/// of the call.
///
/// # Example
///
/// ```
/// use locus_core::{GeocodeRequest, ProviderKind};
/// use locus_data::BlockingGeocoder;
/// use locus_data::test_support::StubGeocoder;
///
/// let geocoder = BlockingGeocoder::new(StubGeocoder::succeeding(ProviderKind::Esri, 48.85, 2.35))?;
/// let success = geocoder.geocode(&GeocodeRequest::new("Paris"))?;
/// assert_eq!(success.coordinate.lat(), 48.85);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct BlockingGeocoder<G> {
    inner: G,
    runtime: Option<Runtime>,
}

impl<G> Drop for BlockingGeocoder<G> {
    fn drop(&mut self) {
        // Dropping a runtime blocks, which panics inside an async context.
        if let Some(runtime) = self.runtime.take()
            && Handle::try_current().is_ok()
        {
            runtime.shutdown_background();
        }
    }
}

impl<G: std::fmt::Debug> std::fmt::Debug for BlockingGeocoder<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingGeocoder")
            .field("inner", &self.inner)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl<G: Geocoder> BlockingGeocoder<G> {
    /// Wrap `inner`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportBuildError::Runtime`] if the Tokio runtime fails to
    /// build.
    pub fn new(inner: G) -> Result<Self, TransportBuildError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(TransportBuildError::Runtime)?;
        Ok(Self {
            inner,
            runtime: Some(runtime),
        })
    }

    /// The wrapped geocoder.
    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// Provider of the wrapped geocoder.
    pub fn provider(&self) -> ProviderKind {
        self.inner.provider()
    }

    /// Resolve `request`, blocking the current thread.
    pub fn geocode(&self, request: &GeocodeRequest) -> GeocodeResult {
        self.geocode_with_cancel(request, &CancellationToken::new())
    }

    /// Resolve `request`, blocking until it completes or `cancel` fires.
    ///
    /// `cancel` may be triggered from another thread.
    pub fn geocode_with_cancel(
        &self,
        request: &GeocodeRequest,
        cancel: &CancellationToken,
    ) -> GeocodeResult {
        let Some(runtime) = self.runtime.as_ref() else {
            return Err(GeocodeError::validation("blocking runtime has shut down"));
        };
        let future = self.inner.geocode(request, cancel);
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            Ok(_) => std::thread::scope(|scope| {
                match scope.spawn(|| runtime.block_on(future)).join() {
                    Ok(outcome) => outcome,
                    Err(payload) => std::panic::resume_unwind(payload),
                }
            }),
            Err(_) => runtime.block_on(future),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubGeocoder;
    use std::time::Duration;

    #[test]
    fn blocks_outside_a_runtime() {
        let geocoder = BlockingGeocoder::new(StubGeocoder::succeeding(ProviderKind::Osm, 10.0, 20.0))
            .expect("runtime builds");

        let success = geocoder
            .geocode(&GeocodeRequest::new("anywhere"))
            .expect("stub succeeds");
        assert_eq!(success.coordinate.lng(), 20.0);
        assert_eq!(geocoder.provider(), ProviderKind::Osm);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn borrows_a_multi_thread_runtime() {
        let geocoder = BlockingGeocoder::new(StubGeocoder::failing(
            ProviderKind::Google,
            GeocodeError::not_found("ZERO_RESULTS"),
        ))
        .expect("runtime builds");

        let error = geocoder
            .geocode(&GeocodeRequest::new("nowhere"))
            .expect_err("stub fails");
        assert_eq!(error, GeocodeError::not_found("ZERO_RESULTS"));
        assert_eq!(geocoder.inner().calls(), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn runs_inside_a_current_thread_runtime() {
        let geocoder = BlockingGeocoder::new(
            StubGeocoder::succeeding(ProviderKind::Geocodio, 38.88, -77.09)
                .with_delay(Duration::from_millis(10)),
        )
        .expect("runtime builds");

        let success = geocoder
            .geocode(&GeocodeRequest::new("Arlington"))
            .expect("stub succeeds");
        assert_eq!(success.coordinate.lat(), 38.88);
        assert_eq!(geocoder.inner().calls(), 1);
    }

    #[test]
    fn cancellation_from_another_thread_unblocks() {
        let geocoder = BlockingGeocoder::new(
            StubGeocoder::succeeding(ProviderKind::Esri, 1.0, 1.0)
                .with_delay(Duration::from_secs(60)),
        )
        .expect("runtime builds");
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            trigger.cancel();
        });

        let error = geocoder
            .geocode_with_cancel(&GeocodeRequest::new("anywhere"), &cancel)
            .expect_err("cancelled");
        assert!(error.is_cancelled());
        canceller.join().expect("canceller thread finishes");
    }
}

//! Per-provider minimum-interval throttling.
//!
//! A [`RateLimiter`] serialises every caller of one provider: the mutex
//! guarding the last-request instant is held for the whole wait, so two
//! callers can never pass through the same interval slot. Limiters are plain
//! values owned by whoever composes the clients; there is no process-global
//! state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use locus_core::{GeocodeError, ProviderKind};
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::config::{GeocoderConfig, MAX_MIN_INTERVAL};

/// Minimum-interval gate shared by every caller of one provider.
///
/// The last-request instant starts at construction time, so the first
/// acquire also waits out one interval. Only a completed acquire stamps the
/// instant: a caller cancelled while queued or waiting leaves the slot to the
/// next caller.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Instant>,
}

impl RateLimiter {
    /// Create a limiter stamped with the current instant.
    ///
    /// Intervals longer than [`MAX_MIN_INTERVAL`] are clamped to it.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval: min_interval.min(MAX_MIN_INTERVAL),
            last_request: Mutex::new(Instant::now()),
        }
    }

    /// Configured spacing between requests.
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait for this caller's interval slot and stamp it.
    ///
    /// The slot is claimed only when the wait completes. A cancelled wait
    /// leaves the timestamp untouched.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Cancelled`] as soon as `cancel` fires, whether
    /// the caller is queued behind another caller or already sleeping.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), GeocodeError> {
        let mut last_request = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(GeocodeError::Cancelled),
            guard = self.last_request.lock() => guard,
        };

        if let Some(ready_at) = last_request.checked_add(self.min_interval)
            && Instant::now() < ready_at
        {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(GeocodeError::Cancelled),
                () = sleep_until(ready_at) => {}
            }
        }
        *last_request = Instant::now();
        Ok(())
    }
}

/// Limiters keyed by provider.
#[derive(Debug, Clone, Default)]
pub struct RateLimiterRegistry {
    limiters: HashMap<ProviderKind, Arc<RateLimiter>>,
}

impl RateLimiterRegistry {
    /// An empty registry: nothing is throttled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// One limiter per provider whose configuration asks for throttling.
    #[must_use]
    pub fn from_config(config: &GeocoderConfig) -> Self {
        ProviderKind::ALL
            .into_iter()
            .fold(Self::new(), |registry, provider| {
                match config.settings(provider).min_interval(provider) {
                    Some(interval) => registry.with_limiter(provider, interval),
                    None => registry,
                }
            })
    }

    /// Register a fresh limiter for `provider`, replacing any existing one.
    #[must_use]
    pub fn with_limiter(mut self, provider: ProviderKind, min_interval: Duration) -> Self {
        self.limiters
            .insert(provider, Arc::new(RateLimiter::new(min_interval)));
        self
    }

    /// The shared limiter for `provider`, if it is throttled.
    #[must_use]
    pub fn get(&self, provider: ProviderKind) -> Option<Arc<RateLimiter>> {
        self.limiters.get(&provider).cloned()
    }

    /// Wait for `provider`'s slot; unthrottled providers pass straight through.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Cancelled`] if `cancel` fires during the wait.
    pub async fn acquire(
        &self,
        provider: ProviderKind,
        cancel: &CancellationToken,
    ) -> Result<(), GeocodeError> {
        match self.limiters.get(&provider) {
            Some(limiter) => limiter.acquire(cancel).await,
            None => Ok(()),
        }
    }
}

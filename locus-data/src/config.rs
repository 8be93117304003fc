//! Configuration for the HTTP transport and the provider clients.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is a
//! usable configuration. Throttle intervals default to each provider's usage
//! policy but can be overridden or disabled with `0`.

use std::time::Duration;

use locus_core::ProviderKind;
use serde::{Deserialize, Serialize};

/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "locus-geocoder/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Attempts made by retrying providers when nothing else is configured.
pub const DEFAULT_MAX_TRIES: u32 = 1;

/// Longest spacing a limiter will enforce; larger overrides are clamped.
pub const MAX_MIN_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default minimum spacing between requests to `provider`, if it is throttled.
///
/// Google and Geoapify publish per-second quotas; Nominatim's usage policy
/// asks for at most one request per second.
#[must_use]
pub fn default_min_interval(provider: ProviderKind) -> Option<Duration> {
    match provider {
        ProviderKind::Google => Some(Duration::from_millis(900)),
        ProviderKind::Geoapify => Some(Duration::from_secs(1)),
        ProviderKind::Osm => Some(Duration::from_millis(1100)),
        _ => None,
    }
}

/// Configuration for [`crate::transport::ReqwestTransport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpTransportConfig {
    /// Request timeout in seconds, applied to connect and overall duration.
    pub timeout_secs: u64,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpTransportConfig {
    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Settings for one provider client.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Override for the provider's public endpoint, e.g. a self-hosted
    /// Nominatim.
    pub base_url: Option<String>,
    /// API key or token used when a request carries none.
    pub api_key: Option<String>,
    /// Minimum seconds between requests; `0` disables throttling.
    pub min_interval_secs: Option<f64>,
    /// Attempts for providers with a bounded retry loop.
    pub max_tries: Option<u32>,
    /// User agent header for providers that require one.
    pub user_agent: Option<String>,
}

impl ProviderSettings {
    /// Set the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the minimum request spacing.
    #[must_use]
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval_secs = Some(interval.as_secs_f64());
        self
    }

    /// Set the attempt count.
    #[must_use]
    pub fn with_max_tries(mut self, max_tries: u32) -> Self {
        self.max_tries = Some(max_tries);
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Effective throttle interval for `provider`.
    ///
    /// Non-positive or non-finite overrides disable throttling. Overrides
    /// longer than [`MAX_MIN_INTERVAL`] are clamped to it.
    #[must_use]
    pub fn min_interval(&self, provider: ProviderKind) -> Option<Duration> {
        match self.min_interval_secs {
            Some(secs) if secs.is_finite() && secs > 0.0 => Some(
                Duration::try_from_secs_f64(secs)
                    .map_or(MAX_MIN_INTERVAL, |interval| interval.min(MAX_MIN_INTERVAL)),
            ),
            Some(_) => None,
            None => default_min_interval(provider),
        }
    }
}

/// Configuration for every provider plus the shared transport.
///
/// # Examples
/// ```
/// use locus_core::ProviderKind;
/// use locus_data::GeocoderConfig;
/// use std::time::Duration;
///
/// let config: GeocoderConfig =
///     serde_json::from_str(r#"{ "osm": { "min_interval_secs": 2.0 } }"#)?;
/// assert_eq!(
///     config.settings(ProviderKind::Osm).min_interval(ProviderKind::Osm),
///     Some(Duration::from_secs(2))
/// );
/// assert_eq!(
///     config.settings(ProviderKind::Google).min_interval(ProviderKind::Google),
///     Some(Duration::from_millis(900))
/// );
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    /// Shared HTTP transport settings.
    pub http: HttpTransportConfig,
    /// Esri settings.
    pub esri: ProviderSettings,
    /// Google settings.
    pub google: ProviderSettings,
    /// MapQuest settings.
    pub mapquest: ProviderSettings,
    /// Geoapify settings.
    pub geoapify: ProviderSettings,
    /// OSM Nominatim settings.
    pub osm: ProviderSettings,
    /// Geocodio settings.
    pub geocodio: ProviderSettings,
    /// Settings used for [`ProviderKind::Unknown`]; never read by a client.
    #[serde(skip)]
    unknown: ProviderSettings,
}

impl GeocoderConfig {
    /// Settings for `provider`.
    #[must_use]
    pub fn settings(&self, provider: ProviderKind) -> &ProviderSettings {
        match provider {
            ProviderKind::Esri => &self.esri,
            ProviderKind::Google => &self.google,
            ProviderKind::MapQuest => &self.mapquest,
            ProviderKind::Geoapify => &self.geoapify,
            ProviderKind::Osm => &self.osm,
            ProviderKind::Geocodio => &self.geocodio,
            ProviderKind::Unknown => &self.unknown,
        }
    }

    /// Mutable settings for `provider`.
    pub fn settings_mut(&mut self, provider: ProviderKind) -> &mut ProviderSettings {
        match provider {
            ProviderKind::Esri => &mut self.esri,
            ProviderKind::Google => &mut self.google,
            ProviderKind::MapQuest => &mut self.mapquest,
            ProviderKind::Geoapify => &mut self.geoapify,
            ProviderKind::Osm => &mut self.osm,
            ProviderKind::Geocodio => &mut self.geocodio,
            ProviderKind::Unknown => &mut self.unknown,
        }
    }

    /// Replace the settings for `provider`.
    #[must_use]
    pub fn with_provider(mut self, provider: ProviderKind, settings: ProviderSettings) -> Self {
        *self.settings_mut(provider) = settings;
        self
    }

    /// Replace the transport settings.
    #[must_use]
    pub fn with_http(mut self, http: HttpTransportConfig) -> Self {
        self.http = http;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ProviderKind::Google, Some(Duration::from_millis(900)))]
    #[case(ProviderKind::Geoapify, Some(Duration::from_secs(1)))]
    #[case(ProviderKind::Osm, Some(Duration::from_millis(1100)))]
    #[case(ProviderKind::Esri, None)]
    #[case(ProviderKind::MapQuest, None)]
    #[case(ProviderKind::Geocodio, None)]
    fn default_intervals_follow_provider_policy(
        #[case] provider: ProviderKind,
        #[case] expected: Option<Duration>,
    ) {
        let config = GeocoderConfig::default();
        assert_eq!(config.settings(provider).min_interval(provider), expected);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f64::NAN)]
    fn non_positive_interval_disables_throttle(#[case] secs: f64) {
        let settings = ProviderSettings {
            min_interval_secs: Some(secs),
            ..ProviderSettings::default()
        };
        assert_eq!(settings.min_interval(ProviderKind::Osm), None);
    }

    #[rstest]
    #[case(1e300)]
    #[case(1e12)]
    #[case(f64::MAX)]
    fn oversized_interval_is_clamped(#[case] secs: f64) {
        let json = format!(r#"{{ "osm": {{ "min_interval_secs": {secs:e} }} }}"#);
        let config: GeocoderConfig = serde_json::from_str(&json).expect("config parses");
        assert_eq!(
            config.settings(ProviderKind::Osm).min_interval(ProviderKind::Osm),
            Some(MAX_MIN_INTERVAL)
        );
    }

    #[test]
    fn explicit_interval_throttles_unthrottled_provider() {
        let settings = ProviderSettings::default().with_min_interval(Duration::from_millis(250));
        assert_eq!(
            settings.min_interval(ProviderKind::Esri),
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn empty_json_yields_defaults() {
        let config: GeocoderConfig = serde_json::from_str("{}").expect("empty config parses");
        assert_eq!(config, GeocoderConfig::default());
        assert_eq!(config.http.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.http.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn builder_replaces_provider_settings() {
        let config = GeocoderConfig::default().with_provider(
            ProviderKind::Geoapify,
            ProviderSettings::default().with_api_key("key"),
        );
        assert_eq!(
            config.settings(ProviderKind::Geoapify).api_key.as_deref(),
            Some("key")
        );
    }
}

//! Geocode command implementation for the Locus CLI.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use locus_core::{Coordinate, GeocodeRequest, PlaceDetails, ProviderKind};
use locus_data::{
    BlockingGeocoder, GeocodeOrchestrator, GeocoderConfig, HttpTransportConfig, ReqwestTransport,
    Strategy,
};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_ADDRESS, ARG_API_KEY, ARG_BASE_URL, ARG_COUNTRY_CODE, ARG_LOCALE, ARG_MAX_TRIES,
    ARG_PROVIDERS, ARG_STRATEGY, ARG_TIMEOUT_SECS, ARG_USER_AGENT, CliError, ENV_ADDRESS,
};

/// Providers tried when none are configured.
const DEFAULT_PROVIDERS: [ProviderKind; 1] = [ProviderKind::Osm];

/// CLI arguments for the `geocode` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Resolve a free-text address through one or more geocoding \
                 providers. Options can come from CLI flags, configuration \
                 files, or LOCUS_CMDS_GEOCODE_* environment variables.",
    about = "Resolve an address to a coordinate"
)]
#[ortho_config(prefix = "LOCUS")]
pub(crate) struct GeocodeArgs {
    /// Address to resolve.
    #[arg(value_name = "address")]
    #[serde(default)]
    pub(crate) address: Option<String>,
    /// Comma-separated provider order, e.g. `esri,osm`.
    #[arg(long = ARG_PROVIDERS, value_name = "list")]
    #[serde(default)]
    pub(crate) providers: Option<String>,
    /// `fallback` (one at a time) or `parallel` (first success wins).
    #[arg(long = ARG_STRATEGY, value_name = "strategy")]
    #[serde(default)]
    pub(crate) strategy: Option<String>,
    /// API key sent with every provider request.
    #[arg(long = ARG_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) api_key: Option<String>,
    /// Endpoint override, applied when a single provider is selected.
    #[arg(long = ARG_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) base_url: Option<String>,
    /// User agent for the HTTP client and for Nominatim.
    #[arg(long = ARG_USER_AGENT, value_name = "agent")]
    #[serde(default)]
    pub(crate) user_agent: Option<String>,
    /// Attempts for providers that retry (Google, OSM).
    #[arg(long = ARG_MAX_TRIES, value_name = "count")]
    #[serde(default)]
    pub(crate) max_tries: Option<u32>,
    /// ISO 3166-1 alpha-2 country filter.
    #[arg(long = ARG_COUNTRY_CODE, value_name = "code")]
    #[serde(default)]
    pub(crate) country_code: Option<String>,
    /// Preferred response language.
    #[arg(long = ARG_LOCALE, value_name = "locale")]
    #[serde(default)]
    pub(crate) locale: Option<String>,
    /// HTTP timeout in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
}

impl GeocodeArgs {
    pub(crate) fn into_config(self) -> Result<GeocodeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        GeocodeConfig::try_from(merged)
    }
}

/// Resolved `geocode` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GeocodeConfig {
    pub(crate) request: GeocodeRequest,
    pub(crate) providers: Vec<ProviderKind>,
    pub(crate) strategy: Strategy,
    pub(crate) geocoder: GeocoderConfig,
}

impl GeocodeConfig {
    /// Build the provider stack and resolve the request.
    pub(crate) fn run(self) -> Result<GeocodeOutput, CliError> {
        let transport = Arc::new(ReqwestTransport::with_config(self.geocoder.http.clone())?);
        let geocoder = GeocodeOrchestrator::from_config(&self.geocoder, transport)
            .into_geocoder(self.providers, self.strategy);
        let success = BlockingGeocoder::new(geocoder)?.geocode(&self.request)?;
        Ok(GeocodeOutput {
            google_maps_url: success.coordinate.google_maps_url(),
            coordinate: success.coordinate,
            details: success.details,
        })
    }
}

impl TryFrom<GeocodeArgs> for GeocodeConfig {
    type Error = CliError;

    fn try_from(args: GeocodeArgs) -> Result<Self, Self::Error> {
        let address = args.address.ok_or(CliError::MissingArgument {
            field: ARG_ADDRESS,
            env: ENV_ADDRESS,
        })?;
        let providers = match args.providers.as_deref() {
            Some(list) => parse_providers(list)?,
            None => DEFAULT_PROVIDERS.to_vec(),
        };
        let strategy = match args.strategy.as_deref() {
            Some(text) => text.parse().map_err(|message| CliError::InvalidArgument {
                field: ARG_STRATEGY,
                message,
            })?,
            None => Strategy::default(),
        };

        let mut http = HttpTransportConfig::default();
        if let Some(secs) = args.timeout_secs {
            http = http.with_timeout(Duration::from_secs(secs));
        }
        if let Some(agent) = &args.user_agent {
            http = http.with_user_agent(agent.clone());
        }
        let mut geocoder = GeocoderConfig::default().with_http(http);
        for &provider in &providers {
            let settings = geocoder.settings_mut(provider);
            settings.user_agent.clone_from(&args.user_agent);
            if providers.len() == 1 {
                settings.base_url.clone_from(&args.base_url);
            }
        }

        let mut request = GeocodeRequest::new(address);
        request.api_key = args.api_key;
        request.max_tries = args.max_tries;
        request.country_code = args.country_code;
        request.locale = args.locale;

        Ok(Self {
            request,
            providers,
            strategy,
            geocoder,
        })
    }
}

/// Parse a comma-separated provider list, keeping the first of any repeats.
fn parse_providers(list: &str) -> Result<Vec<ProviderKind>, CliError> {
    let mut providers = Vec::new();
    for name in list.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        let provider: ProviderKind = name.parse().map_err(|message| CliError::InvalidArgument {
            field: ARG_PROVIDERS,
            message,
        })?;
        if provider == ProviderKind::Unknown {
            return Err(CliError::InvalidArgument {
                field: ARG_PROVIDERS,
                message: format!("{name} is not a geocoding provider"),
            });
        }
        if !providers.contains(&provider) {
            providers.push(provider);
        }
    }
    if providers.is_empty() {
        return Err(CliError::InvalidArgument {
            field: ARG_PROVIDERS,
            message: "at least one provider is required".to_owned(),
        });
    }
    Ok(providers)
}

/// Output of a successful geocode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeocodeOutput {
    pub(crate) coordinate: Coordinate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) details: Option<PlaceDetails>,
    pub(crate) google_maps_url: String,
}

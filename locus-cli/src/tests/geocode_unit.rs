//! Unit tests covering geocode CLI configuration resolution.

use super::*;
use crate::geocode::GeocodeConfig;
use locus_core::ProviderKind;
use locus_data::Strategy;
use rstest::rstest;

fn args_for(address: &str) -> GeocodeArgs {
    GeocodeArgs {
        address: Some(address.to_owned()),
        ..GeocodeArgs::default()
    }
}

#[rstest]
fn converting_without_address_errors() {
    let err = GeocodeConfig::try_from(GeocodeArgs::default()).expect_err("address is required");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_ADDRESS);
            assert_eq!(env, ENV_ADDRESS);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn defaults_to_osm_fallback() {
    let config = GeocodeConfig::try_from(args_for("10 Downing Street")).expect("config builds");
    assert_eq!(config.providers, vec![ProviderKind::Osm]);
    assert_eq!(config.strategy, Strategy::Fallback);
    assert_eq!(config.request.address, "10 Downing Street");
}

#[rstest]
fn provider_list_keeps_order_and_drops_repeats() {
    let args = GeocodeArgs {
        providers: Some("arcgis, nominatim,esri,,google".to_owned()),
        strategy: Some("parallel".to_owned()),
        ..args_for("Main St")
    };
    let config = GeocodeConfig::try_from(args).expect("config builds");
    assert_eq!(
        config.providers,
        vec![ProviderKind::Esri, ProviderKind::Osm, ProviderKind::Google]
    );
    assert_eq!(config.strategy, Strategy::Parallel);
}

#[rstest]
#[case("bing")]
#[case("unknown")]
#[case(" , ")]
fn rejects_unusable_provider_lists(#[case] providers: &str) {
    let args = GeocodeArgs {
        providers: Some(providers.to_owned()),
        ..args_for("Main St")
    };
    match GeocodeConfig::try_from(args).expect_err("list is rejected") {
        CliError::InvalidArgument { field, .. } => assert_eq!(field, ARG_PROVIDERS),
        other => panic!("expected InvalidArgument, found {other:?}"),
    }
}

#[rstest]
fn rejects_unknown_strategy() {
    let args = GeocodeArgs {
        strategy: Some("random".to_owned()),
        ..args_for("Main St")
    };
    match GeocodeConfig::try_from(args).expect_err("strategy is rejected") {
        CliError::InvalidArgument { field, .. } => assert_eq!(field, ARG_STRATEGY),
        other => panic!("expected InvalidArgument, found {other:?}"),
    }
}

#[rstest]
fn request_tuning_and_transport_settings_are_applied() {
    let args = GeocodeArgs {
        api_key: Some("secret".to_owned()),
        max_tries: Some(3),
        country_code: Some("gb".to_owned()),
        locale: Some("en".to_owned()),
        timeout_secs: Some(5),
        user_agent: Some("acme/1.0".to_owned()),
        base_url: Some("https://nominatim.internal".to_owned()),
        ..args_for("10 Downing Street")
    };
    let config = GeocodeConfig::try_from(args).expect("config builds");

    assert_eq!(config.request.api_key.as_deref(), Some("secret"));
    assert_eq!(config.request.max_tries, Some(3));
    assert_eq!(config.request.country_code.as_deref(), Some("gb"));
    assert_eq!(config.request.locale.as_deref(), Some("en"));
    assert_eq!(config.geocoder.http.timeout_secs, 5);
    assert_eq!(config.geocoder.http.user_agent, "acme/1.0");
    let osm = config.geocoder.settings(ProviderKind::Osm);
    assert_eq!(osm.user_agent.as_deref(), Some("acme/1.0"));
    assert_eq!(osm.base_url.as_deref(), Some("https://nominatim.internal"));
}

#[rstest]
fn base_url_is_ignored_for_several_providers() {
    let args = GeocodeArgs {
        providers: Some("esri,osm".to_owned()),
        base_url: Some("https://geo.internal".to_owned()),
        ..args_for("Main St")
    };
    let config = GeocodeConfig::try_from(args).expect("config builds");
    assert!(config.geocoder.settings(ProviderKind::Esri).base_url.is_none());
    assert!(config.geocoder.settings(ProviderKind::Osm).base_url.is_none());
}

#[rstest]
fn geocode_subcommand_parses_flags() {
    let cli = Cli::try_parse_from([
        "locus",
        "geocode",
        "1600 Pennsylvania Ave",
        "--providers",
        "google,osm",
        "--max-tries",
        "2",
    ])
    .expect("arguments parse");
    let Command::Geocode(args) = cli.command else {
        panic!("expected the geocode subcommand");
    };
    assert_eq!(args.address.as_deref(), Some("1600 Pennsylvania Ave"));
    assert_eq!(args.providers.as_deref(), Some("google,osm"));
    assert_eq!(args.max_tries, Some(2));
}

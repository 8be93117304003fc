//! Focused unit tests covering the offline subcommands.

use super::*;
use rstest::rstest;

fn run_to_json(command: Command) -> serde_json::Value {
    let mut out = Vec::new();
    execute(command, &mut out).expect("command succeeds");
    serde_json::from_slice(&out).expect("output is JSON")
}

fn parse(args: &[&str]) -> Command {
    Cli::try_parse_from(args).expect("arguments parse").command
}

#[rstest]
fn plus_code_reports_format_and_precision() {
    let json = run_to_json(parse(&["locus", "plus-code", "8FVC2222+22"]));
    assert_eq!(json["code"], "8FVC2222+22");
    assert_eq!(json["valid"], true);
    assert_eq!(json["likelyFormat"], true);
    assert_eq!(json["precisionMeters"], 12.5);
}

#[rstest]
fn plus_code_without_separator_is_invalid() {
    let json = run_to_json(parse(&["locus", "plus-code", "8FVC2222"]));
    assert_eq!(json["valid"], false);
    assert!(json["precisionMeters"].is_null());
}

#[rstest]
#[case("miles", "miles")]
#[case("km", "kilometers")]
fn distance_accepts_negative_coordinates(#[case] unit: &str, #[case] expected: &str) {
    let json = run_to_json(parse(&[
        "locus",
        "distance",
        "--from",
        "-33.8688,151.2093",
        "--to",
        "-37.8136,144.9631",
        "--unit",
        unit,
    ]));
    assert_eq!(json["unit"], expected);
    assert!(json["distance"].as_f64().is_some_and(|d| d > 0.0));
}

#[rstest]
fn distance_between_identical_points_is_zero() {
    let json = run_to_json(parse(&[
        "locus", "distance", "--from", "51.5,-0.12", "--to", "51.5,-0.12",
    ]));
    assert_eq!(json["distance"], 0.0);
}

#[rstest]
#[case("51.5", ARG_FROM)]
#[case("north,west", ARG_FROM)]
#[case("91,0", ARG_FROM)]
fn distance_rejects_malformed_points(#[case] from: &str, #[case] expected: &'static str) {
    let args = DistanceArgs {
        from: from.to_owned(),
        to: "0,0".to_owned(),
        unit: "miles".to_owned(),
    };
    match args.measure().expect_err("point is rejected") {
        CliError::InvalidArgument { field, .. } => assert_eq!(field, expected),
        other => panic!("expected InvalidArgument, found {other:?}"),
    }
}

#[rstest]
fn distance_rejects_unknown_unit() {
    let args = DistanceArgs {
        from: "1,1".to_owned(),
        to: "2,2".to_owned(),
        unit: "furlongs".to_owned(),
    };
    match args.measure().expect_err("unit is rejected") {
        CliError::InvalidArgument { field, .. } => assert_eq!(field, ARG_UNIT),
        other => panic!("expected InvalidArgument, found {other:?}"),
    }
}

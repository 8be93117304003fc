//! Command-line interface for the Locus geocoding engine.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{Args, Parser, Subcommand};
use locus_core::{DistanceUnit, haversine_distance, is_valid_position, plus_code};
use serde::Serialize;

mod error;
mod geocode;

pub use error::CliError;
use geocode::GeocodeArgs;

pub(crate) const ARG_ADDRESS: &str = "address";
pub(crate) const ARG_PROVIDERS: &str = "providers";
pub(crate) const ARG_STRATEGY: &str = "strategy";
pub(crate) const ARG_API_KEY: &str = "api-key";
pub(crate) const ARG_BASE_URL: &str = "base-url";
pub(crate) const ARG_USER_AGENT: &str = "user-agent";
pub(crate) const ARG_MAX_TRIES: &str = "max-tries";
pub(crate) const ARG_COUNTRY_CODE: &str = "country-code";
pub(crate) const ARG_LOCALE: &str = "locale";
pub(crate) const ARG_TIMEOUT_SECS: &str = "timeout-secs";
pub(crate) const ENV_ADDRESS: &str = "LOCUS_CMDS_GEOCODE_ADDRESS";
const ARG_FROM: &str = "from";
const ARG_TO: &str = "to";
const ARG_UNIT: &str = "unit";

/// Run the Locus CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let stdout = std::io::stdout();
    execute(cli.command, &mut stdout.lock())
}

fn execute(command: Command, out: &mut impl Write) -> Result<(), CliError> {
    match command {
        Command::Geocode(args) => {
            let config = args.into_config()?;
            let output = config.run()?;
            write_json(out, &output)
        }
        Command::PlusCode(args) => write_json(out, &PlusCodeReport::new(&args.code)),
        Command::Distance(args) => write_json(out, &args.measure()?),
    }
}

fn write_json(out: &mut impl Write, value: &impl Serialize) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut *out, value).map_err(CliError::SerializeOutput)?;
    writeln!(out).map_err(CliError::WriteOutput)
}

#[derive(Debug, Parser)]
#[command(
    name = "locus",
    about = "Geocode addresses and run spatial checks with the Locus engine",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve an address to a coordinate through one or more providers.
    Geocode(GeocodeArgs),
    /// Check the format of an Open Location Code.
    PlusCode(PlusCodeArgs),
    /// Great-circle distance between two points.
    Distance(DistanceArgs),
}

/// CLI arguments for the `plus-code` subcommand.
#[derive(Debug, Clone, Args)]
struct PlusCodeArgs {
    /// The code to inspect, e.g. `8FVC9G8F+6X`.
    #[arg(value_name = "code")]
    code: String,
}

/// Format checks for one plus code.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlusCodeReport {
    code: String,
    valid: bool,
    likely_format: bool,
    precision_meters: Option<f64>,
}

impl PlusCodeReport {
    fn new(code: &str) -> Self {
        Self {
            code: code.to_owned(),
            valid: plus_code::is_valid_format(code),
            likely_format: plus_code::is_likely_format(code),
            precision_meters: plus_code::precision(code),
        }
    }
}

/// CLI arguments for the `distance` subcommand.
#[derive(Debug, Clone, Args)]
struct DistanceArgs {
    /// Start point as `lat,lng`.
    #[arg(long = ARG_FROM, value_name = "lat,lng", allow_hyphen_values = true)]
    from: String,
    /// End point as `lat,lng`.
    #[arg(long = ARG_TO, value_name = "lat,lng", allow_hyphen_values = true)]
    to: String,
    /// `miles` or `kilometers`.
    #[arg(long = ARG_UNIT, value_name = "unit", default_value = "miles")]
    unit: String,
}

/// Distance between two points.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct DistanceReport {
    distance: f64,
    unit: DistanceUnit,
}

impl DistanceArgs {
    fn measure(&self) -> Result<DistanceReport, CliError> {
        let (lat1, lng1) = parse_point(&self.from, ARG_FROM)?;
        let (lat2, lng2) = parse_point(&self.to, ARG_TO)?;
        let unit: DistanceUnit = self
            .unit
            .parse()
            .map_err(|message| CliError::InvalidArgument {
                field: ARG_UNIT,
                message,
            })?;
        Ok(DistanceReport {
            distance: haversine_distance(lat1, lng1, lat2, lng2, unit),
            unit,
        })
    }
}

/// Parse `lat,lng`, rejecting out-of-range positions.
fn parse_point(text: &str, field: &'static str) -> Result<(f64, f64), CliError> {
    let invalid = |message: String| CliError::InvalidArgument { field, message };
    let (lat, lng) = text
        .split_once(',')
        .ok_or_else(|| invalid(format!("expected lat,lng but got {text:?}")))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|err| invalid(format!("latitude {lat:?}: {err}")))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|err| invalid(format!("longitude {lng:?}: {err}")))?;
    if !is_valid_position(lat, lng, false) {
        return Err(invalid(format!("({lat}, {lng}) is out of range")));
    }
    Ok((lat, lng))
}

#[cfg(test)]
mod tests;

//! Error types emitted by the Locus CLI.

use std::sync::Arc;

use locus_core::GeocodeError;
use locus_data::TransportBuildError;
use thiserror::Error;

/// Errors emitted by the Locus CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// An option was present but could not be interpreted.
    #[error("invalid {field}: {message}")]
    InvalidArgument {
        field: &'static str,
        message: String,
    },
    /// Constructing the HTTP transport or runtime failed.
    #[error("failed to build geocoding transport: {0}")]
    BuildTransport(#[from] TransportBuildError),
    /// Every requested provider failed.
    #[error("geocode failed: {0}")]
    Geocode(#[from] GeocodeError),
    /// Serializing command output failed.
    #[error("failed to serialize output: {0}")]
    SerializeOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}

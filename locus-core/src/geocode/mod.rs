//! Provider-neutral geocoding vocabulary.
//!
//! Every provider client accepts a [`GeocodeRequest`] and returns a
//! [`GeocodeResult`]. Clients never panic or propagate errors past their own
//! boundary: validation, transport, parse and cancellation failures all
//! collapse into a [`GeocodeError`] whose [`FailureKind`] places it in the
//! shared taxonomy.

mod error;
mod outcome;
mod request;

pub use error::{FailureKind, GeocodeError, ProviderFailure};
pub use outcome::{GeocodeResult, GeocodeSuccess, PlaceDetails};
pub use request::{GeocodeRequest, MAX_ADDRESS_CHARS, NormalisedAddress};

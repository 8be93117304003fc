//! Shared test harness modules for the Locus CLI.

use super::*;

mod geocode_unit;
mod unit;

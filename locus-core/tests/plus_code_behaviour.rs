//! Behavioural tests for plus-code format checks.

use locus_core::plus_code;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::{Cell, RefCell};

#[fixture]
fn code() -> RefCell<String> {
    RefCell::new(String::new())
}

#[fixture]
fn valid() -> Cell<Option<bool>> {
    Cell::new(None)
}

#[given("the plus code {plus_code:word}")]
fn given_code(#[from(code)] cell: &RefCell<String>, plus_code: String) {
    // Gherkin quotes arrive with the word.
    *cell.borrow_mut() = plus_code.trim_matches('"').to_owned();
}

#[when("I validate the plus code")]
fn when_validate(#[from(code)] code: &RefCell<String>, #[from(valid)] valid: &Cell<Option<bool>>) {
    valid.set(Some(plus_code::is_valid_format(&code.borrow())));
}

#[then("the code is valid")]
fn then_valid(#[from(valid)] valid: &Cell<Option<bool>>) {
    assert_eq!(valid.get(), Some(true));
}

#[then("the code is invalid")]
fn then_invalid(#[from(valid)] valid: &Cell<Option<bool>>) {
    assert_eq!(valid.get(), Some(false));
}

#[then("the precision is {expected:f64} metres")]
fn then_precision(expected: f64, #[from(code)] code: &RefCell<String>) {
    let actual = plus_code::precision_meters(&code.borrow());
    assert!((actual - expected).abs() <= 1e-9, "got {actual}");
}

#[then("the precision is reported as unknown")]
fn then_precision_unknown(#[from(code)] code: &RefCell<String>) {
    assert_eq!(plus_code::precision(&code.borrow()), None);
    assert_eq!(plus_code::precision_meters(&code.borrow()), -1.0);
}

macro_rules! register_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/plus_code.feature", name = $title)]
        fn $fn_name(code: RefCell<String>, valid: Cell<Option<bool>>) {
            let _ = (code, valid);
        }
    };
}

register_scenario!(full_length_code, "full-length code with refinement");
register_scenario!(short_code, "short code");
register_scenario!(missing_separator, "code without separator");
register_scenario!(refinement_too_long, "refinement that is too long");

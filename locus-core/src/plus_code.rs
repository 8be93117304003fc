//! Format checks for Open Location Code ("plus code") strings.
//!
//! Nothing here decodes a code to a position. The helpers only decide
//! whether a string is shaped like a plus code and estimate the size of the
//! area it names.

/// The base-20 plus-code alphabet.
pub const ALPHABET: &str = "23456789CFGHJMPQRVWX";

/// Separator between the main code and the refinement.
pub const SEPARATOR: char = '+';

/// Shortest and longest main segment.
const MAIN_LEN: std::ops::RangeInclusive<usize> = 2..=8;

/// Refinement characters accepted by [`is_valid_format`].
const STRICT_REFINEMENT_MAX: usize = 2;

/// Refinement characters accepted by the pattern and laxer checks.
const LAX_REFINEMENT_MAX: usize = 3;

/// Shortest and longest code accepted by [`is_likely_format`].
const LIKELY_TOTAL_LEN: std::ops::RangeInclusive<usize> = 3..=12;

/// Precision reported for any valid length missing from the table.
const DEFAULT_PRECISION_METERS: f64 = 312.5;

fn in_alphabet(ch: char) -> bool {
    ALPHABET.contains(ch)
}

/// Trimmed, uppercased code split at its single separator.
fn split(code: &str) -> Option<(String, String)> {
    let normalised = code.trim().to_uppercase();
    let (main, refinement) = normalised.split_once(SEPARATOR)?;
    if refinement.contains(SEPARATOR) {
        return None;
    }
    Some((main.to_owned(), refinement.to_owned()))
}

fn all_in_alphabet(main: &str, refinement: &str) -> bool {
    main.chars().chain(refinement.chars()).all(in_alphabet)
}

/// Strict structural check.
///
/// A valid code has exactly one `+`, an even-length main segment of 2 to 8
/// characters, at most two refinement characters, and only alphabet
/// characters. Case and surrounding whitespace are ignored.
///
/// # Examples
/// ```
/// use locus_core::plus_code;
///
/// assert!(plus_code::is_valid_format("8FVC2222+22"));
/// assert!(plus_code::is_valid_format("cfx3+xf"));
/// assert!(!plus_code::is_valid_format("8G4QVJ6W"));
/// assert!(!plus_code::is_valid_format("8G4QVJ6W+P45"));
/// assert!(!plus_code::is_valid_format("invalid+code"));
/// ```
#[must_use]
pub fn is_valid_format(code: &str) -> bool {
    let Some((main, refinement)) = split(code) else {
        return false;
    };
    MAIN_LEN.contains(&main.len())
        && main.len() % 2 == 0
        && refinement.chars().count() <= STRICT_REFINEMENT_MAX
        && all_in_alphabet(&main, &refinement)
}

/// Laxer pre-check for filtering pipelines.
///
/// Accepts up to three refinement characters and bounds the total length to
/// `3..=12`. Never panics; anything odd is simply `false`.
///
/// # Examples
/// ```
/// use locus_core::plus_code;
///
/// assert!(plus_code::is_likely_format("8G4QVJ6W+P45"));
/// assert!(!plus_code::is_likely_format("+22"));
/// assert!(!plus_code::is_likely_format(""));
/// ```
#[must_use]
pub fn is_likely_format(code: &str) -> bool {
    let Some((main, refinement)) = split(code) else {
        return false;
    };
    let total = main.chars().count() + 1 + refinement.chars().count();
    !main.is_empty()
        && LIKELY_TOTAL_LEN.contains(&total)
        && MAIN_LEN.contains(&main.len())
        && main.len() % 2 == 0
        && refinement.chars().count() <= LAX_REFINEMENT_MAX
        && all_in_alphabet(&main, &refinement)
}

/// Pattern check `^[ALPHABET]{2,8}\+[ALPHABET]{0,3}$` used for precision.
///
/// Unlike the other checks, odd main lengths pass.
#[must_use]
pub fn matches_pattern(code: &str) -> bool {
    let Some((main, refinement)) = split(code) else {
        return false;
    };
    MAIN_LEN.contains(&main.chars().count())
        && refinement.chars().count() <= LAX_REFINEMENT_MAX
        && all_in_alphabet(&main, &refinement)
}

/// Approximate edge length in metres of the area a code names.
///
/// Returns `None` when the code does not match the plus-code pattern. The
/// figure comes from a fixed table keyed by significant characters and is
/// not a geometric decode.
///
/// # Examples
/// ```
/// use locus_core::plus_code;
///
/// assert_eq!(plus_code::precision("8FVC2222+"), Some(312.5));
/// assert_eq!(plus_code::precision("8G4QVJ6W+P45"), Some(2.5));
/// assert_eq!(plus_code::precision("nope"), None);
/// ```
#[must_use]
pub fn precision(code: &str) -> Option<f64> {
    if !matches_pattern(code) {
        return None;
    }
    let (main, refinement) = split(code)?;
    let significant = main.len() + refinement.len();
    Some(match significant {
        2 => 2_500_000.0,
        4 => 125_000.0,
        6 => 6_250.0,
        8 => 312.5,
        9 => 62.5,
        10 => 12.5,
        11 => 2.5,
        _ => DEFAULT_PRECISION_METERS,
    })
}

/// [`precision`] with `-1.0` standing in for an invalid code.
#[must_use]
pub fn precision_meters(code: &str) -> f64 {
    precision(code).unwrap_or(-1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("8FVC2222+22", true)]
    #[case("CFX3+XF", true)]
    #[case(" 8fvc2222+22 ", true)]
    #[case("8G4QVJ6W+P4", true)]
    #[case("CF+", true)]
    #[case("invalid+code", false)]
    #[case("8G4QVJ6W", false)]
    #[case("8G4QVJ6W+P45", false)]
    #[case("8G4QVJ6W+P4X", false)]
    #[case("", false)]
    #[case("8FV+22", false)]
    #[case("8FVC2222C2+22", false)]
    #[case("8F+2+2", false)]
    #[case("10+22", false)]
    fn strict_validation(#[case] code: &str, #[case] expected: bool) {
        assert_eq!(is_valid_format(code), expected, "code {code:?}");
    }

    #[rstest]
    #[case("8G4QVJ6W+P45", true)]
    #[case("CF+", true)]
    #[case("+22", false)]
    #[case("8G4QVJ6W+P45X", false)]
    #[case("   ", false)]
    #[case("ÄÖ+ÜÜ", false)]
    fn likely_validation(#[case] code: &str, #[case] expected: bool) {
        assert_eq!(is_likely_format(code), expected, "code {code:?}");
    }

    #[rstest]
    #[case("8F+", 2_500_000.0)]
    #[case("8FVC+", 125_000.0)]
    #[case("8FVC22+", 6_250.0)]
    #[case("8FVC2222+", 312.5)]
    #[case("8FVC2222+2", 62.5)]
    #[case("8FVC2222+22", 12.5)]
    #[case("8FVC2222+22X", 2.5)]
    #[case("8FV+", 312.5)]
    #[case("invalid", -1.0)]
    #[case("", -1.0)]
    fn precision_table(#[case] code: &str, #[case] expected: f64) {
        assert_eq!(precision_meters(code), expected, "code {code:?}");
    }
}

//! Geocode requests and the address normalisation every provider applies.

use super::GeocodeError;

/// Addresses longer than this many characters are truncated.
pub const MAX_ADDRESS_CHARS: usize = 200;

/// A free-text address plus optional provider tuning.
///
/// Fields a provider does not understand are ignored by that provider.
///
/// # Examples
/// ```
/// use locus_core::GeocodeRequest;
///
/// let request = GeocodeRequest::new("1600 Pennsylvania Ave NW, Washington DC")
///     .with_country_code("us")
///     .with_max_tries(3);
/// assert_eq!(request.max_tries, Some(3));
/// ```
#[derive(Clone, PartialEq, Eq, Default)]
pub struct GeocodeRequest {
    /// Address to resolve.
    pub address: String,
    /// API key or token overriding the client's configured key.
    pub api_key: Option<String>,
    /// Attempts for providers with a bounded retry loop (Google, OSM).
    pub max_tries: Option<u32>,
    /// Preferred response language, e.g. `"en"`.
    pub locale: Option<String>,
    /// ISO 3166-1 alpha-2 country filter.
    pub country_code: Option<String>,
    /// Maximum number of candidates requested from OSM.
    pub limit: Option<u32>,
    /// Ask OSM for a structured address breakdown.
    pub address_details: bool,
}

impl GeocodeRequest {
    /// Create a request for `address` with no tuning.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Set the API key for this request.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the number of attempts for retrying providers.
    #[must_use]
    pub fn with_max_tries(mut self, max_tries: u32) -> Self {
        self.max_tries = Some(max_tries);
        self
    }

    /// Set the preferred response language.
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Restrict results to a country.
    #[must_use]
    pub fn with_country_code(mut self, country_code: impl Into<String>) -> Self {
        self.country_code = Some(country_code.into());
        self
    }

    /// Limit the number of OSM candidates.
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Request OSM address details.
    #[must_use]
    pub fn with_address_details(mut self, address_details: bool) -> Self {
        self.address_details = address_details;
        self
    }
}

impl std::fmt::Debug for GeocodeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocodeRequest")
            .field("address", &self.address)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("max_tries", &self.max_tries)
            .field("locale", &self.locale)
            .field("country_code", &self.country_code)
            .field("limit", &self.limit)
            .field("address_details", &self.address_details)
            .finish()
    }
}

/// An address that passed the shared validation rules.
///
/// # Examples
/// ```
/// use locus_core::NormalisedAddress;
///
/// let address = NormalisedAddress::parse("  10 Downing St  ")?;
/// assert_eq!(address.as_str(), "10 Downing St");
/// assert!(!address.was_truncated());
///
/// assert!(NormalisedAddress::parse("0").is_err());
/// assert!(NormalisedAddress::parse("?!").is_err());
/// # Ok::<(), locus_core::GeocodeError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalisedAddress {
    text: String,
    original_chars: usize,
}

impl NormalisedAddress {
    /// Trim, reject unusable input, and truncate to [`MAX_ADDRESS_CHARS`].
    ///
    /// Rejected: empty or whitespace-only text, the literal `"0"`, and text
    /// with no alphanumeric characters.
    pub fn parse(raw: &str) -> Result<Self, GeocodeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(GeocodeError::validation("address required"));
        }
        if trimmed == "0" {
            return Err(GeocodeError::validation(
                "0 is not properly geocoded by this provider",
            ));
        }

        let original_chars = trimmed.chars().count();
        let text = if original_chars > MAX_ADDRESS_CHARS {
            trimmed
                .chars()
                .take(MAX_ADDRESS_CHARS)
                .collect::<String>()
                .trim_end()
                .to_owned()
        } else {
            trimmed.to_owned()
        };

        if !text.chars().any(char::is_alphanumeric) {
            return Err(GeocodeError::validation(format!(
                "address had no numbers or letters: {text}"
            )));
        }

        Ok(Self {
            text,
            original_chars,
        })
    }

    /// The normalised address text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether the input exceeded [`MAX_ADDRESS_CHARS`].
    #[must_use]
    pub fn was_truncated(&self) -> bool {
        self.original_chars > MAX_ADDRESS_CHARS
    }

    /// Character count of the trimmed input before truncation.
    #[must_use]
    pub fn original_chars(&self) -> usize {
        self.original_chars
    }
}

impl AsRef<str> for NormalisedAddress {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

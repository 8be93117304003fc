//! The HTTP collaborator every provider client talks through.
//!
//! Provider clients never manage connections themselves. They describe a
//! request as an [`HttpRequest`] and hand it to a [`Transport`], which returns
//! the status code and body or a [`TransportError`]. Non-2xx statuses are not
//! transport errors: classifying them is the client's job.

mod client;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

pub use self::client::{ReqwestTransport, TransportBuildError};

/// Placeholder written in place of secret query values.
pub const REDACTED: &str = "REDACTED";

/// HTTP method of an outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    /// `GET`.
    #[default]
    Get,
    /// `POST`.
    Post,
}

impl HttpMethod {
    /// Return the method as an uppercase `&str`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// A single query parameter; secret values are masked when rendered.
#[derive(Clone, PartialEq, Eq)]
pub struct QueryParam {
    /// Parameter name.
    pub name: String,
    /// Unencoded parameter value.
    pub value: String,
    /// Whether the value is a credential.
    pub secret: bool,
}

impl QueryParam {
    /// A plain parameter.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            secret: false,
        }
    }

    /// A credential parameter, masked in logs and error messages.
    pub fn secret(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            secret: true,
            ..Self::new(name, value)
        }
    }

    fn display_value(&self) -> &str {
        if self.secret { REDACTED } else { &self.value }
    }
}

impl std::fmt::Debug for QueryParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryParam")
            .field("name", &self.name)
            .field("value", &self.display_value())
            .field("secret", &self.secret)
            .finish()
    }
}

/// Everything a transport needs to issue one request.
///
/// `Display` renders the method and the redacted URL, so a request can be
/// logged directly.
///
/// # Examples
/// ```
/// use locus_data::transport::HttpRequest;
///
/// let request = HttpRequest::get("https://api.example.com/", "/v1/search")
///     .with_query("text", "10 Downing St")
///     .with_secret_query("apiKey", "hunter2");
/// let url = request.redacted_url();
/// assert!(url.starts_with("https://api.example.com/v1/search?text=10+Downing+St"));
/// assert!(url.contains("apiKey=REDACTED"));
/// assert!(!url.contains("hunter2"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Request method.
    pub method: HttpMethod,
    /// Scheme and host, e.g. `https://nominatim.openstreetmap.org`.
    pub base_url: String,
    /// Path below the base URL.
    pub path: String,
    /// Query parameters in order.
    pub query: Vec<QueryParam>,
    /// Extra request headers.
    pub headers: Vec<(String, String)>,
    /// Optional request body.
    pub body: Option<String>,
}

impl HttpRequest {
    /// A `GET` request without query parameters.
    pub fn get(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            base_url: base_url.into(),
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Append a plain query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push(QueryParam::new(name, value));
        self
    }

    /// Append a credential query parameter.
    #[must_use]
    pub fn with_secret_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push(QueryParam::secret(name, value));
        self
    }

    /// Append several query parameters.
    #[must_use]
    pub fn with_params(mut self, params: impl IntoIterator<Item = QueryParam>) -> Self {
        self.query.extend(params);
        self
    }

    /// Add a request header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Value of the first header named `name`, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Value of the first query parameter named `name`.
    #[must_use]
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|param| param.name == name)
            .map(|param| param.value.as_str())
    }

    /// Full URL including secret values.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] when the base URL and path do
    /// not form a valid absolute URL.
    pub fn url(&self) -> Result<Url, TransportError> {
        self.build_url(|param| param.value.as_str())
    }

    /// URL with secret values replaced by [`REDACTED`], safe to log.
    #[must_use]
    pub fn redacted_url(&self) -> String {
        self.build_url(QueryParam::display_value)
            .map_or_else(|_| self.joined(), String::from)
    }

    fn joined(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }

    fn build_url<'a>(
        &'a self,
        value: impl Fn(&'a QueryParam) -> &'a str,
    ) -> Result<Url, TransportError> {
        let mut url = Url::parse(&self.joined()).map_err(|err| TransportError::InvalidUrl {
            message: err.to_string(),
        })?;
        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for param in &self.query {
                pairs.append_pair(&param.name, value(param));
            }
        }
        Ok(url)
    }
}

impl std::fmt::Display for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method.as_str(), self.redacted_url())
    }
}

/// Status code and body returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    /// Build a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Failures below the HTTP status line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection, DNS or TLS failure.
    #[error("network error: {message}")]
    Network {
        /// Transport error description.
        message: String,
    },
    /// The request did not complete within the configured timeout.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The caller's cancellation token fired first.
    #[error("request cancelled")]
    Cancelled,
    /// The request could not be turned into a URL.
    #[error("invalid request URL: {message}")]
    InvalidUrl {
        /// Parser error description.
        message: String,
    },
}

/// Sends HTTP requests on behalf of provider clients.
///
/// Implementations must return promptly with [`TransportError::Cancelled`]
/// once `cancel` fires instead of waiting for a timeout.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue `request` and return the raw response.
    async fn send(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, TransportError> {
        (**self).send(request, cancel).await
    }
}

//! [`Transport`] backed by a shared `reqwest` client.

use async_trait::async_trait;
use reqwest::{Client, Method};
use tokio_util::sync::CancellationToken;

use super::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
use crate::config::HttpTransportConfig;

/// Error type for transport and runtime construction failures.
#[derive(Debug)]
pub enum TransportBuildError {
    /// Failed to build the HTTP client.
    HttpClient(reqwest::Error),
    /// Failed to build the Tokio runtime.
    Runtime(std::io::Error),
}

impl std::fmt::Display for TransportBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HttpClient(err) => write!(f, "failed to build HTTP client: {err}"),
            Self::Runtime(err) => write!(f, "failed to build Tokio runtime: {err}"),
        }
    }
}

impl std::error::Error for TransportBuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::HttpClient(err) => Some(err),
            Self::Runtime(err) => Some(err),
        }
    }
}

/// HTTP transport over `reqwest` with rustls.
///
/// The underlying client pools connections, so one transport should be shared
/// (behind an `Arc`) by every provider client.
///
/// # Example
///
/// ```no_run
/// use locus_data::HttpTransportConfig;
/// use locus_data::transport::ReqwestTransport;
/// use std::time::Duration;
///
/// let config = HttpTransportConfig::default()
///     .with_timeout(Duration::from_secs(10))
///     .with_user_agent("my-app/1.0");
/// let transport = ReqwestTransport::with_config(config)?;
/// # Ok::<(), locus_data::transport::TransportBuildError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    config: HttpTransportConfig,
}

impl ReqwestTransport {
    /// Create a transport with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new() -> Result<Self, TransportBuildError> {
        Self::with_config(HttpTransportConfig::default())
    }

    /// Create a transport with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_config(config: HttpTransportConfig) -> Result<Self, TransportBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout())
            .timeout(config.timeout())
            .build()
            .map_err(TransportBuildError::HttpClient)?;
        Ok(Self { client, config })
    }

    /// The configuration this transport was built with.
    #[must_use]
    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url()?;
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };
        let mut builder = self.client.request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| self.convert_reqwest_error(&err))?;
        Ok(HttpResponse { status, body })
    }

    /// Convert a reqwest error to a [`TransportError`].
    fn convert_reqwest_error(&self, error: &reqwest::Error) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout {
                timeout_secs: self.config.timeout_secs,
            };
        }
        TransportError::Network {
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, TransportError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(TransportError::Cancelled),
            result = self.execute(request) => result,
        }
    }
}

//! HTTP [`TrafficProvider`] for a JSON traffic service.
//!
//! The service is expected to answer `GET {base_url}/traffic?area={key}` with
//! a camelCase [`TrafficData`] document.

use std::time::Duration;

use async_trait::async_trait;
use carpool_core::{TrafficData, TrafficError, TrafficProvider};
use reqwest::Client;
use thiserror::Error;
use url::Url;

/// Error type for [`HttpTrafficProvider`] construction failures.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// The configured base URL does not parse.
    #[error("invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        /// Offending URL.
        url: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },
}

/// Default user agent for traffic and advisor requests.
pub const DEFAULT_USER_AGENT: &str = "carpool-engine/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for [`HttpTrafficProvider`].
#[derive(Debug, Clone)]
pub struct HttpTrafficProviderConfig {
    /// Base URL for the traffic service (e.g., `"http://localhost:8080"`).
    pub base_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpTrafficProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpTrafficProviderConfig {
    /// Create a new configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Traffic provider backed by a JSON HTTP endpoint.
///
/// One call is one HTTP attempt; retries and caching belong to
/// [`TrafficCache`](super::TrafficCache).
#[derive(Debug, Clone)]
pub struct HttpTrafficProvider {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpTrafficProvider {
    /// Create a provider with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client fails
    /// to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(HttpTrafficProviderConfig::new(base_url))
    }

    /// Create a provider with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client fails
    /// to build.
    pub fn with_config(config: HttpTrafficProviderConfig) -> Result<Self, ProviderBuildError> {
        let endpoint = traffic_endpoint(&config.base_url)?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        Ok(Self {
            client,
            endpoint,
            timeout: config.timeout,
        })
    }

    fn request_url(&self, key: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("area", key);
        url
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> TrafficError {
        if error.is_timeout() {
            return TrafficError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return TrafficError::HttpError {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        TrafficError::NetworkError {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl TrafficProvider for HttpTrafficProvider {
    async fn fetch_traffic(&self, key: &str) -> Result<TrafficData, TrafficError> {
        if key.is_empty() {
            return Err(TrafficError::EmptyKey);
        }
        let url = self.request_url(key);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url.as_str()))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, url.as_str()))?;

        response
            .json::<TrafficData>()
            .await
            .map_err(|err| TrafficError::ParseError {
                message: err.to_string(),
            })
    }
}

fn traffic_endpoint(base_url: &str) -> Result<Url, ProviderBuildError> {
    let invalid = |source| ProviderBuildError::InvalidBaseUrl {
        url: base_url.to_owned(),
        source,
    };
    let mut base = Url::parse(base_url).map_err(invalid)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("traffic").map_err(invalid)
}

//! HTTP fetch client with bounded retry
//!
//! Every outbound call a collector makes goes through [`FetchClient`]:
//! - Each attempt is bounded by its own timeout
//! - Transient failures (timeout, connection error, 5xx, 429) are retried
//!   up to the configured count with growing, capped backoff
//! - Non-transient failures (4xx other than 429) fail immediately
//! - Exhausting retries surfaces one aggregated error carrying the attempt
//!   count and the last underlying failure

use super::rate_limit::RateLimit;
use crate::auth::AuthConfig;
use crate::error::{Error, Result};
use crate::types::{BackoffType, Method, StringMap};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the fetch client
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Timeout applied to each individual attempt
    pub timeout: Duration,
    /// Maximum number of retries (total attempts = retries + 1)
    pub max_retries: u32,
    /// Initial delay for backoff
    pub initial_backoff: Duration,
    /// Cap on the backoff delay
    pub max_backoff: Duration,
    /// Backoff growth strategy
    pub backoff_type: BackoffType,
    /// Outbound requests per second (None = unlimited)
    pub rate_limit_rps: Option<u32>,
    /// Default headers for all requests
    pub default_headers: StringMap,
    /// User agent string
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(30),
            backoff_type: BackoffType::Exponential,
            rate_limit_rps: None,
            default_headers: StringMap::new(),
            user_agent: format!("hazard-pipeline/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetchConfig {
    /// Create a new config builder
    pub fn builder() -> FetchConfigBuilder {
        FetchConfigBuilder::default()
    }
}

/// Builder for fetch client config
#[derive(Default)]
pub struct FetchConfigBuilder {
    config: FetchConfig,
}

impl FetchConfigBuilder {
    /// Set the per-attempt timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set backoff configuration
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.backoff_type = backoff_type;
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    /// Limit outbound requests per second
    pub fn rate_limit_rps(mut self, rps: u32) -> Self {
        self.config.rate_limit_rps = Some(rps);
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> FetchConfig {
        self.config
    }
}

/// Per-request overrides and payload
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    /// Query parameters
    pub query: StringMap,
    /// Request headers
    pub headers: StringMap,
    /// Request body (JSON)
    pub body: Option<Value>,
    /// Override timeout for this request
    pub timeout: Option<Duration>,
    /// Override max retries for this request
    pub max_retries: Option<u32>,
}

impl FetchRequest {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set per-attempt timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set max retries
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }
}

/// HTTP client with bounded retry and rate limiting
pub struct FetchClient {
    client: Client,
    config: FetchConfig,
    auth: AuthConfig,
    rate_limit: Option<RateLimit>,
}

impl FetchClient {
    /// Create a fetch client with default configuration
    pub fn new() -> Self {
        Self::with_config(FetchConfig::default())
    }

    /// Create a fetch client with custom configuration
    pub fn with_config(config: FetchConfig) -> Self {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .expect("Failed to build HTTP client");

        let rate_limit = config.rate_limit_rps.map(RateLimit::per_second);

        Self {
            client,
            config,
            auth: AuthConfig::None,
            rate_limit,
        }
    }

    /// Create a fetch client with resolved credentials
    pub fn with_auth(config: FetchConfig, auth: AuthConfig) -> Self {
        let mut client = Self::with_config(config);
        client.auth = auth;
        client
    }

    /// Get the underlying reqwest client (streaming collectors use this)
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Make a GET request
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.request(Method::GET, url, FetchRequest::default()).await
    }

    /// Make a GET request with per-request config
    pub async fn get_with(&self, url: &str, request: FetchRequest) -> Result<Response> {
        self.request(Method::GET, url, request).await
    }

    /// Make a GET request and parse the JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.request(Method::GET, url, FetchRequest::default()).await?;
        let json: T = response.json().await.map_err(Error::Http)?;
        Ok(json)
    }

    /// Make a request, retrying transient failures per the configured policy
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        request: FetchRequest,
    ) -> Result<Response> {
        let max_retries = request.max_retries.unwrap_or(self.config.max_retries);
        let max_attempts = max_retries + 1;
        let timeout = request.timeout.unwrap_or(self.config.timeout);

        let mut last_error: Option<Error> = None;
        let mut retry_after: Option<Duration> = None;

        for attempt in 0..max_attempts {
            if attempt > 0 {
                let delay = retry_after
                    .take()
                    .unwrap_or_else(|| self.calculate_backoff(attempt - 1));
                warn!(
                    url,
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "retrying fetch"
                );
                tokio::time::sleep(delay).await;
            }

            if let Some(ref limit) = self.rate_limit {
                limit.acquire().await;
            }

            let mut req = self.client.request(method.into(), url);

            for (key, value) in &self.config.default_headers {
                req = req.header(key.as_str(), value.as_str());
            }
            for (key, value) in &request.headers {
                req = req.header(key.as_str(), value.as_str());
            }
            if !request.query.is_empty() {
                req = req.query(&request.query);
            }
            if let Some(ref body) = request.body {
                req = req.json(body);
            }
            req = req.timeout(timeout);
            req = self.auth.apply(req);

            match req.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let seconds = extract_retry_after(&response);
                        retry_after = Some(std::cmp::min(
                            Duration::from_secs(seconds),
                            self.config.max_backoff,
                        ));
                        last_error = Some(Error::RateLimited {
                            retry_after_seconds: seconds,
                        });
                        continue;
                    }

                    if status.is_server_error() {
                        last_error = Some(Error::http_status(status.as_u16(), String::new()));
                        continue;
                    }

                    // Remaining client errors are permanent, fail without retry
                    if status.is_client_error() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(Error::http_status(status.as_u16(), body));
                    }

                    debug!(url, status = status.as_u16(), "fetch succeeded");
                    return Ok(response);
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_error = Some(Error::Timeout {
                            timeout_ms: timeout.as_millis() as u64,
                        });
                        continue;
                    }
                    if e.is_connect() {
                        last_error = Some(Error::Http(e));
                        continue;
                    }
                    // Request construction or body errors cannot be fixed by retrying
                    return Err(Error::Http(e));
                }
            }
        }

        let last = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Err(Error::RetriesExhausted {
            attempts: max_attempts,
            last,
        })
    }

    /// Calculate backoff delay for a given (zero-based) retry attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let delay = match self.config.backoff_type {
            BackoffType::Constant => self.config.initial_backoff,
            BackoffType::Linear => self.config.initial_backoff * (attempt + 1),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                self.config.initial_backoff * factor
            }
        };

        std::cmp::min(delay, self.config.max_backoff)
    }
}

impl Default for FetchClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FetchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchClient")
            .field("config", &self.config)
            .field("auth", &self.auth)
            .field("has_rate_limit", &self.rate_limit.is_some())
            .finish_non_exhaustive()
    }
}

/// Extract retry-after header value in seconds
fn extract_retry_after(response: &Response) -> u64 {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(30)
}

//! HTTP client with the combined retry state machine
//!
//! Issues one attempt at a time and classifies the outcome into a
//! [`BackoffDecision`]: transient failures (429, 5xx, and transport errors
//! that never saw a status) go back through the [`RetryTimer`], persistent client
//! errors surface immediately, and everything else is returned to the
//! caller as an owned [`HttpResponse`].

use super::backoff::{BackoffDecision, BackoffPolicy, RetryTimer, RetryVerdict};
use super::cache::RequestCache;
use super::rate_limit::{ApiBudget, ApiBudgetConfig};
use super::request::{HttpRequest, RequestBody};
use super::response::HttpResponse;
use crate::auth::{Authenticator, NoAuth};
use crate::error::{is_transient_transport_error, Error, Result};
use crate::types::StringMap;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default maximum idle connections kept per host
pub const MAX_CONNECTION_POOL_SIZE: usize = 20;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Maximum idle connections kept per host
    pub max_connections: usize,
    /// Default headers for all requests
    pub default_headers: StringMap,
    /// User agent string
    pub user_agent: String,
    /// Call-rate budget configuration; `None` disables budgeting
    pub api_budget: Option<ApiBudgetConfig>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_connections: MAX_CONNECTION_POOL_SIZE,
            default_headers: StringMap::new(),
            user_agent: format!("wirepull/{}", env!("CARGO_PKG_VERSION")),
            api_budget: None,
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection pool size
    pub fn max_connections(mut self, max: usize) -> Self {
        self.config.max_connections = max;
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

    /// Set the call-rate budget
    pub fn api_budget(mut self, config: ApiBudgetConfig) -> Self {
        self.config.api_budget = Some(config);
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// HTTP client owning the pooled session, authenticator, optional cache,
/// and optional call-rate budget
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    authenticator: Arc<dyn Authenticator>,
    budget: Option<ApiBudget>,
    cache: Option<RequestCache>,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Self {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .pool_max_idle_per_host(config.max_connections)
            .build()
            .expect("Failed to build HTTP client");

        let budget = config.api_budget.as_ref().map(ApiBudget::new);

        Self {
            client,
            config,
            authenticator: Arc::new(NoAuth),
            budget,
            cache: None,
        }
    }

    /// Attach an authenticator; its headers are merged into every attempt
    /// and win over request headers on conflict
    #[must_use]
    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = authenticator;
        self
    }

    /// Attach a caller-owned response cache
    #[must_use]
    pub fn with_cache(mut self, cache: RequestCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// The attached cache, if any
    pub fn cache(&self) -> Option<&RequestCache> {
        self.cache.as_ref()
    }

    /// The attached authenticator
    pub fn authenticator(&self) -> &Arc<dyn Authenticator> {
        &self.authenticator
    }

    /// Check if a call-rate budget is configured
    pub fn has_api_budget(&self) -> bool {
        self.budget.is_some()
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Send a request, retrying per `policy` until success, a
    /// non-retryable outcome, or an exhausted retry budget.
    ///
    /// A cache hit bypasses both the network and the retry loop.
    pub async fn send(
        &self,
        request: &HttpRequest,
        policy: &dyn BackoffPolicy,
    ) -> Result<HttpResponse> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(request) {
                debug!("Cache hit: {} {}", request.method, request.url);
                return Ok(hit);
            }
        }

        let mut timer = RetryTimer::from_policy(policy);

        loop {
            if let Some(budget) = &self.budget {
                budget.acquire().await;
            }

            match self.send_once(request).await {
                Ok(response) => {
                    let decision = if policy.should_retry(&response) {
                        BackoffDecision::Retry {
                            after: policy.backoff_time(&response),
                        }
                    } else {
                        BackoffDecision::Fail {
                            propagate: !response.is_success() && policy.raise_on_http_errors(),
                        }
                    };

                    match decision {
                        BackoffDecision::Retry { after } => match timer.next_attempt(after) {
                            RetryVerdict::Sleep(delay) => {
                                warn!(
                                    "Retryable response {} from {}, try {}, backing off {:.1}s",
                                    response.status(),
                                    request.url,
                                    timer.completed_tries(),
                                    delay.as_secs_f64()
                                );
                                tokio::time::sleep(delay).await;
                            }
                            RetryVerdict::GiveUp => {
                                warn!(
                                    "Giving up on {} after {} tries (last status {})",
                                    request.url,
                                    timer.completed_tries(),
                                    response.status()
                                );
                                return Err(self.status_error(policy, &response));
                            }
                        },
                        BackoffDecision::Fail { propagate: true } => {
                            return Err(self.status_error(policy, &response));
                        }
                        BackoffDecision::Fail { propagate: false } => {
                            if let Some(cache) = &self.cache {
                                cache.store(request, &response);
                            }
                            return Ok(response);
                        }
                    }
                }
                Err(Error::Http(err)) if is_transient_transport_error(&err) => {
                    match timer.next_attempt(None) {
                        RetryVerdict::Sleep(delay) => {
                            warn!(
                                "Transport error on {} ({}), try {}, backing off {:.1}s",
                                request.url,
                                err,
                                timer.completed_tries(),
                                delay.as_secs_f64()
                            );
                            tokio::time::sleep(delay).await;
                        }
                        RetryVerdict::GiveUp => {
                            warn!(
                                "Giving up on {} after {} tries ({})",
                                request.url,
                                timer.completed_tries(),
                                err
                            );
                            return Err(Error::Http(err));
                        }
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Issue exactly one attempt
    async fn send_once(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut req = self
            .client
            .request(request.method.into(), request.url.clone());

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }
        // Auth headers are fetched per attempt so refreshed tokens apply
        // to retries, and override everything else on conflict
        for (key, value) in self.authenticator.auth_headers().await? {
            req = req.header(key.as_str(), value.as_str());
        }

        match &request.body {
            Some(RequestBody::Json(value)) => req = req.json(value),
            Some(RequestBody::Form(form)) => req = req.form(form),
            None => {}
        }

        debug!("Sending request: {} {}", request.method, request.url);
        let response = req.send().await.map_err(Error::Http)?;
        let response = HttpResponse::from_reqwest(response)
            .await
            .map_err(Error::Http)?;
        debug!(
            "Received response: {} from {} ({} bytes)",
            response.status(),
            response.url(),
            response.body().len()
        );
        Ok(response)
    }

    fn status_error(&self, policy: &dyn BackoffPolicy, response: &HttpResponse) -> Error {
        Error::http_status(
            response.status(),
            policy.error_message(response),
            response.text(),
        )
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_cache", &self.cache.is_some())
            .field("has_api_budget", &self.budget.is_some())
            .finish_non_exhaustive()
    }
}


//! HTTP fetch client for the storefront API.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::retry::RetryPolicy;
use crate::timeout::TimeoutConfig;

/// Error type for fetch operations.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Request error: {0}")]
    Request(String),
}

impl FetchError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else if err.is_decode() {
            FetchError::Deserialization(err.to_string())
        } else {
            FetchError::Request(err.to_string())
        }
    }
}

/// Fetch policy combining timeout and retry configuration.
///
/// The default applies no timeout and never retries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Timeout configuration, `None` to wait indefinitely.
    pub timeout: Option<TimeoutConfig>,
    /// Retry policy.
    pub retry: RetryPolicy,
}

impl FetchPolicy {
    pub fn new(timeout: Option<TimeoutConfig>, retry: RetryPolicy) -> Self {
        Self { timeout, retry }
    }
}

/// JSON-over-HTTP client bound to a base URL.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: reqwest::Client,
    base_url: String,
    policy: FetchPolicy,
}

impl FetchClient {
    /// Create a client with the default policy.
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        Self::with_policy(base_url, FetchPolicy::default())
    }

    /// Create a client with an explicit policy.
    pub fn with_policy(base_url: impl Into<String>, policy: FetchPolicy) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = policy.timeout {
            builder = builder.connect_timeout(timeout.connect);
        }
        let http = builder.build().map_err(FetchError::from_reqwest)?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            http,
            base_url,
            policy,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Build the absolute URL for a path below the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET a path and decode its JSON body, retrying per the policy.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = self.url(path);
        let retry = &self.policy.retry;
        let mut attempt = 0u32;

        loop {
            let err = match self.get_once(&url).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let retry_allowed = match &err {
                FetchError::Http { status, .. } => retry.should_retry_status(*status, attempt),
                FetchError::Timeout(_) => retry.should_retry_timeout(attempt),
                FetchError::Connection(_) => retry.should_retry_connection(attempt),
                _ => false,
            };
            if !retry_allowed {
                return Err(err);
            }

            let delay = retry.backoff.delay_for_attempt(attempt);
            warn!(%url, attempt, error = %err, ?delay, "fetch failed, retrying");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn get_once<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let mut request = self.http.get(url);
        if let Some(timeout) = self.policy.timeout {
            request = request.timeout(timeout.total);
        }

        let resp = request.send().await.map_err(FetchError::from_reqwest)?;

        let status = resp.status().as_u16();
        debug!(url, status, "fetch response");
        if status >= 400 {
            return Err(FetchError::Http {
                status,
                url: url.to_string(),
            });
        }

        resp.json::<T>().await.map_err(FetchError::from_reqwest)
    }
}

//! Shared HTTP plumbing for the JSON services
//!
//! Every client owns one [`ApiClient`]: a reqwest client carrying the
//! configured timeout and user agent, a per-service rate limiter, and the
//! retry policy for transient failures.

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::config::SourceConfig;
use crate::error::{Result, SourceError};
use crate::retry::{RetryPolicy, classify_status};

pub(crate) type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Direct rate limiter allowing `per_second` requests per second (at least one)
pub(crate) fn rate_limiter(per_second: u32) -> SharedRateLimiter {
    let quota = Quota::per_second(NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Rate-limited, retrying JSON client for one service
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    service: &'static str,
    rate_limiter: SharedRateLimiter,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Build a client for `service`, allowing `per_second` requests per second
    pub fn new(service: &'static str, config: &SourceConfig, per_second: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            service,
            rate_limiter: rate_limiter(per_second),
            retry: config.retry.clone(),
        })
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    /// GET a URL and decode the body as JSON
    pub async fn get_json(&self, url: Url) -> Result<Value> {
        self.get_json_with_headers(url, &[]).await
    }

    /// GET a URL with extra headers (API keys) and decode the body as JSON
    pub async fn get_json_with_headers(
        &self,
        url: Url,
        headers: &[(&'static str, String)],
    ) -> Result<Value> {
        let body = self.get_bytes_with_headers(url, headers).await?;
        serde_json::from_slice(&body).map_err(SourceError::from)
    }

    /// GET a URL with extra headers and return the raw body
    pub async fn get_bytes_with_headers(
        &self,
        url: Url,
        headers: &[(&'static str, String)],
    ) -> Result<Vec<u8>> {
        debug!(service = self.service, path = url.path(), "GET");

        self.retry
            .execute(self.service, || {
                let url = url.clone();
                async move {
                    self.rate_limiter.until_ready().await;

                    let mut request = self.client.get(url);
                    for (name, value) in headers {
                        request = request.header(*name, value);
                    }
                    let response = request.send().await?;

                    let status = response.status();
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(classify_status(self.service, status.as_u16(), body));
                    }

                    Ok(response.bytes().await?.to_vec())
                }
            })
            .await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("service", &self.service)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

/// Parse a base URL and append path segments
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|()| SourceError::Config(format!("not a base URL: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Lenient accessors over loosely typed JSON payloads
pub(crate) mod json {
    use serde_json::Value;

    /// String field, accepting numbers as well
    pub fn text(value: &Value, key: &str) -> Option<String> {
        match value.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Numeric field, accepting numeric strings
    pub fn number(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// A field that may hold one object or an array of them
    pub fn one_or_many<'a>(value: Option<&'a Value>) -> Vec<&'a Value> {
        match value {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(v @ Value::Object(_)) => vec![v],
            _ => Vec::new(),
        }
    }
}

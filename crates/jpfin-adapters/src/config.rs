//! Configuration for data source adapters
//!
//! Credentials and endpoints are read once, when the availability registry is
//! built. A missing credential only disables the source that needs it.

use jpfin_core::SourceId;
use jpfin_utils::{EnvLookup, parse_var};
use std::collections::BTreeSet;
use std::time::Duration;

use crate::error::{Result, SourceError};
use crate::retry::RetryPolicy;

/// EDINET API key (Subscription-Key)
pub const ENV_EDINET_API_KEY: &str = "EDINET_API_KEY";
/// e-Stat application id
pub const ENV_ESTAT_APP_ID: &str = "ESTAT_APP_ID";
/// NewsAPI key
pub const ENV_NEWS_API_KEY: &str = "NEWS_API_KEY";
/// Comma separated list of sources to switch off
pub const ENV_DISABLED_SOURCES: &str = "JPFIN_DISABLED_SOURCES";
/// HTTP request timeout in seconds
pub const ENV_HTTP_TIMEOUT_SECS: &str = "JPFIN_HTTP_TIMEOUT_SECS";
/// Maximum attempts per HTTP request
pub const ENV_HTTP_MAX_ATTEMPTS: &str = "JPFIN_HTTP_MAX_ATTEMPTS";
/// User-Agent sent to every service
pub const ENV_USER_AGENT: &str = "JPFIN_USER_AGENT";

const DEFAULT_USER_AGENT: &str = concat!("japanfinance-agent/", env!("CARGO_PKG_VERSION"));

/// Base URLs of the upstream services
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub edinet: String,
    pub tdnet: String,
    pub estat: String,
    pub boj: String,
    pub news: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            edinet: "https://api.edinet-fsa.go.jp/api/v2".to_string(),
            tdnet: "https://webapi.yanoshin.jp/webapi/tdnet".to_string(),
            estat: "https://api.e-stat.go.jp/rest/3.0/app/json".to_string(),
            boj: "https://www.stat-search.boj.or.jp/api/v1".to_string(),
            news: "https://newsapi.org/v2".to_string(),
        }
    }
}

/// Configuration for all data source adapters
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// EDINET API key (required for the filings source)
    pub edinet_api_key: Option<String>,

    /// e-Stat application id (required for the statistics source)
    pub estat_app_id: Option<String>,

    /// NewsAPI key (required for the news source)
    pub news_api_key: Option<String>,

    /// Sources switched off regardless of credentials
    pub disabled: BTreeSet<SourceId>,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,

    /// User-Agent header
    pub user_agent: String,

    /// Retry policy for transient HTTP failures
    pub retry: RetryPolicy,

    /// How many days back EDINET company search scans the document list
    pub edinet_lookback_days: u32,

    /// Service base URLs
    pub endpoints: Endpoints,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            edinet_api_key: None,
            estat_app_id: None,
            news_api_key: None,
            disabled: BTreeSet::new(),
            request_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry: RetryPolicy::default(),
            edinet_lookback_days: 14,
            endpoints: Endpoints::default(),
        }
    }
}

impl SourceConfig {
    /// Create a new configuration builder
    pub fn builder() -> SourceConfigBuilder {
        SourceConfigBuilder::default()
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        let lookup = jpfin_utils::process_env();
        Self::from_lookup(&lookup)
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: EnvLookup<'_>) -> Result<Self> {
        let mut builder = Self::builder();

        if let Some(key) = lookup(ENV_EDINET_API_KEY) {
            builder = builder.edinet_api_key(key);
        }
        if let Some(id) = lookup(ENV_ESTAT_APP_ID) {
            builder = builder.estat_app_id(id);
        }
        if let Some(key) = lookup(ENV_NEWS_API_KEY) {
            builder = builder.news_api_key(key);
        }
        if let Some(list) = lookup(ENV_DISABLED_SOURCES) {
            for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                let source = name.parse::<SourceId>().map_err(|e| {
                    SourceError::Config(format!("{ENV_DISABLED_SOURCES}: {e}"))
                })?;
                builder = builder.disable(source);
            }
        }
        if let Some(secs) =
            parse_var::<u64>(lookup, ENV_HTTP_TIMEOUT_SECS).map_err(SourceError::Config)?
        {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(attempts) =
            parse_var::<u32>(lookup, ENV_HTTP_MAX_ATTEMPTS).map_err(SourceError::Config)?
        {
            builder = builder.max_attempts(attempts);
        }
        if let Some(agent) = lookup(ENV_USER_AGENT) {
            builder = builder.user_agent(agent);
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout.is_zero() {
            return Err(SourceError::Config(
                "request timeout must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(SourceError::Config(
                "max attempts must be greater than 0".to_string(),
            ));
        }

        if self.user_agent.trim().is_empty() {
            return Err(SourceError::Config("user agent must not be empty".to_string()));
        }

        Ok(())
    }

    pub fn is_disabled(&self, source: SourceId) -> bool {
        self.disabled.contains(&source)
    }
}

/// Builder for SourceConfig
#[derive(Debug, Default)]
pub struct SourceConfigBuilder {
    edinet_api_key: Option<String>,
    estat_app_id: Option<String>,
    news_api_key: Option<String>,
    disabled: BTreeSet<SourceId>,
    request_timeout: Option<Duration>,
    user_agent: Option<String>,
    retry: Option<RetryPolicy>,
    max_attempts: Option<u32>,
    edinet_lookback_days: Option<u32>,
    endpoints: Option<Endpoints>,
}

impl SourceConfigBuilder {
    /// Set the EDINET API key
    pub fn edinet_api_key(mut self, key: impl Into<String>) -> Self {
        self.edinet_api_key = Some(key.into());
        self
    }

    /// Set the e-Stat application id
    pub fn estat_app_id(mut self, id: impl Into<String>) -> Self {
        self.estat_app_id = Some(id.into());
        self
    }

    /// Set the NewsAPI key
    pub fn news_api_key(mut self, key: impl Into<String>) -> Self {
        self.news_api_key = Some(key.into());
        self
    }

    /// Switch a source off
    pub fn disable(mut self, source: SourceId) -> Self {
        self.disabled.insert(source);
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set the User-Agent header
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the retry policy
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Override the attempt budget of the retry policy
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Set how far back EDINET company search looks
    pub fn edinet_lookback_days(mut self, days: u32) -> Self {
        self.edinet_lookback_days = Some(days);
        self
    }

    /// Override service base URLs
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<SourceConfig> {
        let defaults = SourceConfig::default();

        let mut retry = self.retry.unwrap_or(defaults.retry);
        if let Some(attempts) = self.max_attempts {
            retry.max_attempts = attempts;
        }

        let config = SourceConfig {
            edinet_api_key: self.edinet_api_key,
            estat_app_id: self.estat_app_id,
            news_api_key: self.news_api_key,
            disabled: self.disabled,
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
            retry,
            edinet_lookback_days: self
                .edinet_lookback_days
                .unwrap_or(defaults.edinet_lookback_days),
            endpoints: self.endpoints.unwrap_or(defaults.endpoints),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = SourceConfig::default();
        assert!(config.edinet_api_key.is_none());
        assert!(config.disabled.is_empty());
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_reads_credentials() {
        let lookup = lookup_from(&[
            (ENV_EDINET_API_KEY, "edinet-key"),
            (ENV_ESTAT_APP_ID, "estat-id"),
            (ENV_DISABLED_SOURCES, "news, boj"),
            (ENV_HTTP_TIMEOUT_SECS, "12"),
        ]);

        let config = SourceConfig::from_lookup(&lookup).unwrap();

        assert_eq!(config.edinet_api_key.as_deref(), Some("edinet-key"));
        assert_eq!(config.estat_app_id.as_deref(), Some("estat-id"));
        assert!(config.news_api_key.is_none());
        assert!(config.is_disabled(SourceId::News));
        assert!(config.is_disabled(SourceId::Boj));
        assert!(!config.is_disabled(SourceId::Tdnet));
        assert_eq!(config.request_timeout, Duration::from_secs(12));
    }

    #[test]
    fn test_from_lookup_rejects_unknown_source() {
        let lookup = lookup_from(&[(ENV_DISABLED_SOURCES, "edinet,bloomberg")]);
        let err = SourceConfig::from_lookup(&lookup).unwrap_err();
        assert!(err.to_string().contains("bloomberg"));
    }

    #[test]
    fn test_from_lookup_rejects_malformed_timeout() {
        let lookup = lookup_from(&[(ENV_HTTP_TIMEOUT_SECS, "thirty")]);
        assert!(SourceConfig::from_lookup(&lookup).is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let result = SourceConfig::builder()
            .request_timeout(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_max_attempts_override() {
        let config = SourceConfig::builder()
            .retry(RetryPolicy::fast())
            .max_attempts(5)
            .build()
            .unwrap();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_backoff, Duration::from_millis(10));
    }
}

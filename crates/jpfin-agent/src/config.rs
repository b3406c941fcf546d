//! Configuration for the compound operations

use jpfin_utils::{EnvLookup, parse_var};
use std::time::Duration;

use crate::error::{AgentError, Result};
use crate::validate;

/// Per-task timeout in seconds
pub const ENV_TASK_TIMEOUT_SECS: &str = "JPFIN_TASK_TIMEOUT_SECS";
/// Default BOJ series for the macro snapshot
pub const ENV_BOJ_SERIES: &str = "JPFIN_BOJ_SERIES";

/// Uncollateralized overnight call rate, daily average
pub const DEFAULT_BOJ_SERIES: &str = "FM01'STRDCLUCON";

/// Largest accepted per-task timeout
pub const MAX_TASK_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration for [`FinanceAgent`](crate::FinanceAgent)
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Budget for each source task; EDINET lookups can take over a minute
    pub task_timeout: Duration,

    /// Disclosures fetched for one company by `analyze_company`
    pub disclosure_limit: usize,

    /// Disclosures fetched per company by `earnings_monitor`
    pub monitor_disclosure_limit: usize,

    /// Statistics tables fetched by `macro_snapshot`
    pub statistics_limit: usize,

    /// Headlines fetched per request
    pub headline_limit: usize,

    /// Calendar days of price history
    pub price_window_days: u32,

    /// Statistics keyword used when `macro_snapshot` gets none
    pub default_macro_keyword: String,

    /// Central-bank series used when `macro_snapshot` gets none
    pub default_boj_series: String,

    /// Largest accepted watchlist
    pub max_watchlist: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            task_timeout: Duration::from_secs(90),
            disclosure_limit: 10,
            monitor_disclosure_limit: 5,
            statistics_limit: 5,
            headline_limit: 10,
            price_window_days: 30,
            default_macro_keyword: "GDP".to_string(),
            default_boj_series: DEFAULT_BOJ_SERIES.to_string(),
            max_watchlist: 20,
        }
    }
}

impl AgentConfig {
    /// Create a new configuration builder
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        let lookup = jpfin_utils::process_env();
        Self::from_lookup(&lookup)
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: EnvLookup<'_>) -> Result<Self> {
        let mut builder = Self::builder();

        let secs = parse_var::<f64>(lookup, ENV_TASK_TIMEOUT_SECS).map_err(AgentError::Config)?;
        if let Some(secs) = secs {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(AgentError::Config(format!(
                    "{ENV_TASK_TIMEOUT_SECS} must be a positive number of seconds"
                )));
            }
            let timeout = Duration::try_from_secs_f64(secs)
                .map_err(|e| AgentError::Config(format!("{ENV_TASK_TIMEOUT_SECS}: {e}")))?;
            builder = builder.task_timeout(timeout);
        }
        if let Some(series) = lookup(ENV_BOJ_SERIES) {
            builder = builder.default_boj_series(series);
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.task_timeout.is_zero() {
            return Err(AgentError::Config(
                "task timeout must be greater than 0".to_string(),
            ));
        }
        if self.task_timeout > MAX_TASK_TIMEOUT {
            return Err(AgentError::Config(format!(
                "task timeout must be at most {}s",
                MAX_TASK_TIMEOUT.as_secs()
            )));
        }

        let limits = [
            ("disclosure_limit", self.disclosure_limit),
            ("monitor_disclosure_limit", self.monitor_disclosure_limit),
            ("statistics_limit", self.statistics_limit),
            ("headline_limit", self.headline_limit),
            ("max_watchlist", self.max_watchlist),
        ];
        if let Some((name, _)) = limits.iter().find(|(_, value)| *value == 0) {
            return Err(AgentError::Config(format!("{name} must be greater than 0")));
        }

        if self.price_window_days == 0 {
            return Err(AgentError::Config(
                "price_window_days must be greater than 0".to_string(),
            ));
        }

        validate::keyword(&self.default_macro_keyword)
            .map_err(|e| AgentError::Config(format!("default macro keyword: {e}")))?;
        validate::boj_series(&self.default_boj_series)
            .map_err(|e| AgentError::Config(format!("default BOJ series: {e}")))?;

        Ok(())
    }
}

/// Builder for AgentConfig
#[derive(Debug, Default)]
pub struct AgentConfigBuilder {
    task_timeout: Option<Duration>,
    disclosure_limit: Option<usize>,
    monitor_disclosure_limit: Option<usize>,
    statistics_limit: Option<usize>,
    headline_limit: Option<usize>,
    price_window_days: Option<u32>,
    default_macro_keyword: Option<String>,
    default_boj_series: Option<String>,
    max_watchlist: Option<usize>,
}

impl AgentConfigBuilder {
    /// Set the per-task timeout
    pub fn task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = Some(timeout);
        self
    }

    pub fn disclosure_limit(mut self, limit: usize) -> Self {
        self.disclosure_limit = Some(limit);
        self
    }

    pub fn monitor_disclosure_limit(mut self, limit: usize) -> Self {
        self.monitor_disclosure_limit = Some(limit);
        self
    }

    pub fn statistics_limit(mut self, limit: usize) -> Self {
        self.statistics_limit = Some(limit);
        self
    }

    pub fn headline_limit(mut self, limit: usize) -> Self {
        self.headline_limit = Some(limit);
        self
    }

    pub fn price_window_days(mut self, days: u32) -> Self {
        self.price_window_days = Some(days);
        self
    }

    pub fn default_macro_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.default_macro_keyword = Some(keyword.into());
        self
    }

    pub fn default_boj_series(mut self, series: impl Into<String>) -> Self {
        self.default_boj_series = Some(series.into());
        self
    }

    pub fn max_watchlist(mut self, max: usize) -> Self {
        self.max_watchlist = Some(max);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AgentConfig> {
        let defaults = AgentConfig::default();

        let config = AgentConfig {
            task_timeout: self.task_timeout.unwrap_or(defaults.task_timeout),
            disclosure_limit: self.disclosure_limit.unwrap_or(defaults.disclosure_limit),
            monitor_disclosure_limit: self
                .monitor_disclosure_limit
                .unwrap_or(defaults.monitor_disclosure_limit),
            statistics_limit: self.statistics_limit.unwrap_or(defaults.statistics_limit),
            headline_limit: self.headline_limit.unwrap_or(defaults.headline_limit),
            price_window_days: self.price_window_days.unwrap_or(defaults.price_window_days),
            default_macro_keyword: self
                .default_macro_keyword
                .unwrap_or(defaults.default_macro_keyword),
            default_boj_series: self.default_boj_series.unwrap_or(defaults.default_boj_series),
            max_watchlist: self.max_watchlist.unwrap_or(defaults.max_watchlist),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.task_timeout, Duration::from_secs(90));
        assert_eq!(config.disclosure_limit, 10);
        assert_eq!(config.monitor_disclosure_limit, 5);
        assert_eq!(config.default_macro_keyword, "GDP");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = AgentConfig::builder()
            .task_timeout(Duration::from_secs(5))
            .headline_limit(3)
            .build()
            .unwrap();
        assert_eq!(config.task_timeout, Duration::from_secs(5));
        assert_eq!(config.headline_limit, 3);
        assert_eq!(config.statistics_limit, 5);
    }

    #[test]
    fn test_validation_rejects_zero_limits() {
        assert!(AgentConfig::builder().task_timeout(Duration::ZERO).build().is_err());
        let err = AgentConfig::builder().max_watchlist(0).build().unwrap_err();
        assert!(err.to_string().contains("max_watchlist"));
        assert!(AgentConfig::builder().default_boj_series("nope").build().is_err());
    }

    #[test]
    fn test_from_lookup() {
        let lookup = |name: &str| match name {
            ENV_TASK_TIMEOUT_SECS => Some("2.5".to_string()),
            _ => None,
        };
        let config = AgentConfig::from_lookup(&lookup).unwrap();
        assert_eq!(config.task_timeout, Duration::from_millis(2500));
        assert_eq!(config.default_boj_series, DEFAULT_BOJ_SERIES);
    }

    #[test]
    fn test_from_lookup_rejects_bad_timeout() {
        let lookup = |name: &str| (name == ENV_TASK_TIMEOUT_SECS).then(|| "-1".to_string());
        assert!(AgentConfig::from_lookup(&lookup).is_err());

        let lookup = |name: &str| (name == ENV_TASK_TIMEOUT_SECS).then(|| "soon".to_string());
        let err = AgentConfig::from_lookup(&lookup).unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
    }

    #[test]
    fn test_from_lookup_rejects_huge_timeout() {
        for value in ["1e30", "15000000000000000000", "86401"] {
            let lookup = |name: &str| (name == ENV_TASK_TIMEOUT_SECS).then(|| value.to_string());
            let err = AgentConfig::from_lookup(&lookup).unwrap_err();
            assert!(matches!(err, AgentError::Config(_)), "accepted {value}");
        }

        let lookup = |name: &str| (name == ENV_TASK_TIMEOUT_SECS).then(|| "86400".to_string());
        let config = AgentConfig::from_lookup(&lookup).unwrap();
        assert_eq!(config.task_timeout, MAX_TASK_TIMEOUT);
    }

    #[test]
    fn test_builder_rejects_timeout_above_max() {
        let err = AgentConfig::builder()
            .task_timeout(Duration::MAX)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("at most"));
    }
}

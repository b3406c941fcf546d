//! Yahoo Finance daily price client
//!
//! Tokyo Stock Exchange listings are quoted as `<code>.T`.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jpfin_core::{AdapterResult, PriceBar, PriceSeries, PriceSource};
use time::OffsetDateTime;
use tracing::debug;
use yahoo_finance_api as yahoo;

use crate::error::{Result, SourceError};
use crate::http::{SharedRateLimiter, rate_limiter};

/// Yahoo Finance symbol for a TSE securities code
pub fn tse_symbol(code: &str) -> String {
    format!("{code}.T")
}

/// Yahoo Finance client
pub struct YahooPriceClient {
    connector: yahoo::YahooConnector,
    rate_limiter: SharedRateLimiter,
}

impl YahooPriceClient {
    /// Create a new Yahoo Finance client
    pub fn new() -> Result<Self> {
        let connector =
            yahoo::YahooConnector::new().map_err(|e| SourceError::YahooFinance(e.to_string()))?;

        Ok(Self {
            connector,
            rate_limiter: rate_limiter(2),
        })
    }

    async fn history(&self, symbol: &str, days: u32) -> Result<Vec<PriceBar>> {
        let end = Utc::now();
        let start = end - Duration::days(i64::from(days.max(1)));

        // yahoo_finance_api takes time::OffsetDateTime
        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| SourceError::YahooFinance(format!("Invalid start timestamp: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| SourceError::YahooFinance(format!("Invalid end timestamp: {e}")))?;

        self.rate_limiter.until_ready().await;
        let response = self
            .connector
            .get_quote_history(symbol, start_odt, end_odt)
            .await
            .map_err(|e| SourceError::YahooFinance(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| SourceError::YahooFinance(e.to_string()))?;

        Ok(quotes
            .iter()
            .filter_map(|q| {
                Some(PriceBar {
                    date: trading_date(q.timestamp as i64)?,
                    open: q.open,
                    high: q.high,
                    low: q.low,
                    close: q.close,
                    volume: q.volume,
                })
            })
            .collect())
    }
}

impl std::fmt::Debug for YahooPriceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooPriceClient").finish_non_exhaustive()
    }
}

#[async_trait]
impl PriceSource for YahooPriceClient {
    async fn price_series(&self, code: &str, days: u32) -> AdapterResult<Option<PriceSeries>> {
        let symbol = tse_symbol(code);
        let bars = self.history(&symbol, days).await?;
        debug!(%symbol, bars = bars.len(), "price history");

        if bars.is_empty() {
            return Ok(None);
        }

        Ok(Some(PriceSeries {
            code: code.to_string(),
            symbol,
            bars,
        }))
    }
}

/// Tokyo calendar date of a bar timestamp
fn trading_date(timestamp: i64) -> Option<String> {
    let at = DateTime::from_timestamp(timestamp, 0)?;
    Some(jpfin_core::jst_date(at).format("%Y-%m-%d").to_string())
}

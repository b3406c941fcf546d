//! Adapter capability traits and the payloads they return
//!
//! Each data source exposes a narrow set of fetch operations. The core only
//! ever talks to adapters through these traits; how a concrete adapter
//! authenticates, paginates or parses is its own business.
//!
//! Operations return an empty collection (or `None`) when the call succeeded
//! but nothing matched, and an [`AdapterError`](crate::AdapterError) when the
//! call itself failed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::AdapterResult;
use crate::registry::SourceStatus;

/// Company found through the filings source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    /// EDINET entity code (e.g. "E02144")
    pub edinet_code: String,
    /// Filer name
    pub name: String,
    /// Four-digit securities code, when listed
    pub ticker: Option<String>,
}

/// Annual report data for one company and fiscal period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatements {
    pub edinet_code: String,
    pub company_name: String,
    /// Fiscal period year the report was selected for
    pub period: String,
    /// EDINET document id of the report
    pub doc_id: String,
    pub document_description: Option<String>,
    pub filing_date: Option<String>,
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub accounting_standard: Option<String>,
    /// Named metrics grouped by category (profitability, stability, ...)
    #[serde(default)]
    pub metrics: BTreeMap<String, BTreeMap<String, f64>>,
    pub document_url: Option<String>,
}

/// Timely disclosure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disclosure {
    pub pubdate: String,
    pub company_code: String,
    pub company_name: String,
    pub title: String,
    pub category: Option<String>,
    pub document_url: Option<String>,
}

/// Government statistics table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsTable {
    pub stats_id: String,
    pub title: String,
    pub survey_date: Option<String>,
    pub gov_org: Option<String>,
}

/// Single observation of an indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: String,
    pub value: Option<f64>,
}

/// Central-bank indicator time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub code: String,
    pub name: String,
    pub unit: Option<String>,
    pub frequency: Option<String>,
    /// Most recent observations, oldest first
    pub observations: Vec<Observation>,
}

/// News headline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub source_name: Option<String>,
    pub published: Option<String>,
    pub url: Option<String>,
}

/// Daily OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Recent daily price history for one listed company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    /// Four-digit securities code
    pub code: String,
    /// Symbol used upstream (e.g. "7203.T")
    pub symbol: String,
    /// Bars, oldest first
    pub bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Most recent bar
    pub fn latest(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Percentage change between first and last close of the window
    pub fn change_pct(&self) -> Option<f64> {
        let first = self.bars.first()?.close;
        let last = self.bars.last()?.close;
        if first == 0.0 {
            return None;
        }
        Some((last - first) / first * 100.0)
    }
}

/// Payload of a successful fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum SourceData {
    Statements(FinancialStatements),
    Companies(Vec<CompanyRecord>),
    Disclosures(Vec<Disclosure>),
    Statistics(Vec<StatsTable>),
    Indicator(IndicatorSeries),
    Headlines(Vec<Headline>),
    Prices(PriceSeries),
    /// Availability marker produced by the source-health check
    Status(SourceStatus),
}

impl SourceData {
    /// Wrap a disclosure list; an empty list means "no data"
    pub fn disclosures(items: Vec<Disclosure>) -> Option<Self> {
        (!items.is_empty()).then_some(SourceData::Disclosures(items))
    }

    pub fn companies(items: Vec<CompanyRecord>) -> Option<Self> {
        (!items.is_empty()).then_some(SourceData::Companies(items))
    }

    pub fn statistics(items: Vec<StatsTable>) -> Option<Self> {
        (!items.is_empty()).then_some(SourceData::Statistics(items))
    }

    pub fn headlines(items: Vec<Headline>) -> Option<Self> {
        (!items.is_empty()).then_some(SourceData::Headlines(items))
    }

    /// A series without observations carries no data
    pub fn indicator(series: Option<IndicatorSeries>) -> Option<Self> {
        series
            .filter(|s| !s.observations.is_empty())
            .map(SourceData::Indicator)
    }

    pub fn prices(series: Option<PriceSeries>) -> Option<Self> {
        series.filter(|s| !s.bars.is_empty()).map(SourceData::Prices)
    }

    pub fn statements(statements: Option<FinancialStatements>) -> Option<Self> {
        statements.map(SourceData::Statements)
    }

    /// Number of items carried, for summaries
    pub fn item_count(&self) -> usize {
        match self {
            SourceData::Companies(v) => v.len(),
            SourceData::Disclosures(v) => v.len(),
            SourceData::Statistics(v) => v.len(),
            SourceData::Headlines(v) => v.len(),
            SourceData::Indicator(s) => s.observations.len(),
            SourceData::Prices(s) => s.bars.len(),
            SourceData::Statements(_) | SourceData::Status(_) => 1,
        }
    }
}

/// Securities filings (EDINET)
#[async_trait]
pub trait FilingsSource: Send + Sync {
    /// Search companies by name or securities code
    async fn search_companies(&self, query: &str) -> AdapterResult<Vec<CompanyRecord>>;

    /// Annual report data for an entity and fiscal period
    async fn financial_statements(
        &self,
        edinet_code: &str,
        period: &str,
    ) -> AdapterResult<Option<FinancialStatements>>;
}

/// Timely disclosures (TDnet)
#[async_trait]
pub trait DisclosureSource: Send + Sync {
    /// Recent disclosures for one company, newest first
    async fn company_disclosures(&self, code: &str, limit: usize) -> AdapterResult<Vec<Disclosure>>;

    /// Most recent disclosures across all companies
    async fn latest_disclosures(&self, limit: usize) -> AdapterResult<Vec<Disclosure>>;
}

/// Government statistics (e-Stat)
#[async_trait]
pub trait StatisticsSource: Send + Sync {
    async fn search_tables(&self, keyword: &str, limit: usize) -> AdapterResult<Vec<StatsTable>>;
}

/// Central-bank statistics (BOJ)
#[async_trait]
pub trait CentralBankSource: Send + Sync {
    async fn indicator(&self, series_code: &str) -> AdapterResult<Option<IndicatorSeries>>;
}

/// Financial news headlines
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn headlines(&self, query: Option<&str>, limit: usize) -> AdapterResult<Vec<Headline>>;
}

/// Daily stock prices
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Daily bars covering the last `days` calendar days
    async fn price_series(&self, code: &str, days: u32) -> AdapterResult<Option<PriceSeries>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(close: f64) -> PriceBar {
        PriceBar {
            date: "2026-01-05".to_string(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 100,
        }
    }

    #[test]
    fn test_empty_collections_are_no_data() {
        assert!(SourceData::disclosures(Vec::new()).is_none());
        assert!(SourceData::headlines(Vec::new()).is_none());
        assert!(SourceData::prices(Some(PriceSeries {
            code: "7203".to_string(),
            symbol: "7203.T".to_string(),
            bars: Vec::new(),
        }))
        .is_none());
    }

    #[test]
    fn test_price_change_pct() {
        let series = PriceSeries {
            code: "7203".to_string(),
            symbol: "7203.T".to_string(),
            bars: vec![bar(2000.0), bar(2100.0), bar(2200.0)],
        };
        let change = series.change_pct().unwrap();
        assert!((change - 10.0).abs() < 1e-9);
        assert_eq!(series.latest().unwrap().close, 2200.0);
    }

    #[test]
    fn test_source_data_tagging() {
        let data = SourceData::Headlines(vec![Headline {
            title: "日銀、政策金利を据え置き".to_string(),
            source_name: None,
            published: None,
            url: None,
        }]);
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["kind"], "headlines");
        assert_eq!(json["data"][0]["title"], "日銀、政策金利を据え置き");
        assert_eq!(data.item_count(), 1);
    }
}

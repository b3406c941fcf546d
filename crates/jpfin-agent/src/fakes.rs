//! In-memory sources with call-count spies, for tests

use async_trait::async_trait;
use jpfin_core::{
    AdapterError, AdapterResult, AvailabilityRegistry, CentralBankSource, CompanyRecord,
    Disclosure, DisclosureSource, FilingsSource, FinancialStatements, Headline, IndicatorSeries,
    NewsSource, Observation, PriceBar, PriceSeries, PriceSource, SourceId, StatisticsSource,
    StatsTable, Unavailable,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// How a fake answers every call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Behavior {
    Data,
    Empty,
    Fail,
    Hang,
}

#[derive(Debug)]
pub(crate) struct FakeSource {
    behavior: Behavior,
    lookup: Behavior,
    calls: AtomicUsize,
    lookups: AtomicUsize,
}

impl FakeSource {
    pub(crate) fn new(behavior: Behavior) -> Arc<Self> {
        Self::with_lookup(behavior, Behavior::Data)
    }

    /// A filings fake whose company search behaves differently
    pub(crate) fn with_lookup(behavior: Behavior, lookup: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            lookup,
            calls: AtomicUsize::new(0),
            lookups: AtomicUsize::new(0),
        })
    }

    /// Fetch calls, company searches excluded
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    async fn respond<T>(
        behavior: Behavior,
        counter: &AtomicUsize,
        data: T,
        empty: T,
    ) -> AdapterResult<T> {
        counter.fetch_add(1, Ordering::SeqCst);
        match behavior {
            Behavior::Data => Ok(data),
            Behavior::Empty => Ok(empty),
            Behavior::Fail => Err(AdapterError::Network("connection reset by peer".to_string())),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(empty)
            }
        }
    }

    async fn answer<T>(&self, data: T, empty: T) -> AdapterResult<T> {
        Self::respond(self.behavior, &self.calls, data, empty).await
    }
}

pub(crate) fn disclosure(code: &str, title: &str) -> Disclosure {
    Disclosure {
        pubdate: "2026-05-08 15:00".to_string(),
        company_code: code.to_string(),
        company_name: format!("Company {code}"),
        title: title.to_string(),
        category: Some("earnings".to_string()),
        document_url: Some(format!("https://www.release.tdnet.info/{code}.pdf")),
    }
}

pub(crate) fn statements(edinet_code: &str, period: &str) -> FinancialStatements {
    FinancialStatements {
        edinet_code: edinet_code.to_string(),
        company_name: "トヨタ自動車株式会社".to_string(),
        period: period.to_string(),
        doc_id: "S100TEST".to_string(),
        document_description: Some("有価証券報告書".to_string()),
        filing_date: Some("2025-06-18".to_string()),
        period_start: Some("2024-04-01".to_string()),
        period_end: Some("2025-03-31".to_string()),
        accounting_standard: Some("IFRS".to_string()),
        metrics: BTreeMap::new(),
        document_url: None,
    }
}

#[async_trait]
impl FilingsSource for FakeSource {
    async fn search_companies(&self, query: &str) -> AdapterResult<Vec<CompanyRecord>> {
        let hit = CompanyRecord {
            edinet_code: "E02144".to_string(),
            name: "トヨタ自動車株式会社".to_string(),
            ticker: Some(query.to_string()),
        };
        Self::respond(self.lookup, &self.lookups, vec![hit], Vec::new()).await
    }

    async fn financial_statements(
        &self,
        edinet_code: &str,
        period: &str,
    ) -> AdapterResult<Option<FinancialStatements>> {
        self.answer(Some(statements(edinet_code, period)), None).await
    }
}

#[async_trait]
impl DisclosureSource for FakeSource {
    async fn company_disclosures(
        &self,
        code: &str,
        limit: usize,
    ) -> AdapterResult<Vec<Disclosure>> {
        let items = vec![
            disclosure(code, "2026年3月期 決算短信"),
            disclosure(code, "剰余金の配当に関するお知らせ"),
        ];
        self.answer(items.into_iter().take(limit).collect(), Vec::new()).await
    }

    async fn latest_disclosures(&self, limit: usize) -> AdapterResult<Vec<Disclosure>> {
        let items = vec![disclosure("9984", "自己株式の取得状況に関するお知らせ")];
        self.answer(items.into_iter().take(limit).collect(), Vec::new()).await
    }
}

#[async_trait]
impl StatisticsSource for FakeSource {
    async fn search_tables(&self, keyword: &str, _limit: usize) -> AdapterResult<Vec<StatsTable>> {
        let table = StatsTable {
            stats_id: "0003109741".to_string(),
            title: format!("{keyword} 四半期別速報"),
            survey_date: Some("202503".to_string()),
            gov_org: Some("内閣府".to_string()),
        };
        self.answer(vec![table], Vec::new()).await
    }
}

#[async_trait]
impl CentralBankSource for FakeSource {
    async fn indicator(&self, series_code: &str) -> AdapterResult<Option<IndicatorSeries>> {
        let series = IndicatorSeries {
            code: series_code.to_string(),
            name: "Call rate".to_string(),
            unit: Some("percent".to_string()),
            frequency: Some("daily".to_string()),
            observations: vec![Observation {
                date: "20260515".to_string(),
                value: Some(0.477),
            }],
        };
        self.answer(Some(series), None).await
    }
}

#[async_trait]
impl NewsSource for FakeSource {
    async fn headlines(&self, query: Option<&str>, _limit: usize) -> AdapterResult<Vec<Headline>> {
        let headline = Headline {
            title: format!("Markets watch {}", query.unwrap_or("Japan")),
            source_name: Some("Nikkei".to_string()),
            published: Some("2026-05-15T06:00:00Z".to_string()),
            url: None,
        };
        self.answer(vec![headline], Vec::new()).await
    }
}

#[async_trait]
impl PriceSource for FakeSource {
    async fn price_series(&self, code: &str, _days: u32) -> AdapterResult<Option<PriceSeries>> {
        let bar = |date: &str, close: f64| PriceBar {
            date: date.to_string(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000_000,
        };
        let series = PriceSeries {
            code: code.to_string(),
            symbol: format!("{code}.T"),
            bars: vec![bar("2026-05-14", 2800.0), bar("2026-05-15", 2870.0)],
        };
        self.answer(Some(series), None).await
    }
}

/// One optional fake per slot; a missing fake resolves as unavailable
#[derive(Debug, Default, Clone)]
pub(crate) struct Fakes {
    pub filings: Option<Arc<FakeSource>>,
    pub disclosures: Option<Arc<FakeSource>>,
    pub statistics: Option<Arc<FakeSource>>,
    pub central_bank: Option<Arc<FakeSource>>,
    pub news: Option<Arc<FakeSource>>,
    pub prices: Option<Arc<FakeSource>>,
}

fn missing(source: SourceId) -> Unavailable {
    Unavailable::MissingCredential(format!("{} credential not set", source.display_name()))
}

impl Fakes {
    /// Every slot available, all answering the same way
    pub(crate) fn all(behavior: Behavior) -> Self {
        Self {
            filings: Some(FakeSource::new(behavior)),
            disclosures: Some(FakeSource::new(behavior)),
            statistics: Some(FakeSource::new(behavior)),
            central_bank: Some(FakeSource::new(behavior)),
            news: Some(FakeSource::new(behavior)),
            prices: Some(FakeSource::new(behavior)),
        }
    }

    /// No slot available
    pub(crate) fn none() -> Self {
        Self::default()
    }

    fn each(&self) -> impl Iterator<Item = &Arc<FakeSource>> {
        [
            &self.filings,
            &self.disclosures,
            &self.statistics,
            &self.central_bank,
            &self.news,
            &self.prices,
        ]
        .into_iter()
        .flatten()
    }

    /// Calls of any kind across every fake
    pub(crate) fn total_calls(&self) -> usize {
        self.each().map(|fake| fake.calls() + fake.lookups()).sum()
    }

    pub(crate) fn registry(&self) -> AvailabilityRegistry {
        let filings = self.filings.clone();
        let disclosures = self.disclosures.clone();
        let statistics = self.statistics.clone();
        let central_bank = self.central_bank.clone();
        let news = self.news.clone();
        let prices = self.prices.clone();

        AvailabilityRegistry::builder()
            .filings(move || {
                filings
                    .map(|f| f as Arc<dyn FilingsSource>)
                    .ok_or_else(|| missing(SourceId::Edinet))
            })
            .disclosures(move || {
                disclosures
                    .map(|f| f as Arc<dyn DisclosureSource>)
                    .ok_or_else(|| missing(SourceId::Tdnet))
            })
            .statistics(move || {
                statistics
                    .map(|f| f as Arc<dyn StatisticsSource>)
                    .ok_or_else(|| missing(SourceId::Estat))
            })
            .central_bank(move || {
                central_bank
                    .map(|f| f as Arc<dyn CentralBankSource>)
                    .ok_or_else(|| missing(SourceId::Boj))
            })
            .news(move || {
                news.map(|f| f as Arc<dyn NewsSource>)
                    .ok_or_else(|| missing(SourceId::News))
            })
            .prices(move || {
                prices
                    .map(|f| f as Arc<dyn PriceSource>)
                    .ok_or_else(|| missing(SourceId::StockPrice))
            })
            .build()
    }
}

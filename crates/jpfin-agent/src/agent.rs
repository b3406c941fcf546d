//! Compound operations over the data sources
//!
//! Each operation validates its input, declares a fixed set of fetch tasks,
//! runs them as one fan-out batch and merges the outcomes. Validation is the
//! only way an operation fails; everything that goes wrong afterwards is
//! recorded against the source it came from.

use chrono::{Datelike, NaiveDate};
use jpfin_core::{
    AggregatedResult, AvailabilityRegistry, FanOutExecutor, FetchOutcome, FetchTask,
    FilingsSource, Operation, SourceData, SourceId, TaskError, TaskKey, merge, today_jst,
};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::AgentConfig;
use crate::error::Result;
use crate::validate;

/// Securities code used by the live connection probe
const PROBE_CODE: &str = "7203";
const PROBE_PRICE_DAYS: u32 = 7;

/// Entry point for the compound operations
#[derive(Debug, Clone)]
pub struct FinanceAgent {
    registry: Arc<AvailabilityRegistry>,
    executor: FanOutExecutor,
    config: AgentConfig,
}

impl FinanceAgent {
    pub fn new(registry: Arc<AvailabilityRegistry>, config: AgentConfig) -> Self {
        let executor = FanOutExecutor::new(config.task_timeout);
        Self {
            registry,
            executor,
            config,
        }
    }

    pub fn registry(&self) -> &AvailabilityRegistry {
        &self.registry
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Filings, disclosures, headlines and prices for one company
    ///
    /// Without `entity_id` the filings task first looks the company up by
    /// its securities code; a failed or empty lookup marks that entry
    /// `DependencyUnresolved`. Without `period` the last completed fiscal
    /// year is used.
    pub async fn analyze_company(
        &self,
        code: &str,
        entity_id: Option<&str>,
        period: Option<&str>,
    ) -> Result<AggregatedResult> {
        let code = validate::stock_code(code)?;
        let entity_id = entity_id.map(validate::entity_id).transpose()?;
        let period = match period {
            Some(period) => validate::period(period)?,
            None => default_period(today_jst()),
        };

        info!(%code, ?entity_id, %period, "Analyzing company");

        let request = json!({
            "code": code,
            "entity_id": entity_id,
            "period": period,
        });

        let tasks = vec![
            self.statements_task(&code, entity_id, period),
            self.disclosures_task(&code, "disclosures", self.config.disclosure_limit),
            self.headlines_task(Some(code.clone())),
            self.prices_task(&code, "prices", self.config.price_window_days),
        ];

        Ok(self.execute(Operation::AnalyzeCompany, request, tasks).await)
    }

    /// Statistics tables, a central-bank series and headlines for a topic
    pub async fn macro_snapshot(
        &self,
        keyword: Option<&str>,
        boj_series: Option<&str>,
    ) -> Result<AggregatedResult> {
        let keyword = validate::keyword(keyword.unwrap_or(&self.config.default_macro_keyword))?;
        let series = validate::boj_series(boj_series.unwrap_or(&self.config.default_boj_series))?;

        info!(%keyword, %series, "Taking macro snapshot");

        let request = json!({
            "keyword": keyword,
            "boj_series": series,
        });

        let limit = self.config.statistics_limit;
        let query = keyword.clone();
        let statistics =
            FetchTask::bind(self.registry.statistics(), "statistics", move |estat| async move {
                Ok(SourceData::statistics(estat.search_tables(&query, limit).await?))
            });

        let central_bank =
            FetchTask::bind(self.registry.central_bank(), "central_bank", move |boj| async move {
                Ok(SourceData::indicator(boj.indicator(&series).await?))
            });

        let tasks = vec![statistics, central_bank, self.headlines_task(Some(keyword))];

        Ok(self.execute(Operation::MacroSnapshot, request, tasks).await)
    }

    /// Recent disclosures for every company on a watchlist, as one batch
    pub async fn earnings_monitor<S: AsRef<str>>(&self, codes: &[S]) -> Result<AggregatedResult> {
        let codes = validate::watchlist(codes, self.config.max_watchlist)?;

        info!(companies = codes.len(), "Monitoring earnings");

        let request = json!({ "codes": codes });
        let limit = self.config.monitor_disclosure_limit;
        let tasks = codes
            .iter()
            .map(|code| self.disclosures_task(code, &format!("disclosures:{code}"), limit))
            .collect();

        Ok(self.execute(Operation::EarningsMonitor, request, tasks).await)
    }

    /// Availability of every source, without contacting any of them
    pub fn check_data_sources(&self) -> AggregatedResult {
        let started = Instant::now();
        let (keys, outcomes): (Vec<_>, Vec<_>) = self
            .registry
            .status()
            .into_iter()
            .map(|status| {
                let key = TaskKey {
                    source: status.source,
                    section: status.source.as_str().to_string(),
                };
                let outcome = if status.available {
                    FetchOutcome::success(SourceData::Status(status))
                } else {
                    FetchOutcome::skipped(
                        status
                            .unavailable_reason
                            .unwrap_or_else(|| "unavailable".to_string()),
                    )
                };
                (key, outcome)
            })
            .unzip();

        let result = merge(
            Operation::CheckDataSources,
            json!({}),
            keys,
            outcomes,
            started.elapsed(),
        );
        info!(
            available = result.summary.succeeded,
            total = result.summary.total,
            "Checked data sources"
        );
        result
    }

    /// One cheap live call per source, to verify connectivity
    pub async fn probe_data_sources(&self) -> AggregatedResult {
        info!("Probing data sources");

        let keyword = self.config.default_macro_keyword.clone();
        let series = self.config.default_boj_series.clone();

        let registry = &self.registry;
        let tasks = vec![
            FetchTask::bind(registry.filings(), SourceId::Edinet.as_str(), |edinet| async move {
                Ok(SourceData::companies(edinet.search_companies(PROBE_CODE).await?))
            }),
            FetchTask::bind(registry.disclosures(), SourceId::Tdnet.as_str(), |tdnet| async move {
                Ok(SourceData::disclosures(tdnet.latest_disclosures(1).await?))
            }),
            FetchTask::bind(registry.statistics(), SourceId::Estat.as_str(), move |estat| {
                async move { Ok(SourceData::statistics(estat.search_tables(&keyword, 1).await?)) }
            }),
            FetchTask::bind(registry.central_bank(), SourceId::Boj.as_str(), move |boj| async move {
                Ok(SourceData::indicator(boj.indicator(&series).await?))
            }),
            FetchTask::bind(registry.news(), SourceId::News.as_str(), |news| async move {
                Ok(SourceData::headlines(news.headlines(None, 1).await?))
            }),
            self.prices_task(PROBE_CODE, SourceId::StockPrice.as_str(), PROBE_PRICE_DAYS),
        ];

        self.execute(Operation::ProbeDataSources, json!({}), tasks).await
    }

    fn statements_task(&self, code: &str, entity_id: Option<String>, period: String) -> FetchTask {
        let lookup_timeout = self.config.task_timeout;
        let needs_lookup = entity_id.is_none();
        let code = code.to_string();

        let task = FetchTask::bind(self.registry.filings(), "statements", move |edinet| async move {
            let edinet_code = match entity_id {
                Some(id) => id,
                None => resolve_entity_id(edinet.as_ref(), &code, lookup_timeout).await?,
            };
            Ok(SourceData::statements(
                edinet.financial_statements(&edinet_code, &period).await?,
            ))
        });

        // The lookup and the fetch each get the full budget.
        if needs_lookup {
            task.with_timeout(self.config.task_timeout.saturating_mul(2))
        } else {
            task
        }
    }

    fn disclosures_task(&self, code: &str, section: &str, limit: usize) -> FetchTask {
        let code = code.to_string();
        FetchTask::bind(self.registry.disclosures(), section, move |tdnet| async move {
            Ok(SourceData::disclosures(tdnet.company_disclosures(&code, limit).await?))
        })
    }

    fn headlines_task(&self, query: Option<String>) -> FetchTask {
        let limit = self.config.headline_limit;
        FetchTask::bind(self.registry.news(), "headlines", move |news| async move {
            Ok(SourceData::headlines(news.headlines(query.as_deref(), limit).await?))
        })
    }

    fn prices_task(&self, code: &str, section: &str, days: u32) -> FetchTask {
        let code = code.to_string();
        FetchTask::bind(self.registry.prices(), section, move |prices| async move {
            Ok(SourceData::prices(prices.price_series(&code, days).await?))
        })
    }

    async fn execute(
        &self,
        operation: Operation,
        request: serde_json::Value,
        tasks: Vec<FetchTask>,
    ) -> AggregatedResult {
        let started = Instant::now();
        let keys = tasks.iter().map(FetchTask::key).collect();
        let outcomes = self.executor.run(tasks).await;
        let result = merge(operation, request, keys, outcomes, started.elapsed());

        for entry in &result.entries {
            if let FetchOutcome::Failed { kind, message } = &entry.outcome {
                warn!(
                    source = %entry.source,
                    section = %entry.section,
                    %kind,
                    "{message}"
                );
            }
        }

        info!(
            operation = %operation,
            succeeded = result.summary.succeeded,
            empty = result.summary.empty,
            failed = result.summary.failed,
            skipped = result.summary.skipped,
            elapsed_ms = result.elapsed_ms,
            "Operation finished"
        );

        result
    }
}

/// Resolve a securities code to an EDINET entity code, taking the first hit
async fn resolve_entity_id(
    filings: &dyn FilingsSource,
    code: &str,
    timeout: Duration,
) -> std::result::Result<String, TaskError> {
    let hits = match tokio::time::timeout(timeout, filings.search_companies(code)).await {
        Ok(Ok(hits)) => hits,
        Ok(Err(e)) => {
            return Err(TaskError::dependency_unresolved(format!(
                "entity lookup for {code} failed: {e}"
            )));
        }
        Err(_) => {
            return Err(TaskError::dependency_unresolved(format!(
                "entity lookup for {code} timed out after {:.1}s",
                timeout.as_secs_f64()
            )));
        }
    };

    hits.into_iter()
        .next()
        .map(|company| company.edinet_code)
        .ok_or_else(|| {
            TaskError::dependency_unresolved(format!("no EDINET entity found for {code}"))
        })
}

/// Last fiscal year whose annual report should be filed by `today`
///
/// Japanese annual reports land in June, so from July the previous year's
/// report is available.
pub fn default_period(today: NaiveDate) -> String {
    let lag = if today.month() >= 7 { 1 } else { 2 };
    (today.year() - lag).to_string()
}

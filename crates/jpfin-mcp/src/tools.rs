//! The finance tools, one per compound operation
//!
//! Each tool deserializes its arguments, calls the agent and returns the
//! aggregated result as JSON.

use async_trait::async_trait;
use jpfin_agent::FinanceAgent;
use jpfin_core::AggregatedResult;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::error::McpError;
use crate::tool::{Tool, ToolRegistry};
use crate::Result;

fn arguments<T: DeserializeOwned>(params: Value) -> Result<T> {
    // Tools without arguments may be called with none at all.
    let params = if params.is_null() { json!({}) } else { params };
    serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))
}

fn to_value(result: &AggregatedResult) -> Result<Value> {
    Ok(serde_json::to_value(result)?)
}

/// Registry holding all four tools, bound to one agent
pub fn finance_tools(agent: Arc<FinanceAgent>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(AnalyzeCompanyTool::new(Arc::clone(&agent))));
    registry.register(Arc::new(MacroSnapshotTool::new(Arc::clone(&agent))));
    registry.register(Arc::new(MonitorEarningsTool::new(Arc::clone(&agent))));
    registry.register(Arc::new(CheckDataSourcesTool::new(agent)));
    registry
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AnalyzeArgs {
    code: String,
    #[serde(default)]
    edinet_code: Option<String>,
    #[serde(default)]
    period: Option<String>,
}

/// Company analysis across filings, disclosures, news and prices
pub struct AnalyzeCompanyTool {
    agent: Arc<FinanceAgent>,
}

impl AnalyzeCompanyTool {
    pub fn new(agent: Arc<FinanceAgent>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl Tool for AnalyzeCompanyTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let args: AnalyzeArgs = arguments(params)?;
        let result = self
            .agent
            .analyze_company(&args.code, args.edinet_code.as_deref(), args.period.as_deref())
            .await?;
        to_value(&result)
    }

    fn name(&self) -> &str {
        "analyze_japanese_company"
    }

    fn description(&self) -> &str {
        "Comprehensive analysis of a Japanese listed company. Combines EDINET financial \
         statements, TDnet disclosures, news headlines and stock prices into one result; \
         each section says whether its source succeeded, found nothing, failed or was skipped."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "4-digit stock code (e.g. \"7203\" for Toyota)",
                    "pattern": "^[0-9]{4}$"
                },
                "edinet_code": {
                    "type": "string",
                    "description": "EDINET code (e.g. \"E02144\"); looked up from the stock code when omitted"
                },
                "period": {
                    "type": "string",
                    "description": "Fiscal year of the annual report (e.g. \"2025\")"
                }
            },
            "required": ["code"],
            "additionalProperties": false
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MacroArgs {
    #[serde(default)]
    keyword: Option<String>,
    #[serde(default, alias = "boj_dataset")]
    boj_series: Option<String>,
}

/// Japanese macro-economic snapshot
pub struct MacroSnapshotTool {
    agent: Arc<FinanceAgent>,
}

impl MacroSnapshotTool {
    pub fn new(agent: Arc<FinanceAgent>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl Tool for MacroSnapshotTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let args: MacroArgs = arguments(params)?;
        let result = self
            .agent
            .macro_snapshot(args.keyword.as_deref(), args.boj_series.as_deref())
            .await?;
        to_value(&result)
    }

    fn name(&self) -> &str {
        "get_macro_snapshot"
    }

    fn description(&self) -> &str {
        "Macro-economic snapshot for Japan. Combines e-Stat government statistics, \
         a Bank of Japan time series and news headlines."
    }

    fn input_schema(&self) -> Value {
        let config = self.agent.config();
        json!({
            "type": "object",
            "properties": {
                "keyword": {
                    "type": "string",
                    "description": format!(
                        "e-Stat search keyword (e.g. \"GDP\", \"CPI\", \"雇用\"); defaults to \"{}\"",
                        config.default_macro_keyword
                    )
                },
                "boj_series": {
                    "type": "string",
                    "description": format!(
                        "BOJ series as DB'CODE; defaults to \"{}\"",
                        config.default_boj_series
                    )
                }
            },
            "additionalProperties": false
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MonitorArgs {
    codes: Vec<String>,
}

/// Disclosures across a watchlist
pub struct MonitorEarningsTool {
    agent: Arc<FinanceAgent>,
}

impl MonitorEarningsTool {
    pub fn new(agent: Arc<FinanceAgent>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl Tool for MonitorEarningsTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let args: MonitorArgs = arguments(params)?;
        let result = self.agent.earnings_monitor(args.codes.as_slice()).await?;
        to_value(&result)
    }

    fn name(&self) -> &str {
        "monitor_earnings"
    }

    fn description(&self) -> &str {
        "Recent TDnet disclosures (earnings, forecasts, dividends) for a watchlist of companies, \
         fetched concurrently."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "codes": {
                    "type": "array",
                    "items": { "type": "string", "pattern": "^[0-9]{4}$" },
                    "minItems": 1,
                    "maxItems": self.agent.config().max_watchlist,
                    "description": "4-digit stock codes (e.g. [\"7203\", \"6758\", \"6861\"])"
                }
            },
            "required": ["codes"],
            "additionalProperties": false
        })
    }
}

/// Which data sources are usable
pub struct CheckDataSourcesTool {
    agent: Arc<FinanceAgent>,
}

impl CheckDataSourcesTool {
    pub fn new(agent: Arc<FinanceAgent>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl Tool for CheckDataSourcesTool {
    async fn execute(&self, _params: Value) -> Result<Value> {
        to_value(&self.agent.check_data_sources())
    }

    fn name(&self) -> &str {
        "check_data_sources"
    }

    fn description(&self) -> &str {
        "Report which Japan finance data sources are configured and usable, and why any are not. \
         Does not contact the sources."
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jpfin_agent::AgentConfig;
    use jpfin_core::AvailabilityRegistry;

    fn tools() -> ToolRegistry {
        let registry = Arc::new(AvailabilityRegistry::builder().build());
        finance_tools(Arc::new(FinanceAgent::new(registry, AgentConfig::default())))
    }

    #[test]
    fn test_tool_names() {
        let names: Vec<String> = tools()
            .definitions()
            .iter()
            .map(|d| d["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            [
                "analyze_japanese_company",
                "check_data_sources",
                "get_macro_snapshot",
                "monitor_earnings"
            ]
        );
    }

    #[tokio::test]
    async fn test_analyze_returns_one_entry_per_source() {
        let tool = tools().get("analyze_japanese_company").unwrap();
        let out = tool.execute(json!({ "code": "7203" })).await.unwrap();

        assert_eq!(out["operation"], "analyze_company");
        assert_eq!(out["entries"].as_array().unwrap().len(), 4);
        assert_eq!(out["summary"]["skipped"], 4);
    }

    #[tokio::test]
    async fn test_macro_accepts_dataset_alias() {
        let tool = tools().get("get_macro_snapshot").unwrap();
        let out = tool
            .execute(json!({ "keyword": "CPI", "boj_dataset": "IR01'MADR1M" }))
            .await
            .unwrap();
        assert_eq!(out["request"]["boj_series"], "IR01'MADR1M");
    }

    #[tokio::test]
    async fn test_bad_arguments() {
        let registry = tools();

        let monitor = registry.get("monitor_earnings").unwrap();
        let err = monitor.execute(json!({ "codes": [] })).await.unwrap_err();
        assert!(matches!(err, McpError::Agent(ref e) if e.is_validation()));

        let err = monitor.execute(json!({ "codes": "7203" })).await.unwrap_err();
        assert!(matches!(err, McpError::InvalidParams(_)));

        let analyze = registry.get("analyze_japanese_company").unwrap();
        let err = analyze.execute(Value::Null).await.unwrap_err();
        assert!(matches!(err, McpError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn test_check_without_arguments() {
        let tool = tools().get("check_data_sources").unwrap();
        let out = tool.execute(Value::Null).await.unwrap();
        assert_eq!(out["entries"].as_array().unwrap().len(), 6);
    }
}

//! e-Stat (Portal Site of Official Statistics of Japan) client
//!
//! Uses the API 3.0 `getStatsList` endpoint to search statistics tables.
//!
//! App ID: free registration at https://www.e-stat.go.jp/api/

use async_trait::async_trait;
use jpfin_core::{AdapterResult, StatisticsSource, StatsTable};
use serde_json::Value;

use crate::config::SourceConfig;
use crate::error::{Result, SourceError};
use crate::http::{ApiClient, endpoint, json};

const SERVICE: &str = "e-Stat";

/// e-Stat result status for "finished normally, no matching data"
const STATUS_NO_DATA: u64 = 1;

/// e-Stat statistics client
#[derive(Debug)]
pub struct EstatClient {
    api: ApiClient,
    base_url: String,
    app_id: String,
}

impl EstatClient {
    pub fn new(app_id: impl Into<String>, config: &SourceConfig) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(SERVICE, config, 2)?,
            base_url: config.endpoints.estat.clone(),
            app_id: app_id.into(),
        })
    }
}

#[async_trait]
impl StatisticsSource for EstatClient {
    async fn search_tables(&self, keyword: &str, limit: usize) -> AdapterResult<Vec<StatsTable>> {
        let mut url = endpoint(&self.base_url, &["getStatsList"])?;
        url.query_pairs_mut()
            .append_pair("appId", &self.app_id)
            .append_pair("lang", "J")
            .append_pair("searchWord", keyword)
            .append_pair("limit", &limit.max(1).to_string());

        let body = self.api.get_json(url).await?;
        let mut tables = parse_stats_list(&body)?;
        tables.truncate(limit);
        Ok(tables)
    }
}

fn parse_stats_list(body: &Value) -> Result<Vec<StatsTable>> {
    let root = body
        .get("GET_STATS_LIST")
        .ok_or_else(|| SourceError::format(SERVICE, "missing GET_STATS_LIST"))?;

    let status = root
        .pointer("/RESULT/STATUS")
        .and_then(|v| v.as_u64().or_else(|| v.as_str()?.trim().parse().ok()))
        .ok_or_else(|| SourceError::format(SERVICE, "missing RESULT.STATUS"))?;

    match status {
        0 => {}
        STATUS_NO_DATA => return Ok(Vec::new()),
        code => {
            let message = root
                .pointer("/RESULT/ERROR_MSG")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(SourceError::Service {
                service: SERVICE,
                message: format!("status {code}: {message}"),
            });
        }
    }

    let tables = json::one_or_many(root.pointer("/DATALIST_INF/TABLE_INF"));
    Ok(tables.into_iter().filter_map(parse_table).collect())
}

fn parse_table(table: &Value) -> Option<StatsTable> {
    let stats_id = json::text(table, "@id")?;
    let title = table
        .get("TITLE")
        .and_then(inner_text)
        .or_else(|| table.get("STATISTICS_NAME").and_then(inner_text))
        .unwrap_or_else(|| stats_id.clone());

    Some(StatsTable {
        stats_id,
        title,
        survey_date: table
            .get("SURVEY_DATE")
            .and_then(inner_text)
            .filter(|d| d != "0"),
        gov_org: table.get("GOV_ORG").and_then(inner_text),
    })
}

/// e-Stat wraps text either bare or as `{"@code": .., "$": "text"}`
fn inner_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(_) => json::text(value, "$"),
        _ => None,
    }
}

//! Bank of Japan time-series statistics client
//!
//! Series are addressed as `DB'CODE` (e.g. `FM01'STRDCLUCON`), the notation
//! used on the BOJ statistics search site. No key needed.

use async_trait::async_trait;
use jpfin_core::{AdapterResult, CentralBankSource, IndicatorSeries, Observation};
use serde_json::Value;

use crate::config::SourceConfig;
use crate::error::{Result, SourceError};
use crate::http::{ApiClient, endpoint, json};

const SERVICE: &str = "BOJ";

/// How many of the most recent observations to keep
const MAX_OBSERVATIONS: usize = 24;

/// Bank of Japan statistics API client
#[derive(Debug)]
pub struct BojClient {
    api: ApiClient,
    base_url: String,
}

impl BojClient {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(SERVICE, config, 1)?,
            base_url: config.endpoints.boj.clone(),
        })
    }
}

#[async_trait]
impl CentralBankSource for BojClient {
    async fn indicator(&self, series_code: &str) -> AdapterResult<Option<IndicatorSeries>> {
        let (db, code) = split_series(series_code)?;

        let mut url = endpoint(&self.base_url, &["getDataCode"])?;
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("lang", "en")
            .append_pair("db", db)
            .append_pair("code", code);

        let body = self.api.get_json(url).await?;
        Ok(parse_data_code(&body, series_code)?)
    }
}

/// Split `DB'CODE` into its database and series parts
fn split_series(series: &str) -> Result<(&str, &str)> {
    series
        .split_once('\'')
        .filter(|(db, code)| !db.is_empty() && !code.is_empty())
        .ok_or_else(|| {
            SourceError::InvalidInput(format!("BOJ series must look like DB'CODE, got {series}"))
        })
}

fn parse_data_code(body: &Value, series_code: &str) -> Result<Option<IndicatorSeries>> {
    let status = body.get("STATUS").and_then(Value::as_u64);
    if status != Some(200) {
        let message = json::text(body, "MESSAGE").unwrap_or_else(|| "missing STATUS".to_string());
        return Err(SourceError::Service {
            service: SERVICE,
            message: match status {
                Some(code) => format!("status {code}: {message}"),
                None => message,
            },
        });
    }

    let Some(result) = json::one_or_many(body.get("RESULTSET")).into_iter().next() else {
        return Ok(None);
    };

    let dates = result
        .pointer("/VALUES/SURVEY_DATES")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::format(SERVICE, "missing VALUES.SURVEY_DATES"))?;
    let values = result
        .pointer("/VALUES/VALUES")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::format(SERVICE, "missing VALUES.VALUES"))?;

    let mut observations: Vec<Observation> = dates
        .iter()
        .zip(values)
        .filter_map(|(date, value)| {
            let date = match date {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            Some(Observation {
                date,
                value: json::number(value),
            })
        })
        .collect();

    if observations.len() > MAX_OBSERVATIONS {
        observations.drain(..observations.len() - MAX_OBSERVATIONS);
    }

    Ok(Some(IndicatorSeries {
        code: json::text(result, "SERIES_CODE").unwrap_or_else(|| series_code.to_string()),
        name: json::text(result, "NAME_OF_TIME_SERIES")
            .or_else(|| json::text(result, "NAME_OF_TIME_SERIES_J"))
            .unwrap_or_else(|| series_code.to_string()),
        unit: json::text(result, "UNIT").or_else(|| json::text(result, "UNIT_J")),
        frequency: json::text(result, "FREQUENCY"),
        observations,
    }))
}

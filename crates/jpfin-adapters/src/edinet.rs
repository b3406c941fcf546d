//! EDINET API v2 client
//!
//! EDINET publishes one document list per calendar day. Company search and
//! annual-report lookup both walk those daily lists: search scans a recent
//! window, report lookup scans the months in which annual securities reports
//! for a fiscal period are normally filed. Headline figures come from the
//! report's CSV archive (`type=5`).
//!
//! API Key: free registration at https://api.edinet-fsa.go.jp/
//! Rate Limit: unpublished; we stay at 3 requests per second

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use jpfin_core::{AdapterResult, CompanyRecord, FilingsSource, FinancialStatements, today_jst};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::io::{Cursor, Read};
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::config::SourceConfig;
use crate::error::{Result, SourceError};
use crate::http::{ApiClient, endpoint};

const SERVICE: &str = "EDINET";

/// Document type code of an annual securities report (有価証券報告書)
const ANNUAL_REPORT: &str = "120";

const MAX_SEARCH_RESULTS: usize = 10;

const ACCOUNTING_STANDARD: &str = "jpdei_cor:AccountingStandardsDEI";

/// Summary-of-business-results elements as (element id, category, metric)
const SUMMARY_ELEMENTS: &[(&str, &str, &str)] = &[
    ("jpcrp_cor:NetSalesSummaryOfBusinessResults", "scale", "revenue"),
    ("jpcrp_cor:RevenueIFRSSummaryOfBusinessResults", "scale", "revenue"),
    ("jpcrp_cor:RevenuesUSGAAPSummaryOfBusinessResults", "scale", "revenue"),
    ("jpcrp_cor:OperatingRevenue1SummaryOfBusinessResults", "scale", "revenue"),
    ("jpcrp_cor:OrdinaryIncomeLossSummaryOfBusinessResults", "scale", "ordinary_income"),
    (
        "jpcrp_cor:ProfitLossAttributableToOwnersOfParentSummaryOfBusinessResults",
        "scale",
        "net_income",
    ),
    (
        "jpcrp_cor:ProfitLossAttributableToOwnersOfParentIFRSSummaryOfBusinessResults",
        "scale",
        "net_income",
    ),
    (
        "jpcrp_cor:NetIncomeLossAttributableToOwnersOfParentUSGAAPSummaryOfBusinessResults",
        "scale",
        "net_income",
    ),
    ("jpcrp_cor:NetAssetsSummaryOfBusinessResults", "stability", "net_assets"),
    ("jpcrp_cor:TotalAssetsSummaryOfBusinessResults", "stability", "total_assets"),
    ("jpcrp_cor:TotalAssetsIFRSSummaryOfBusinessResults", "stability", "total_assets"),
    ("jpcrp_cor:EquityToAssetRatioSummaryOfBusinessResults", "stability", "equity_ratio"),
    (
        "jpcrp_cor:RatioOfOwnersEquityToGrossAssetsIFRSSummaryOfBusinessResults",
        "stability",
        "equity_ratio",
    ),
    ("jpcrp_cor:RateOfReturnOnEquitySummaryOfBusinessResults", "profitability", "roe"),
    ("jpcrp_cor:RateOfReturnOnEquityIFRSSummaryOfBusinessResults", "profitability", "roe"),
    ("jpcrp_cor:BasicEarningsLossPerShareSummaryOfBusinessResults", "per_share", "eps"),
    ("jpcrp_cor:BasicEarningsLossPerShareIFRSSummaryOfBusinessResults", "per_share", "eps"),
    ("jpcrp_cor:NetAssetsPerShareSummaryOfBusinessResults", "per_share", "bps"),
];

/// One row of the daily document list
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentEntry {
    #[serde(rename = "docID")]
    doc_id: String,
    edinet_code: Option<String>,
    sec_code: Option<String>,
    filer_name: Option<String>,
    doc_type_code: Option<String>,
    period_start: Option<String>,
    period_end: Option<String>,
    submit_date_time: Option<String>,
    doc_description: Option<String>,
    csv_flag: Option<String>,
}

impl DocumentEntry {
    /// Four-digit securities code (EDINET lists five digits with a check digit)
    fn ticker(&self) -> Option<String> {
        self.sec_code
            .as_deref()
            .and_then(|c| c.get(..4))
            .map(str::to_string)
    }

    fn has_csv(&self) -> bool {
        self.csv_flag.as_deref() == Some("1")
    }
}

/// Figures read from an annual report's CSV archive
#[derive(Debug, Default, PartialEq)]
struct ReportSummary {
    accounting_standard: Option<String>,
    metrics: BTreeMap<String, BTreeMap<String, f64>>,
}

/// EDINET API client
#[derive(Debug)]
pub struct EdinetClient {
    api: ApiClient,
    base_url: String,
    api_key: String,
    lookback_days: u32,
}

impl EdinetClient {
    pub fn new(api_key: impl Into<String>, config: &SourceConfig) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(SERVICE, config, 3)?,
            base_url: config.endpoints.edinet.clone(),
            api_key: api_key.into(),
            lookback_days: config.edinet_lookback_days.max(1),
        })
    }

    fn key_header(&self) -> [(&'static str, String); 1] {
        [("Subscription-Key", self.api_key.clone())]
    }

    /// Document list for one submission date
    async fn documents_on(&self, date: NaiveDate) -> Result<Vec<DocumentEntry>> {
        let mut url = endpoint(&self.base_url, &["documents.json"])?;
        url.query_pairs_mut()
            .append_pair("date", &date.format("%Y-%m-%d").to_string())
            .append_pair("type", "2");

        let body = self
            .api
            .get_json_with_headers(url, &self.key_header())
            .await?;
        parse_documents(body)
    }

    /// Headline figures of one report, from its CSV archive
    async fn report_summary(&self, doc_id: &str) -> Result<ReportSummary> {
        let mut url = endpoint(&self.base_url, &["documents", doc_id])?;
        url.query_pairs_mut().append_pair("type", "5");

        let body = self
            .api
            .get_bytes_with_headers(url, &self.key_header())
            .await?;
        if let Some(err) = download_error(&body) {
            return Err(err);
        }
        parse_csv_archive(&body)
    }

    fn document_url(&self, doc_id: &str) -> String {
        format!("{}/documents/{}?type=2", self.base_url.trim_end_matches('/'), doc_id)
    }
}

#[async_trait]
impl FilingsSource for EdinetClient {
    async fn search_companies(&self, query: &str) -> AdapterResult<Vec<CompanyRecord>> {
        let query = query.trim();
        let found = search_document_lists(query, today_jst(), self.lookback_days, |date| {
            self.documents_on(date)
        })
        .await?;

        debug!(query, hits = found.len(), "EDINET company search");
        Ok(found)
    }

    async fn financial_statements(
        &self,
        edinet_code: &str,
        period: &str,
    ) -> AdapterResult<Option<FinancialStatements>> {
        let year: i32 = period
            .parse()
            .map_err(|_| SourceError::InvalidInput(format!("period must be a year: {period}")))?;

        for date in filing_dates(year, today_jst()) {
            let Some(entry) = self
                .documents_on(date)
                .await?
                .into_iter()
                .find(|e| {
                    e.edinet_code.as_deref() == Some(edinet_code)
                        && e.doc_type_code.as_deref() == Some(ANNUAL_REPORT)
                })
            else {
                continue;
            };

            debug!(edinet_code, doc_id = %entry.doc_id, %date, "annual report found");

            // A missing or unreadable archive leaves the metrics empty.
            let summary = if entry.has_csv() {
                self.report_summary(&entry.doc_id)
                    .await
                    .unwrap_or_else(|err| {
                        warn!(doc_id = %entry.doc_id, "EDINET CSV summary unavailable: {err}");
                        ReportSummary::default()
                    })
            } else {
                ReportSummary::default()
            };

            return Ok(Some(FinancialStatements {
                edinet_code: edinet_code.to_string(),
                company_name: entry.filer_name.clone().unwrap_or_default(),
                period: period.to_string(),
                document_url: Some(self.document_url(&entry.doc_id)),
                doc_id: entry.doc_id,
                document_description: entry.doc_description,
                filing_date: entry.submit_date_time,
                period_start: entry.period_start,
                period_end: entry.period_end,
                accounting_standard: summary.accounting_standard,
                metrics: summary.metrics,
            }));
        }

        Ok(None)
    }
}

/// Walk daily document lists for companies matching `query`
///
/// A securities code stops at its first hit. A code with no filing in the
/// recent window is looked for in the last two filing seasons, when every
/// listed company submits its annual report.
async fn search_document_lists<F, Fut>(
    query: &str,
    today: NaiveDate,
    lookback_days: u32,
    mut fetch: F,
) -> Result<Vec<CompanyRecord>>
where
    F: FnMut(NaiveDate) -> Fut,
    Fut: Future<Output = Result<Vec<DocumentEntry>>>,
{
    let recent: Vec<NaiveDate> = (0..i64::from(lookback_days))
        .map(|offset| today - Duration::days(offset))
        .filter(|d| !is_weekend(*d))
        .collect();

    let mut found = Vec::new();
    scan_dates(&recent, query, &mut found, &mut fetch).await?;

    if found.is_empty() && is_code(query) {
        let window_start = today - Duration::days(i64::from(lookback_days));
        let season: Vec<NaiveDate> = [today.year() - 1, today.year() - 2]
            .into_iter()
            .flat_map(|year| filing_dates(year, today))
            .filter(|d| *d <= window_start)
            .collect();

        debug!(query, dates = season.len(), "no recent filings, scanning filing seasons");
        scan_dates(&season, query, &mut found, &mut fetch).await?;
    }

    found.truncate(MAX_SEARCH_RESULTS);
    Ok(found)
}

async fn scan_dates<F, Fut>(
    dates: &[NaiveDate],
    query: &str,
    found: &mut Vec<CompanyRecord>,
    fetch: &mut F,
) -> Result<()>
where
    F: FnMut(NaiveDate) -> Fut,
    Fut: Future<Output = Result<Vec<DocumentEntry>>>,
{
    for &date in dates {
        for entry in fetch(date).await? {
            if !matches_query(&entry, query) {
                continue;
            }
            let Some(edinet_code) = entry.edinet_code.clone() else {
                continue;
            };
            if found.iter().any(|c| c.edinet_code == edinet_code) {
                continue;
            }
            found.push(CompanyRecord {
                edinet_code,
                name: entry.filer_name.clone().unwrap_or_default(),
                ticker: entry.ticker(),
            });
        }

        if found.len() >= MAX_SEARCH_RESULTS || (!found.is_empty() && is_code(query)) {
            break;
        }
    }
    Ok(())
}

fn parse_documents(mut body: Value) -> Result<Vec<DocumentEntry>> {
    let status = body.pointer("/metadata/status").and_then(|s| {
        s.as_str()
            .map(str::to_string)
            .or_else(|| s.as_u64().map(|n| n.to_string()))
    });

    match status.as_deref() {
        Some("200") => {}
        Some(other) => {
            let message = body
                .pointer("/metadata/message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(SourceError::Service {
                service: SERVICE,
                message: format!("status {other}: {message}"),
            });
        }
        None => return Err(SourceError::format(SERVICE, "missing metadata.status")),
    }

    match body["results"].take() {
        results @ Value::Array(_) => Ok(serde_json::from_value(results)?),
        Value::Null => Ok(Vec::new()),
        _ => Err(SourceError::format(SERVICE, "results is not an array")),
    }
}

/// EDINET answers a failed download with a JSON body instead of an archive
fn download_error(body: &[u8]) -> Option<SourceError> {
    if body.first() != Some(&b'{') {
        return None;
    }
    let value: Value = serde_json::from_slice(body).ok()?;
    let message = value
        .pointer("/metadata/message")
        .or_else(|| value.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("document not available");
    Some(SourceError::Service {
        service: SERVICE,
        message: message.to_string(),
    })
}

fn parse_csv_archive(bytes: &[u8]) -> Result<ReportSummary> {
    let archive_error =
        |e: zip::result::ZipError| SourceError::format(SERVICE, format!("CSV archive: {e}"));
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(archive_error)?;

    let mut rows = Vec::new();
    for index in 0..archive.len() {
        let mut file = archive.by_index(index).map_err(archive_error)?;
        let name = file.name().to_string();
        // jpaud files hold the audit report; figures live in the jpcrp file.
        if !(name.starts_with("XBRL_TO_CSV/jpcrp") && name.ends_with(".csv")) {
            continue;
        }

        let mut raw = Vec::new();
        file.read_to_end(&mut raw)
            .map_err(|e| SourceError::format(SERVICE, format!("{name}: {e}")))?;
        rows.extend(csv_rows(&decode_text(&raw))?);
    }

    Ok(summarize(&rows))
}

/// Element id, context id and value of one CSV row
type CsvRow = (String, String, String);

fn csv_rows(text: &str) -> Result<Vec<CsvRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| SourceError::format(SERVICE, format!("CSV row: {e}")))?;
        if let (Some(element), Some(context), Some(value)) =
            (record.get(0), record.get(2), record.get(8))
        {
            rows.push((element.to_string(), context.to_string(), value.to_string()));
        }
    }
    Ok(rows)
}

/// EDINET CSV files are UTF-16LE with a byte order mark
fn decode_text(raw: &[u8]) -> String {
    match raw {
        [0xFF, 0xFE, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8_lossy(rest).into_owned(),
        _ => String::from_utf8_lossy(raw).into_owned(),
    }
}

/// Current-year summary figures, consolidated before non-consolidated
fn summarize(rows: &[CsvRow]) -> ReportSummary {
    let mut summary = ReportSummary::default();
    let mut ranks: BTreeMap<(&str, &str), u8> = BTreeMap::new();

    for (element, context, value) in rows {
        if element == ACCOUNTING_STANDARD {
            let value = value.trim();
            if summary.accounting_standard.is_none() && !value.is_empty() {
                summary.accounting_standard = Some(value.to_string());
            }
            continue;
        }

        let known = SUMMARY_ELEMENTS
            .iter()
            .find(|(id, ..)| *id == element.as_str());
        let Some(&(_, category, name)) = known else {
            continue;
        };
        let Some(rank) = context_rank(context) else {
            continue;
        };
        let Some(amount) = parse_amount(value) else {
            continue;
        };
        if ranks.get(&(category, name)).is_some_and(|&best| best <= rank) {
            continue;
        }

        ranks.insert((category, name), rank);
        summary
            .metrics
            .entry(category.to_string())
            .or_default()
            .insert(name.to_string(), amount);
    }

    summary
}

fn context_rank(context: &str) -> Option<u8> {
    match context {
        "CurrentYearDuration" | "CurrentYearInstant" => Some(0),
        "CurrentYearDuration_NonConsolidatedMember"
        | "CurrentYearInstant_NonConsolidatedMember" => Some(1),
        _ => None,
    }
}

fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_code(query: &str) -> bool {
    query.len() == 4 && query.bytes().all(|b| b.is_ascii_digit())
}

fn matches_query(entry: &DocumentEntry, query: &str) -> bool {
    if query.is_empty() {
        return false;
    }
    if is_code(query) {
        return entry.ticker().as_deref() == Some(query);
    }
    entry
        .filer_name
        .as_deref()
        .is_some_and(|name| name.contains(query))
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Weekdays up to `today` on which an annual report for fiscal `year` is likely filed
///
/// March year-ends file at the end of June of the following year; the rest
/// of June comes next, then July, May and April for other year-ends.
fn filing_dates(year: i32, today: NaiveDate) -> Vec<NaiveDate> {
    let filing_year = year + 1;
    let mut dates = Vec::new();

    for month in [6, 7, 5, 4] {
        let days: Vec<u32> = if month == 6 {
            (1..=30).rev().collect()
        } else {
            (1..=31).collect()
        };
        dates.extend(
            days.into_iter()
                .filter_map(|day| NaiveDate::from_ymd_opt(filing_year, month, day))
                .filter(|d| !is_weekend(*d)),
        );
    }

    dates.retain(|d| *d <= today);
    dates
}

//! Rendering of aggregated results
//!
//! JSON output is the result as-is. Text output is meant for terminals: a
//! section that failed or was skipped always says so, and reads differently
//! from a section whose source answered with nothing.

use comfy_table::{Cell, Color, ContentArrangement, Table};
use jpfin_core::{AggregatedResult, FetchOutcome, Operation, SourceData, SourceEntry, SourceId};
use std::fmt::Write as _;
use std::str::FromStr;

const MAX_DISCLOSURES: usize = 5;
const MAX_HEADLINES: usize = 5;
const MAX_TABLES: usize = 5;

/// Output format selected by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

/// Render a result in the requested format
pub fn render(result: &AggregatedResult, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(result)),
        OutputFormat::Json => render_json(result),
    }
}

pub fn render_json(result: &AggregatedResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}

pub fn render_text(result: &AggregatedResult) -> String {
    let mut out = match result.operation {
        Operation::AnalyzeCompany => company_report(result),
        Operation::MacroSnapshot => macro_report(result),
        Operation::EarningsMonitor => monitor_report(result),
        Operation::CheckDataSources | Operation::ProbeDataSources => status_report(result),
    };
    out.push_str(&footer(result));
    out
}

/// Company name from the statements payload, else the first disclosure
pub fn company_name(result: &AggregatedResult) -> Option<String> {
    result
        .entries
        .iter()
        .find_map(|entry| match entry.outcome.data()? {
            SourceData::Statements(s) => Some(s.company_name.clone()),
            _ => None,
        })
        .or_else(|| {
            result.entries.iter().find_map(|entry| match entry.outcome.data()? {
                SourceData::Disclosures(items) => items.first().map(|d| d.company_name.clone()),
                _ => None,
            })
        })
}

/// Disclosures found across a monitor result
pub fn total_disclosures(result: &AggregatedResult) -> usize {
    result
        .entries
        .iter()
        .filter_map(|entry| match entry.outcome.data() {
            Some(SourceData::Disclosures(items)) => Some(items.len()),
            _ => None,
        })
        .sum()
}

fn request_str<'a>(result: &'a AggregatedResult, key: &str) -> &'a str {
    result.request[key].as_str().unwrap_or("-")
}

fn company_report(result: &AggregatedResult) -> String {
    let code = request_str(result, "code");
    let mut out = match company_name(result) {
        Some(name) => format!("=== {name} ({code}) ===\n"),
        None => format!("=== {code} ===\n"),
    };
    let _ = writeln!(out, "Fiscal period: {}", request_str(result, "period"));

    for entry in &result.entries {
        section(&mut out, &title(entry), entry);
    }
    out
}

fn macro_report(result: &AggregatedResult) -> String {
    let mut out = format!(
        "=== Macro snapshot: {} ===\n",
        request_str(result, "keyword")
    );
    for entry in &result.entries {
        section(&mut out, &title(entry), entry);
    }
    out
}

fn monitor_report(result: &AggregatedResult) -> String {
    let mut out = format!(
        "=== Earnings monitor: {} companies, {} disclosures ===\n",
        result.entries.len(),
        total_disclosures(result)
    );

    for entry in &result.entries {
        let code = entry.section.strip_prefix("disclosures:").unwrap_or(&entry.section);
        let heading = match entry.outcome.data() {
            Some(SourceData::Disclosures(items)) => items
                .first()
                .map_or_else(|| code.to_string(), |d| format!("{} {}", code, d.company_name)),
            _ => code.to_string(),
        };

        if matches!(entry.outcome, FetchOutcome::Empty) {
            let _ = writeln!(out, "\n--- {heading} ---\n  No recent disclosures");
        } else {
            section(&mut out, &heading, entry);
        }
    }
    out
}

fn status_report(result: &AggregatedResult) -> String {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Source", "Status", "Detail"]);

    for entry in &result.entries {
        let (status, color, detail) = match &entry.outcome {
            FetchOutcome::Success { data } => {
                let detail = match data {
                    SourceData::Status(_) => String::new(),
                    other => format!("{} item(s)", other.item_count()),
                };
                ("available", Color::Green, detail)
            }
            FetchOutcome::Empty => ("no data", Color::Yellow, String::new()),
            FetchOutcome::Skipped { reason } => ("unavailable", Color::DarkGrey, reason.clone()),
            FetchOutcome::Failed { kind, message } => {
                ("failed", Color::Red, format!("{kind}: {message}"))
            }
        };
        table.add_row(vec![
            Cell::new(entry.source.display_name()),
            Cell::new(status).fg(color),
            Cell::new(detail),
        ]);
    }

    let heading = if result.operation == Operation::ProbeDataSources {
        "Connection test"
    } else {
        "Data sources"
    };
    format!(
        "=== {heading}: {}/{} available ===\n{table}\n",
        result.summary.succeeded, result.summary.total
    )
}

fn title(entry: &SourceEntry) -> String {
    let name = entry.source.display_name();
    match entry.section.as_str() {
        "statements" => format!("Financial statements ({name})"),
        "disclosures" => format!("Disclosures ({name})"),
        "headlines" => format!("Headlines ({name})"),
        "prices" => format!("Stock price ({name})"),
        "statistics" => format!("Government statistics ({name})"),
        "central_bank" => format!("Central bank ({name})"),
        other => format!("{other} ({name})"),
    }
}

fn nothing_found(source: SourceId) -> &'static str {
    match source {
        SourceId::Edinet => "no annual report found",
        SourceId::Tdnet => "no matching disclosures found",
        SourceId::Estat => "no matching statistics tables found",
        SourceId::Boj => "no observations found",
        SourceId::News => "no matching headlines found",
        SourceId::StockPrice => "no price data found",
    }
}

fn section(out: &mut String, heading: &str, entry: &SourceEntry) {
    let _ = writeln!(out, "\n--- {heading} ---");
    match &entry.outcome {
        FetchOutcome::Success { data } => payload(out, data),
        FetchOutcome::Empty => {
            let _ = writeln!(out, "  {}", nothing_found(entry.source));
        }
        FetchOutcome::Skipped { reason } => {
            let _ = writeln!(out, "  [skipped] source unavailable: {reason}");
        }
        FetchOutcome::Failed { kind, message } => {
            let _ = writeln!(out, "  [failed] {kind}: {message}");
        }
    }
}

fn payload(out: &mut String, data: &SourceData) {
    match data {
        SourceData::Statements(s) => {
            let _ = writeln!(out, "  {} ({})", s.company_name, s.edinet_code);
            if let Some(description) = &s.document_description {
                let _ = writeln!(out, "  {description} [{}]", s.doc_id);
            }
            if let (Some(start), Some(end)) = (&s.period_start, &s.period_end) {
                let _ = writeln!(out, "  Period: {start} to {end}");
            }
            if let Some(filed) = &s.filing_date {
                let _ = writeln!(out, "  Filed: {filed}");
            }
            if let Some(standard) = &s.accounting_standard {
                let _ = writeln!(out, "  Accounting standard: {standard}");
            }
            for (category, metrics) in &s.metrics {
                let _ = writeln!(out, "  {category}:");
                for (name, value) in metrics {
                    let _ = writeln!(out, "    {name}: {value:.2}");
                }
            }
        }
        SourceData::Companies(companies) => {
            for company in companies {
                let ticker = company.ticker.as_deref().unwrap_or("-");
                let _ = writeln!(out, "  {} {} ({ticker})", company.edinet_code, company.name);
            }
        }
        SourceData::Disclosures(items) => {
            for d in items.iter().take(MAX_DISCLOSURES) {
                let _ = writeln!(out, "  [{}] {}", d.pubdate, d.title);
            }
            more(out, items.len(), MAX_DISCLOSURES);
        }
        SourceData::Statistics(tables) => {
            for t in tables.iter().take(MAX_TABLES) {
                let org = t.gov_org.as_deref().unwrap_or("-");
                let _ = writeln!(out, "  {} {} ({org})", t.stats_id, t.title);
            }
            more(out, tables.len(), MAX_TABLES);
        }
        SourceData::Indicator(series) => {
            let _ = writeln!(out, "  {} [{}]", series.name, series.code);
            if let Some(last) = series.observations.last() {
                let value = last.value.map_or_else(|| "n/a".to_string(), |v| format!("{v}"));
                let unit = series.unit.as_deref().unwrap_or("");
                let _ = writeln!(out, "  Latest: {value} {unit} ({})", last.date);
            }
        }
        SourceData::Headlines(items) => {
            for h in items.iter().take(MAX_HEADLINES) {
                match &h.source_name {
                    Some(source) => {
                        let _ = writeln!(out, "  - {} ({source})", h.title);
                    }
                    None => {
                        let _ = writeln!(out, "  - {}", h.title);
                    }
                }
            }
            more(out, items.len(), MAX_HEADLINES);
        }
        SourceData::Prices(series) => {
            if let Some(bar) = series.latest() {
                let _ = writeln!(out, "  {} close {:.1} on {}", series.symbol, bar.close, bar.date);
            }
            if let Some(change) = series.change_pct() {
                let sessions = series.bars.len();
                let _ = writeln!(out, "  Change over {sessions} sessions: {change:+.2}%");
            }
        }
        SourceData::Status(status) => {
            let state = if status.available { "available" } else { "unavailable" };
            let _ = writeln!(out, "  {state}");
        }
    }
}

fn more(out: &mut String, total: usize, shown: usize) {
    if total > shown {
        let _ = writeln!(out, "  ... and {} more", total - shown);
    }
}

fn footer(result: &AggregatedResult) -> String {
    let used = result.sources_used();
    let used = if used.is_empty() {
        "none".to_string()
    } else {
        used.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
    };
    let s = &result.summary;
    format!(
        "\nSources used: {used}\n{} succeeded, {} empty, {} failed, {} skipped in {} ms\n",
        s.succeeded, s.empty, s.failed, s.skipped, result.elapsed_ms
    )
}

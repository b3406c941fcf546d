//! Result merger
//!
//! Pairs each task's attribution with its outcome and tallies the summary.
//! No I/O happens here, and no entry is ever dropped: suppressing empty or
//! skipped sections is left to whoever renders the result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::capability::SourceData;
use crate::executor::TaskKey;
use crate::outcome::FetchOutcome;
use crate::source::SourceId;

/// Orchestration operation that produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    AnalyzeCompany,
    MacroSnapshot,
    EarningsMonitor,
    CheckDataSources,
    ProbeDataSources,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::AnalyzeCompany => "analyze_company",
            Operation::MacroSnapshot => "macro_snapshot",
            Operation::EarningsMonitor => "earnings_monitor",
            Operation::CheckDataSources => "check_data_sources",
            Operation::ProbeDataSources => "probe_data_sources",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attributed section of an aggregated result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub source: SourceId,
    /// Which part of the request this entry answers (e.g. "disclosures:7203")
    pub section: String,
    pub outcome: FetchOutcome,
}

/// Outcome counts by variant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeSummary {
    pub total: usize,
    pub succeeded: usize,
    pub empty: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl OutcomeSummary {
    /// Tally outcomes by their variant tag
    pub fn tally<'a>(outcomes: impl IntoIterator<Item = &'a FetchOutcome>) -> Self {
        outcomes
            .into_iter()
            .fold(OutcomeSummary::default(), |mut summary, outcome| {
                summary.total += 1;
                match outcome {
                    FetchOutcome::Success { .. } => summary.succeeded += 1,
                    FetchOutcome::Empty => summary.empty += 1,
                    FetchOutcome::Failed { .. } => summary.failed += 1,
                    FetchOutcome::Skipped { .. } => summary.skipped += 1,
                }
                summary
            })
    }
}

/// Merged output of one orchestration call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    pub request_id: Uuid,
    pub operation: Operation,
    /// Parameters the operation was invoked with, after validation
    pub request: serde_json::Value,
    /// One entry per declared source task, in declaration order
    pub entries: Vec<SourceEntry>,
    pub summary: OutcomeSummary,
    pub elapsed_ms: u64,
    pub generated_at: DateTime<Utc>,
}

impl AggregatedResult {
    /// First entry for a section
    pub fn entry(&self, section: &str) -> Option<&SourceEntry> {
        self.entries.iter().find(|e| e.section == section)
    }

    /// All entries attributed to a source
    pub fn entries_for(&self, source: SourceId) -> impl Iterator<Item = &SourceEntry> {
        self.entries.iter().filter(move |e| e.source == source)
    }

    /// Sources that contributed data, in entry order without repeats
    pub fn sources_used(&self) -> Vec<SourceId> {
        let mut used: Vec<SourceId> = Vec::new();
        for entry in &self.entries {
            if entry.outcome.is_success() && !used.contains(&entry.source) {
                used.push(entry.source);
            }
        }
        used
    }

    /// Payload of a section, when it succeeded
    pub fn data(&self, section: &str) -> Option<&SourceData> {
        self.entry(section).and_then(|e| e.outcome.data())
    }

    /// True when every declared source returned data
    pub fn is_complete(&self) -> bool {
        self.summary.succeeded == self.summary.total
    }
}

/// Combine task attributions and their outcomes into one result
///
/// `keys` and `outcomes` are positionally paired, as produced by
/// [`FanOutExecutor::run`](crate::FanOutExecutor::run).
pub fn merge(
    operation: Operation,
    request: serde_json::Value,
    keys: Vec<TaskKey>,
    outcomes: Vec<FetchOutcome>,
    elapsed: Duration,
) -> AggregatedResult {
    debug_assert_eq!(keys.len(), outcomes.len(), "one outcome per task");

    let summary = OutcomeSummary::tally(&outcomes);
    let entries = keys
        .into_iter()
        .zip(outcomes)
        .map(|(key, outcome)| SourceEntry {
            source: key.source,
            section: key.section,
            outcome,
        })
        .collect();

    AggregatedResult {
        request_id: Uuid::new_v4(),
        operation,
        request,
        entries,
        summary,
        elapsed_ms: elapsed.as_millis() as u64,
        generated_at: Utc::now(),
    }
}

//! # jpfin-agent
//!
//! Compound Japan finance operations built on the fan-out core:
//!
//! - [`FinanceAgent::analyze_company`]: filings, disclosures, headlines and
//!   prices for one listed company
//! - [`FinanceAgent::macro_snapshot`]: government statistics, a central-bank
//!   series and headlines for a topic
//! - [`FinanceAgent::earnings_monitor`]: recent disclosures across a watchlist
//! - [`FinanceAgent::check_data_sources`]: which sources are usable, without
//!   contacting any of them
//! - [`FinanceAgent::probe_data_sources`]: one live call per source
//!
//! Input is validated up front; past validation every failure is reported
//! inside the [`AggregatedResult`](jpfin_core::AggregatedResult).

pub mod agent;
pub mod config;
pub mod error;
pub mod report;
pub mod validate;

#[cfg(test)]
mod fakes;

pub use agent::{FinanceAgent, default_period};
pub use config::{AgentConfig, AgentConfigBuilder};
pub use error::{AgentError, Result};
pub use report::{OutputFormat, render, render_json, render_text};

//! Core abstractions for japanfinance-agent
//!
//! This crate holds the fan-out/aggregation machinery that every compound
//! operation is built on:
//!
//! - [`SourceId`]: the six data sources the agent knows about
//! - [`capability`]: the narrow fetch traits each adapter implements, and the
//!   payload types they return
//! - [`AvailabilityRegistry`]: per-source [`AdapterSlot`]s resolved once from
//!   injected factories; a missing credential or dependency is recorded, not
//!   raised
//! - [`FanOutExecutor`]: runs a batch of [`FetchTask`]s concurrently with a
//!   per-task timeout and returns one [`FetchOutcome`] per task, in input order
//! - [`merge`]: pairs outcomes with their sources into an [`AggregatedResult`]
//!
//! # Example
//!
//! ```rust,ignore
//! use jpfin_core::{AvailabilityRegistry, FanOutExecutor, FetchTask, Operation, merge};
//! use std::time::Duration;
//!
//! let registry = AvailabilityRegistry::builder()
//!     .disclosures(|| Ok(my_tdnet_client()))
//!     .build();
//!
//! let task = FetchTask::bind(registry.disclosures(), "disclosures", |tdnet| async move {
//!     Ok(SourceData::disclosures(tdnet.company_disclosures("7203", 10).await?))
//! });
//! let keys = vec![task.key()];
//! let started = std::time::Instant::now();
//! let outcomes = FanOutExecutor::new(Duration::from_secs(30)).run(vec![task]).await;
//! let result = merge(Operation::EarningsMonitor, request, keys, outcomes, started.elapsed());
//! ```

pub mod calendar;
pub mod capability;
pub mod error;
pub mod executor;
pub mod merger;
pub mod outcome;
pub mod registry;
pub mod source;

pub use calendar::{jst_date, today_jst};
pub use capability::{
    CentralBankSource, CompanyRecord, Disclosure, DisclosureSource, FilingsSource,
    FinancialStatements, Headline, IndicatorSeries, NewsSource, Observation, PriceBar,
    PriceSeries, PriceSource, SourceData, StatisticsSource, StatsTable,
};
pub use error::{AdapterError, AdapterResult, FailureKind, TaskError, Unavailable};
pub use executor::{FanOutExecutor, FetchTask, TaskKey};
pub use merger::{AggregatedResult, Operation, OutcomeSummary, SourceEntry, merge};
pub use outcome::FetchOutcome;
pub use registry::{AdapterSlot, AvailabilityRegistry, RegistryBuilder, SourceStatus};
pub use source::SourceId;

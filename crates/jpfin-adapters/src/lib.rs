//! # jpfin-adapters
//!
//! Concrete clients for the Japanese financial data sources behind the
//! capability traits of `jpfin-core`:
//!
//! - **EDINET**: securities filings (API key)
//! - **TDnet**: timely disclosures
//! - **e-Stat**: government statistics (application id)
//! - **BOJ**: Bank of Japan time series
//! - **NewsAPI**: headlines (API key)
//! - **Yahoo Finance**: daily stock prices
//!
//! Each client sits behind a cargo feature of the same name. [`build_registry`]
//! turns a [`SourceConfig`] into an [`AvailabilityRegistry`](jpfin_core::AvailabilityRegistry),
//! recording why any source is unusable.

pub mod config;
pub mod error;
pub mod http;
pub mod registry;
pub mod retry;

#[cfg(feature = "boj")]
pub mod boj;
#[cfg(feature = "edinet")]
pub mod edinet;
#[cfg(feature = "estat")]
pub mod estat;
#[cfg(feature = "news")]
pub mod news;
#[cfg(feature = "stockprice")]
pub mod stockprice;
#[cfg(feature = "tdnet")]
pub mod tdnet;

pub use config::{Endpoints, SourceConfig, SourceConfigBuilder};
pub use error::{Result, SourceError};
pub use http::ApiClient;
pub use registry::build_registry;
pub use retry::RetryPolicy;

//! Shared utilities for japanfinance-agent
//!
//! This crate provides common functionality used across the workspace:
//! tracing setup and small helpers for reading settings from the environment.

pub mod env;
pub mod logging;

pub use env::{EnvLookup, env_var, parse_var, process_env};
pub use logging::{init_tracing, init_tracing_with};

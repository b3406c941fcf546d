//! Model Context Protocol (MCP) server for japanfinance-agent
//!
//! Exposes the compound operations as four tools over line-delimited
//! JSON-RPC 2.0 on stdio:
//!
//! - `analyze_japanese_company`
//! - `get_macro_snapshot`
//! - `monitor_earnings`
//! - `check_data_sources`
//!
//! Tool results carry the aggregated result both as `structuredContent` and
//! as JSON text. Input the agent rejects comes back as a tool result with
//! `isError: true`, not as a protocol error.
//!
//! # Example
//!
//! ```no_run
//! use jpfin_agent::{AgentConfig, FinanceAgent};
//! use jpfin_core::AvailabilityRegistry;
//! use jpfin_mcp::{McpServer, finance_tools, serve_stdio};
//! use std::sync::Arc;
//!
//! # async fn example() -> jpfin_mcp::Result<()> {
//! let registry = Arc::new(AvailabilityRegistry::builder().build());
//! let agent = Arc::new(FinanceAgent::new(registry, AgentConfig::default()));
//! let server = McpServer::new(finance_tools(agent));
//! serve_stdio(&server).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod protocol;
pub mod server;
pub mod tool;
pub mod tools;

pub use error::McpError;
pub use server::{McpServer, serve_stdio};
pub use tool::{Tool, ToolRegistry};
pub use tools::finance_tools;

/// Result type for server operations
pub type Result<T> = std::result::Result<T, McpError>;

//! Command-line interface for japanfinance-agent
//!
//! Results go to stdout, logs to stderr. The exit status is non-zero only
//! when the input or the configuration is invalid; a source that fails or is
//! unavailable is part of a successful result.

mod cli;

use anyhow::Context;
use clap::Parser;
use jpfin_adapters::{SourceConfig, build_registry};
use jpfin_agent::{AgentConfig, FinanceAgent, OutputFormat, render};
use jpfin_core::AggregatedResult;
use jpfin_mcp::{McpServer, finance_tools, serve_stdio};
use std::sync::Arc;
use tracing::info;

use crate::cli::{Cli, Commands};

fn emit(result: &AggregatedResult, format: OutputFormat) -> anyhow::Result<()> {
    println!("{}", render(result, format)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        jpfin_utils::init_tracing_with("debug");
    } else {
        jpfin_utils::init_tracing();
    }

    let sources = SourceConfig::from_env().context("invalid data source configuration")?;
    let config = AgentConfig::from_env().context("invalid agent configuration")?;
    let registry = Arc::new(build_registry(&sources));
    let agent = Arc::new(FinanceAgent::new(registry, config));

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    match cli.command {
        Commands::Analyze {
            code,
            edinet_code,
            period,
        } => {
            let result = agent
                .analyze_company(&code, edinet_code.as_deref(), period.as_deref())
                .await?;
            emit(&result, format)?;
        }
        Commands::Macro {
            keyword,
            boj_series,
        } => {
            let result = agent
                .macro_snapshot(keyword.as_deref(), boj_series.as_deref())
                .await?;
            emit(&result, format)?;
        }
        Commands::Monitor { codes } => {
            let result = agent.earnings_monitor(codes.as_slice()).await?;
            emit(&result, format)?;
        }
        Commands::Test { live } => {
            if format == OutputFormat::Text {
                println!("japanfinance-agent v{}\n", env!("CARGO_PKG_VERSION"));
            }
            let status = agent.check_data_sources();

            if !live {
                emit(&status, format)?;
            } else if format == OutputFormat::Json {
                let probe = agent.probe_data_sources().await;
                let both = serde_json::json!({ "sources": status, "probe": probe });
                println!("{}", serde_json::to_string_pretty(&both)?);
            } else {
                emit(&status, format)?;
                emit(&agent.probe_data_sources().await, format)?;
            }
        }
        Commands::Serve => {
            info!("Starting MCP server (stdio transport)");
            let server = McpServer::new(finance_tools(agent));
            serve_stdio(&server).await?;
        }
    }

    Ok(())
}

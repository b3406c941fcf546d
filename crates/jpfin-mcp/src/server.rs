//! Line-delimited JSON-RPC server
//!
//! Reads one request per line, answers in order on the writer. Only the
//! protocol stream goes to the writer; logs belong on stderr.

use serde::Deserialize;
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::Result;
use crate::error::McpError;
use crate::protocol::{PROTOCOL_VERSION, Request, Response};
use crate::tool::ToolRegistry;

pub const SERVER_NAME: &str = "japanfinance-agent";

const INSTRUCTIONS: &str = "Compound analysis tools for Japanese financial data. \
Combines EDINET, TDnet, e-Stat, BOJ, news and stock price data; every result lists \
each source with its own status.";

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// MCP server over a fixed set of tools
#[derive(Debug)]
pub struct McpServer {
    tools: ToolRegistry,
}

impl McpServer {
    pub fn new(tools: ToolRegistry) -> Self {
        Self { tools }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Handle one raw line; `None` for notifications
    pub async fn handle_line(&self, line: &str) -> Option<Response> {
        match Request::parse(line) {
            Ok(request) => self.handle(request).await,
            Err(err) => {
                warn!("Rejected message: {err}");
                Some(Response::failure(Value::Null, &err))
            }
        }
    }

    /// Dispatch one request
    pub async fn handle(&self, request: Request) -> Option<Response> {
        debug!(method = %request.method, "Handling request");

        let outcome = match request.method.as_str() {
            "initialize" => Ok(Self::initialize()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.tools.definitions() })),
            "tools/call" => self.call_tool(request.params).await,
            method if method.starts_with("notifications/") => {
                if method == "notifications/initialized" {
                    info!("Client initialized");
                }
                return None;
            }
            other => Err(McpError::MethodNotFound(other.to_string())),
        };

        let id = request.id?;
        Some(match outcome {
            Ok(result) => Response::success(id, result),
            Err(err) => Response::failure(id, &err),
        })
    }

    fn initialize() -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            },
            "instructions": INSTRUCTIONS,
        })
    }

    async fn call_tool(&self, params: Value) -> Result<Value> {
        let call: CallParams =
            serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| McpError::ToolNotFound(call.name.clone()))?;

        info!(tool = %call.name, "Calling tool");

        match tool.execute(call.arguments).await {
            Ok(value) => {
                let text = serde_json::to_string_pretty(&value)?;
                Ok(json!({
                    "content": [{ "type": "text", "text": text }],
                    "structuredContent": value,
                    "isError": false,
                }))
            }
            Err(err) if err.is_tool_error() => {
                warn!(tool = %call.name, "Tool rejected call: {err}");
                Ok(json!({
                    "content": [{ "type": "text", "text": err.to_string() }],
                    "isError": true,
                }))
            }
            Err(err) => Err(err),
        }
    }

    /// Serve until the reader reaches end of input
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(&line).await {
                let mut out = serde_json::to_vec(&response)?;
                out.push(b'\n');
                writer.write_all(&out).await?;
                writer.flush().await?;
            }
        }

        info!("Input closed, shutting down");
        Ok(())
    }
}

/// Serve on the process's stdin and stdout
pub async fn serve_stdio(server: &McpServer) -> Result<()> {
    info!(tools = server.tools().len(), "Serving MCP on stdio");
    server
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
}

//! MCP (Model Context Protocol) client module
//!
//! Uses the official rmcp SDK to reach the backend that serves the tools.
//! `tools::McpToolRegistry` wraps this client behind the `ToolRegistry` trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use toolloop_core::mcp::McpClient;
//!
//! let client = McpClient::connect_http("http://127.0.0.1:7071/mcp", logger).await?;
//! let tools = client.list_tools().await?;
//! let cancel = CancellationToken::new();
//! let result = client
//!     .call_tool("query_table", json!({ "table": "customers" }), &cancel)
//!     .await?;
//! ```

mod client;

pub use client::{McpClient, McpError, McpResult, is_internal_tool, INTERNAL_TOOL_PREFIX};

// Re-export rmcp types that consumers might need
pub use rmcp::model::{Tool as McpTool, CallToolResult as McpToolResult};

//! MCP Client using the official rmcp SDK
//!
//! Connects to the backend process that serves the tools, over a Unix socket
//! or streamable HTTP.

use std::path::Path;
use std::sync::Arc;

use rmcp::{
    ServiceExt,
    model::{CallToolRequestParams, CallToolResult, ClientCapabilities, ClientInfo, Implementation, Tool},
    service::RunningService,
    RoleClient,
};
use serde_json::Value;
use thiserror::Error;

#[cfg(unix)]
use tokio::net::UnixStream;

use crate::logging::Logger;
use crate::types::CancellationToken;

/// MCP client errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Tool call failed: {0}")]
    ToolCallFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Tool call cancelled")]
    Cancelled,
}

pub type McpResult<T> = Result<T, McpError>;

/// MCP client for the tool backend
pub struct McpClient {
    /// The underlying rmcp running service
    client: RunningService<RoleClient, ClientInfo>,
    /// Logger
    logger: Arc<dyn Logger>,
}

impl McpClient {
    /// Connect to an MCP server over a Unix socket
    #[cfg(unix)]
    pub async fn connect_unix<P: AsRef<Path>>(
        socket_path: P,
        logger: Arc<dyn Logger>,
    ) -> McpResult<Self> {
        let path = socket_path.as_ref();
        logger.info(&format!("[McpClient] Connecting to Unix socket: {:?}", path));

        let stream = UnixStream::connect(path)
            .await
            .map_err(|e| McpError::ConnectionFailed(e.to_string()))?;

        let info = client_info();

        let client = info
            .serve(stream)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        logger.info("[McpClient] Connected and initialized successfully");

        Ok(Self { client, logger })
    }

    /// Connect to an MCP server over HTTP (Streamable HTTP transport)
    pub async fn connect_http(
        url: &str,
        logger: Arc<dyn Logger>,
    ) -> McpResult<Self> {
        use rmcp::transport::StreamableHttpClientTransport;

        logger.info(&format!("[McpClient] Connecting to HTTP: {}", url));

        let transport = StreamableHttpClientTransport::from_uri(url);

        let info = client_info();

        let client = info
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        logger.info("[McpClient] Connected and initialized successfully");

        Ok(Self { client, logger })
    }

    /// List all available tools
    pub async fn list_tools(&self) -> McpResult<Vec<Tool>> {
        let result = self
            .client
            .list_tools(Default::default())
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;

        self.logger.info(&format!(
            "[McpClient] Listed {} tools",
            result.tools.len()
        ));

        Ok(result.tools)
    }

    /// Call a tool by name, giving up when `cancel` fires
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
        cancel: &CancellationToken,
    ) -> McpResult<CallToolResult> {
        self.logger.info(&format!("[McpClient] Calling tool: {}", name));

        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: arguments.as_object().cloned(),
            task: None,
        };

        tokio::select! {
            result = self.client.call_tool(params) => {
                result.map_err(|e| McpError::ToolCallFailed(e.to_string()))
            }
            _ = cancel.cancelled() => {
                self.logger.warn(&format!("[McpClient] Call to {} cancelled", name));
                Err(McpError::Cancelled)
            }
        }
    }

    /// Name the server reported during initialization
    pub fn server_name(&self) -> Option<String> {
        self.client.peer_info().map(|info| info.server_info.name.clone())
    }
}

fn client_info() -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "toolloop-core".to_string(),
            title: Some("Toolloop".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            website_url: None,
            icons: None,
        },
    }
}

/// Prefix of backend tools that are plumbing, not capabilities for the model
pub const INTERNAL_TOOL_PREFIX: &str = "_internal_";

/// Check if a tool name is internal (hidden from the model)
pub fn is_internal_tool(name: &str) -> bool {
    name.starts_with(INTERNAL_TOOL_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_internal_tool() {
        assert!(is_internal_tool("_internal_health"));
        assert!(!is_internal_tool("query_table"));
        assert!(!is_internal_tool("list_internal_tables"));
    }

    #[test]
    fn test_client_info_names_crate() {
        let info = client_info();
        assert_eq!(info.client_info.name, "toolloop-core");
        assert_eq!(info.client_info.version, env!("CARGO_PKG_VERSION"));
    }
}

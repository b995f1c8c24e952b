//! MCP-backed tool registry
//!
//! Keeps a cached view of the backend's tools and forwards invocations over
//! the MCP connection. The cache is refreshed explicitly so a loop run sees a
//! stable tool set.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use rmcp::model::RawContent;
use serde_json::Value;

use crate::logging::Logger;
use crate::mcp::{McpClient, McpTool, McpToolResult};
use crate::types::{CancellationToken, ContentPart, ToolDescriptor, ToolOutput};

use super::filter::{ToolFilter, ToolInfo};
use super::traits::{ToolError, ToolRegistry, ToolRegistryResult};

impl From<McpTool> for ToolDescriptor {
    fn from(tool: McpTool) -> Self {
        ToolDescriptor {
            name: tool.name.to_string(),
            description: tool.description.map(|s| s.to_string()).unwrap_or_default(),
            // input_schema is Arc<JsonObject>, convert to Value
            input_schema: serde_json::to_value(tool.input_schema.as_ref()).unwrap_or_default(),
        }
    }
}

/// Convert an MCP call result into tool output, or a failure if the backend
/// flagged it as an error
pub fn output_from_mcp(result: McpToolResult) -> ToolRegistryResult<ToolOutput> {
    // Content is Annotated<RawContent>, .raw gives the RawContent
    let content: Vec<ContentPart> = result
        .content
        .iter()
        .filter_map(|c| match &c.raw {
            RawContent::Text(t) => Some(ContentPart::text(t.text.clone())),
            _ => None,
        })
        .collect();

    if result.is_error.unwrap_or(false) {
        let message = content
            .iter()
            .filter_map(ContentPart::as_text)
            .collect::<Vec<_>>()
            .join("\n");
        return Err(ToolError::Failed(message));
    }

    Ok(ToolOutput { content })
}

/// Tool registry backed by an MCP server
pub struct McpToolRegistry {
    /// MCP client for tool discovery and execution
    mcp_client: RwLock<Option<Arc<McpClient>>>,
    /// Cached tools from last refresh
    tools: RwLock<Vec<ToolInfo>>,
    /// User-configured enabled/disabled state
    tool_states: RwLock<HashMap<String, bool>>,
    /// Which tools are offered to the model
    filter: ToolFilter,
    logger: Arc<dyn Logger>,
}

impl McpToolRegistry {
    /// Create a registry with no backend yet
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            mcp_client: RwLock::new(None),
            tools: RwLock::new(Vec::new()),
            tool_states: RwLock::new(HashMap::new()),
            filter: ToolFilter::new(),
            logger,
        }
    }

    /// Create a registry with an MCP client
    pub fn with_client(mcp_client: Arc<McpClient>, logger: Arc<dyn Logger>) -> Self {
        let registry = Self::new(logger);
        registry.set_client(mcp_client);
        registry
    }

    /// Replace the default filter
    pub fn with_filter(mut self, filter: ToolFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the MCP client (for lazy initialization once the backend is up)
    pub fn set_client(&self, client: Arc<McpClient>) {
        *self.mcp_client.write() = Some(client);
    }

    fn client(&self) -> ToolRegistryResult<Arc<McpClient>> {
        self.mcp_client.read().clone().ok_or(ToolError::NoClient)
    }

    /// Refresh the cached tool list from the backend
    pub async fn refresh(&self) -> ToolRegistryResult<usize> {
        let client = self.client()?;
        let source = match client.server_name() {
            Some(name) => format!("mcp:{}", name),
            None => "mcp".to_string(),
        };

        let mcp_tools = client.list_tools().await.map_err(|e| {
            self.logger.error(&format!("[ToolRegistry] Failed to fetch tools: {}", e));
            ToolError::from(e)
        })?;

        self.logger.info(&format!(
            "[ToolRegistry] Discovered {} tools from {}",
            mcp_tools.len(),
            source
        ));

        let states = self.tool_states.read();
        let new_tools: Vec<ToolInfo> = mcp_tools
            .into_iter()
            .map(|tool| {
                let mut info = ToolInfo::new(ToolDescriptor::from(tool), source.clone());
                if let Some(&enabled) = states.get(info.name()) {
                    info.enabled = enabled;
                }
                info
            })
            .collect();
        drop(states);

        let count = new_tools.len();
        *self.tools.write() = new_tools;
        Ok(count)
    }

    /// Get cached tools matching a filter
    pub fn get_tools(&self, filter: &ToolFilter) -> Vec<ToolInfo> {
        self.tools
            .read()
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect()
    }

    /// Enable or disable a tool
    pub fn set_tool_enabled(&self, name: &str, enabled: bool) {
        self.tool_states.write().insert(name.to_string(), enabled);

        let mut tools = self.tools.write();
        if let Some(tool) = tools.iter_mut().find(|t| t.name() == name) {
            tool.enabled = enabled;
        }
    }

    /// Get count of cached tools
    pub fn tool_count(&self) -> usize {
        self.tools.read().len()
    }
}

#[async_trait]
impl ToolRegistry for McpToolRegistry {
    async fn list(&self) -> ToolRegistryResult<Vec<ToolDescriptor>> {
        if self.tools.read().is_empty() {
            self.refresh().await?;
        }

        Ok(self
            .get_tools(&self.filter)
            .into_iter()
            .map(|info| info.descriptor)
            .collect())
    }

    async fn invoke(
        &self,
        name: &str,
        input: Value,
        cancel: &CancellationToken,
    ) -> ToolRegistryResult<ToolOutput> {
        let client = self.client()?;
        self.logger.info(&format!("[ToolRegistry] Calling tool: {}", name));

        let result = client.call_tool(name, input, cancel).await?;
        output_from_mcp(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use rmcp::model::Content;

    #[test]
    fn test_output_from_mcp_text() {
        let result = McpToolResult::success(vec![Content::text("row 1"), Content::text("row 2")]);
        let output = output_from_mcp(result).unwrap();
        assert_eq!(
            output.content,
            vec![ContentPart::text("row 1"), ContentPart::text("row 2")]
        );
    }

    #[test]
    fn test_output_from_mcp_error_flag() {
        let result = McpToolResult::error(vec![Content::text("table not found")]);
        match output_from_mcp(result) {
            Err(ToolError::Failed(message)) => assert_eq!(message, "table not found"),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invoke_without_client() {
        let registry = McpToolRegistry::new(Arc::new(NoOpLogger));
        let result = registry
            .invoke("query_table", serde_json::json!({}), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(ToolError::NoClient)));
        assert_eq!(registry.tool_count(), 0);
    }
}

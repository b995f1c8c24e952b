//! Tool registry trait and errors

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::mcp::McpError;
use crate::types::{CancellationToken, ToolDescriptor, ToolOutput};

/// Errors raised by a tool registry
#[derive(Error, Debug)]
pub enum ToolError {
    /// No tool with this name is registered
    #[error("Unknown tool: {0}")]
    NotFound(String),

    /// The tool ran and reported a failure
    #[error("{0}")]
    Failed(String),

    /// The registry has no backend connection
    #[error("No tool backend configured")]
    NoClient,

    /// The invocation was cancelled
    #[error("Tool call cancelled")]
    Cancelled,

    /// Transport or protocol failure talking to the backend
    #[error(transparent)]
    Mcp(#[from] McpError),
}

pub type ToolRegistryResult<T> = Result<T, ToolError>;

/// Source of the tools offered to the model
///
/// Implementations must be safe for concurrent use by independent loop runs.
#[async_trait]
pub trait ToolRegistry: Send + Sync {
    /// Tools currently available
    async fn list(&self) -> ToolRegistryResult<Vec<ToolDescriptor>>;

    /// Invoke a tool by name
    async fn invoke(
        &self,
        name: &str,
        input: Value,
        cancel: &CancellationToken,
    ) -> ToolRegistryResult<ToolOutput>;
}

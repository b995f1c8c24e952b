//! Model gateway trait definition

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::types::{CancellationToken, ConversationMessage, Fragment, ToolDescriptor, ToolMode};
use super::error::GatewayResult;

/// Options for one gateway request
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Tools available for the model to use
    pub tools: Vec<ToolDescriptor>,
    /// Tool choice behavior
    pub tool_mode: ToolMode,
}

impl RequestOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set tools
    pub fn with_tools(mut self, tools: Vec<ToolDescriptor>) -> Self {
        self.tools = tools;
        self
    }

    /// Set tool mode
    pub fn with_tool_mode(mut self, mode: ToolMode) -> Self {
        self.tool_mode = mode;
        self
    }

    /// Options for a round that must not call tools
    pub fn tool_free() -> Self {
        Self {
            tools: Vec::new(),
            tool_mode: ToolMode::None,
        }
    }
}

/// Lazy, one-shot sequence of fragments for a single round
pub type FragmentStream = Pin<Box<dyn Stream<Item = GatewayResult<Fragment>> + Send>>;

/// Access to a streaming conversational model
///
/// Implementations must be safe for concurrent use by independent loop runs.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Gateway name used in log lines (e.g. "openai", "mock")
    fn name(&self) -> &str;

    /// Send the conversation and stream back the model's reply
    async fn send_request(
        &self,
        messages: Vec<ConversationMessage>,
        options: RequestOptions,
        cancel_token: CancellationToken,
    ) -> GatewayResult<FragmentStream>;
}

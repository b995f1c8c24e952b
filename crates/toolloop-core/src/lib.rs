//! Toolloop Core
//!
//! A bounded, cancellable loop that lets a streaming model call external
//! tools. The loop depends on three collaborators, each behind a trait:
//!
//! - [`ModelGateway`]: sends the conversation, streams back text and tool calls
//! - [`ToolRegistry`]: lists and invokes tools (MCP servers, in-process closures)
//! - [`OutputSink`]: renders streamed text, progress and warnings
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use toolloop_core::{
//!     CancellationToken, ConsoleSink, GatewayModelConfig, GenaiGateway, LoopConfig,
//!     LoopContext, McpClient, McpToolRegistry, ToolLoop, ConsoleLogger,
//! };
//!
//! let logger: Arc<dyn toolloop_core::Logger> = Arc::new(ConsoleLogger::new());
//! let client = Arc::new(McpClient::connect_http("http://localhost:8080/mcp", logger.clone()).await?);
//! let ctx = LoopContext::new(
//!     Arc::new(GenaiGateway::new(GatewayModelConfig::new("openai/gpt-4o"), logger.clone())),
//!     Arc::new(McpToolRegistry::with_client(client, logger.clone())),
//!     Arc::new(ConsoleSink),
//! )
//! .with_logger(logger);
//!
//! let tool_loop = ToolLoop::new(ctx, LoopConfig::default());
//! let mut messages = Vec::new();
//! let turn = tool_loop
//!     .respond("Analyze failed sign-ins this week", &mut messages, &CancellationToken::new())
//!     .await?;
//! ```

pub mod types;
pub mod logging;
pub mod config;
pub mod gateway;
pub mod tools;
pub mod mcp;
pub mod orchestrator;

// Re-export commonly used types
pub use types::{
    CancellationToken, ContentPart, ConversationMessage, Fragment, MessageRole, ToolCall,
    ToolDescriptor, ToolMode, ToolOutput, is_well_formed,
};

pub use logging::{ConsoleLogger, Logger, MemoryLogger, NoOpLogger};

pub use config::{ConfigError, ConfigLevel, FileConfigProvider, LoopConfig, load_layered};

pub use gateway::{
    GatewayError, GatewayModelConfig, GatewayResult, GenaiGateway, MockGateway, ModelGateway,
    RequestOptions,
};

pub use tools::{MemoryToolRegistry, McpToolRegistry, ToolError, ToolFilter, ToolRegistry};

pub use mcp::{McpClient, McpError, McpResult, McpTool, McpToolResult, is_internal_tool};

pub use orchestrator::{
    ConclusionEnforcer, ConclusionOutcome, ConsoleSink, KeywordClassifier, LoopContext, LoopError,
    LoopOutcome, OutputSink, RecordingSink, RequestClassifier, TerminationReason, ToolInvoker,
    ToolLoop, ToolResultOutcome, TruncationPolicy, TurnOutcome, truncate,
};

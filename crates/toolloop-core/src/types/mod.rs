//! Core types for the orchestration loop
//!
//! This module contains the conversation vocabulary shared by the gateway,
//! the tool registry and the loop controller.

mod message;
mod tool;
mod stream;
mod cancellation;

pub use message::{ConversationMessage, ContentPart, MessageRole, is_well_formed};
pub use tool::{ToolDescriptor, ToolCall, ToolOutput, ToolMode};
pub use stream::Fragment;
pub use cancellation::CancellationToken;

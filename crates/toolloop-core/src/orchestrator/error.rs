//! Loop errors

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::tools::ToolError;

/// Failures that end a loop run
///
/// Tool invocation failures are not here: they are contained and fed back to
/// the model as failed tool results.
#[derive(Error, Debug)]
pub enum LoopError {
    /// The model gateway could not serve a round
    #[error("Model request failed: {0}")]
    Gateway(#[from] GatewayError),

    /// The tool set could not be listed before the first round
    #[error("Failed to list tools: {0}")]
    ToolListing(ToolError),
}

impl LoopError {
    /// Whether the failure looks like the backend or host being unreachable
    pub fn is_connection_error(&self) -> bool {
        match self {
            LoopError::Gateway(e) => e.is_connection_error(),
            LoopError::ToolListing(ToolError::NoClient) | LoopError::ToolListing(ToolError::Mcp(_)) => true,
            LoopError::ToolListing(_) => false,
        }
    }
}

pub type LoopResult<T> = Result<T, LoopError>;

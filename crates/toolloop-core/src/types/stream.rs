//! Streaming response types

use serde::{Deserialize, Serialize};
use super::tool::ToolCall;

/// One incremental unit of a streamed model response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Fragment {
    /// Text content chunk
    Text {
        text: String,
    },
    /// Complete tool call
    ToolCall {
        #[serde(rename = "toolCall")]
        tool_call: ToolCall,
    },
}

impl Fragment {
    /// Create a text fragment
    pub fn text(text: impl Into<String>) -> Self {
        Fragment::Text { text: text.into() }
    }

    /// Create a tool call fragment
    pub fn tool_call(tool_call: ToolCall) -> Self {
        Fragment::ToolCall { tool_call }
    }

    /// Get the text content if this is a text fragment
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Fragment::Text { text } => Some(text),
            Fragment::ToolCall { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_fragment() {
        let fragment = Fragment::text("Hello");
        assert_eq!(fragment.as_text(), Some("Hello"));
    }

    #[test]
    fn test_tool_call_fragment_serialization() {
        let fragment = Fragment::tool_call(ToolCall::new("id1", "query_table", json!({"table": "t"})));
        assert_eq!(fragment.as_text(), None);

        let json = serde_json::to_string(&fragment).unwrap();
        assert!(json.contains("\"type\":\"tool_call\""));
        assert!(json.contains("\"toolCall\""));
    }
}

//! Conversation message types

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One turn of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// The role of the message sender
    pub role: MessageRole,
    /// Ordered content of the turn
    pub parts: Vec<ContentPart>,
}

impl ConversationMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_parts(MessageRole::System, vec![ContentPart::text(content)])
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_parts(MessageRole::User, vec![ContentPart::text(content)])
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_parts(MessageRole::Assistant, vec![ContentPart::text(content)])
    }

    /// Create a message with structured content parts
    pub fn with_parts(role: MessageRole, parts: Vec<ContentPart>) -> Self {
        Self { role, parts }
    }

    /// Concatenated text of the top-level text parts
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(ContentPart::as_text)
            .collect::<Vec<_>>()
            .join("")
    }

    /// Tool calls carried by this message, in order
    pub fn tool_call_ids(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|p| match p {
            ContentPart::ToolCall { id, .. } => Some(id.as_str()),
            _ => None,
        })
    }

    /// Tool result call ids carried by this message, in order
    pub fn tool_result_ids(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|p| match p {
            ContentPart::ToolResult { call_id, .. } => Some(call_id.as_str()),
            _ => None,
        })
    }
}

/// Content part of a conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text content
    Text {
        text: String,
    },
    /// Tool call issued by the model
    ToolCall {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// Outcome of a tool call, paired to it by id
    ToolResult {
        #[serde(rename = "callId")]
        call_id: String,
        parts: Vec<ContentPart>,
        ok: bool,
    },
}

impl ContentPart {
    /// Create a text content part
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// Create a tool call content part
    pub fn tool_call(id: impl Into<String>, name: impl Into<String>, input: serde_json::Value) -> Self {
        ContentPart::ToolCall {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    /// Create a tool result content part
    pub fn tool_result(call_id: impl Into<String>, parts: Vec<ContentPart>, ok: bool) -> Self {
        ContentPart::ToolResult {
            call_id: call_id.into(),
            parts,
            ok,
        }
    }

    /// Get the text if this is a text part
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text { text } => Some(text),
            ContentPart::ToolCall { .. } | ContentPart::ToolResult { .. } => None,
        }
    }
}

/// Check that every tool call is answered by exactly one later tool result
/// with the same id, and that no result appears without a preceding call.
///
/// Ids may be reused once answered; some providers use the function name as
/// the call id.
pub fn is_well_formed(messages: &[ConversationMessage]) -> bool {
    let mut pending: HashMap<&str, usize> = HashMap::new();

    for message in messages {
        for part in &message.parts {
            match part {
                ContentPart::Text { .. } => {}
                ContentPart::ToolCall { id, .. } => {
                    *pending.entry(id.as_str()).or_insert(0) += 1;
                }
                ContentPart::ToolResult { call_id, .. } => match pending.get_mut(call_id.as_str()) {
                    Some(open) if *open > 0 => *open -= 1,
                    _ => return false,
                },
            }
        }
    }

    pending.values().all(|&open| open == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call_turn(ids: &[&str]) -> ConversationMessage {
        ConversationMessage::with_parts(
            MessageRole::Assistant,
            ids.iter()
                .map(|id| ContentPart::tool_call(*id, "lookup", json!({})))
                .collect(),
        )
    }

    fn result_turn(ids: &[&str]) -> ConversationMessage {
        ConversationMessage::with_parts(
            MessageRole::User,
            ids.iter()
                .map(|id| ContentPart::tool_result(*id, vec![ContentPart::text("ok")], true))
                .collect(),
        )
    }

    #[test]
    fn test_message_creation() {
        let sys = ConversationMessage::system("You are helpful");
        assert_eq!(sys.role, MessageRole::System);
        assert_eq!(sys.text(), "You are helpful");

        let user = ConversationMessage::user("Hello");
        assert_eq!(user.role, MessageRole::User);

        let asst = ConversationMessage::assistant("Hi there!");
        assert_eq!(asst.role, MessageRole::Assistant);
    }

    #[test]
    fn test_content_part_serialization() {
        let part = ContentPart::text("Hello");
        let json = serde_json::to_string(&part).unwrap();
        assert!(json.contains("\"type\":\"text\""));

        let result = ContentPart::tool_result("call_1", vec![], false);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"type\":\"tool_result\""));
        assert!(json.contains("\"callId\":\"call_1\""));
        assert!(json.contains("\"ok\":false"));
    }

    #[test]
    fn test_well_formed_history() {
        let messages = vec![
            ConversationMessage::user("list customers"),
            call_turn(&["a", "b"]),
            result_turn(&["a", "b"]),
            ConversationMessage::assistant("done"),
        ];
        assert!(is_well_formed(&messages));
        assert!(is_well_formed(&[]));
    }

    #[test]
    fn test_unanswered_call_is_malformed() {
        let messages = vec![call_turn(&["a", "b"]), result_turn(&["a"])];
        assert!(!is_well_formed(&messages));
    }

    #[test]
    fn test_orphan_result_is_malformed() {
        let messages = vec![result_turn(&["x"])];
        assert!(!is_well_formed(&messages));

        // Result before its call
        let messages = vec![result_turn(&["a"]), call_turn(&["a"])];
        assert!(!is_well_formed(&messages));
    }

    #[test]
    fn test_reused_id_across_rounds() {
        let messages = vec![
            call_turn(&["query_table"]),
            result_turn(&["query_table"]),
            call_turn(&["query_table"]),
            result_turn(&["query_table"]),
        ];
        assert!(is_well_formed(&messages));

        // Two calls sharing an id in one turn need two results
        let messages = vec![call_turn(&["lookup", "lookup"]), result_turn(&["lookup"])];
        assert!(!is_well_formed(&messages));
    }

    #[test]
    fn test_duplicate_result_is_malformed() {
        let messages = vec![call_turn(&["a"]), result_turn(&["a"]), result_turn(&["a"])];
        assert!(!is_well_formed(&messages));
    }
}

//! Adapter between toolloop types and genai types
//!
//! Tool turns go to genai natively: an assistant message carrying the calls,
//! then one tool response per result. A round sent without tools gets the
//! same turns flattened to text, since some providers reject tool turns in a
//! request that declares no tools.

use std::future::Future;
use std::pin::Pin;

use genai::chat::{
    ChatMessage as GenaiMessage, ChatOptions as GenaiOptions, ChatStreamEvent,
    MessageContent as GenaiContent, Tool as GenaiTool, ToolCall as GenaiToolCall,
    ToolResponse as GenaiToolResponse,
};
use genai::resolver::{AuthData, AuthResolver, Endpoint, ServiceTargetResolver};
use genai::{adapter::AdapterKind, Client, ModelIden, ServiceTarget};

use crate::types::{ContentPart, ConversationMessage, Fragment, MessageRole, ToolCall, ToolDescriptor};

use super::error::{GatewayError, GatewayResult};

// ============================================================================
// Message Conversion: toolloop -> genai
// ============================================================================

/// How tool calls and results are rendered for genai
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolTurns {
    /// Native assistant tool calls and tool responses
    Native,
    /// Plain text, for requests that declare no tools
    Flattened,
}

/// Render one content part as plain text
pub fn flatten_part(part: &ContentPart) -> String {
    match part {
        ContentPart::Text { text } => text.clone(),
        ContentPart::ToolCall { id, name, input } => {
            format!("[Tool call {} -> {}({})]", id, name, input)
        }
        ContentPart::ToolResult { call_id, parts, ok } => {
            let body = parts.iter().map(flatten_part).collect::<Vec<_>>().join("\n");
            let status = if *ok { "ok" } else { "failed" };
            format!("[Tool result for {} ({})]: {}", call_id, status, body)
        }
    }
}

fn text_message(role: MessageRole, text: String) -> GenaiMessage {
    let content = GenaiContent::from(text);
    match role {
        MessageRole::System => GenaiMessage::system(content),
        MessageRole::User => GenaiMessage::user(content),
        MessageRole::Assistant => GenaiMessage::assistant(content),
    }
}

/// Convert a toolloop tool call to a genai tool call
///
/// Built through serde because the field set of genai's `ToolCall` varies
/// across releases; fields we do not carry deserialize to their defaults.
pub fn to_genai_tool_call(id: &str, name: &str, input: &serde_json::Value) -> Option<GenaiToolCall> {
    serde_json::from_value(serde_json::json!({
        "call_id": id,
        "fn_name": name,
        "fn_arguments": input,
    }))
    .ok()
}

/// Convert a tool result part to a genai tool response
pub fn to_genai_tool_response(call_id: &str, parts: &[ContentPart], ok: bool) -> GenaiToolResponse {
    let body = parts.iter().map(flatten_part).collect::<Vec<_>>().join("\n");
    let content = if ok { body } else { format!("[failed] {}", body) };
    GenaiToolResponse::new(call_id.to_string(), content)
}

/// Convert a toolloop message to one or more genai messages
///
/// In native mode, text runs become role messages, tool calls are grouped
/// into one assistant tool-call message, and each tool result becomes its
/// own tool response, all in part order.
pub fn to_genai_message(msg: &ConversationMessage, turns: ToolTurns) -> Vec<GenaiMessage> {
    if turns == ToolTurns::Flattened {
        let text = msg.parts.iter().map(flatten_part).collect::<Vec<_>>().join("\n");
        return vec![text_message(msg.role, text)];
    }

    let mut out = Vec::new();
    let mut text: Vec<String> = Vec::new();
    let mut calls: Vec<GenaiToolCall> = Vec::new();

    fn flush_text(out: &mut Vec<GenaiMessage>, text: &mut Vec<String>, role: MessageRole) {
        if !text.is_empty() {
            out.push(text_message(role, text.join("\n")));
            text.clear();
        }
    }
    fn flush_calls(out: &mut Vec<GenaiMessage>, calls: &mut Vec<GenaiToolCall>) {
        if !calls.is_empty() {
            out.push(GenaiMessage::from(std::mem::take(calls)));
        }
    }

    for part in &msg.parts {
        match part {
            ContentPart::Text { text: t } => {
                flush_calls(&mut out, &mut calls);
                text.push(t.clone());
            }
            ContentPart::ToolCall { id, name, input } => {
                flush_text(&mut out, &mut text, msg.role);
                match to_genai_tool_call(id, name, input) {
                    Some(call) => calls.push(call),
                    None => text.push(flatten_part(part)),
                }
            }
            ContentPart::ToolResult { call_id, parts, ok } => {
                flush_text(&mut out, &mut text, msg.role);
                flush_calls(&mut out, &mut calls);
                out.push(GenaiMessage::from(to_genai_tool_response(call_id, parts, *ok)));
            }
        }
    }
    flush_text(&mut out, &mut text, msg.role);
    flush_calls(&mut out, &mut calls);

    if out.is_empty() {
        out.push(text_message(msg.role, String::new()));
    }
    out
}

/// Convert a conversation to genai messages
pub fn to_genai_messages(messages: &[ConversationMessage], turns: ToolTurns) -> Vec<GenaiMessage> {
    messages.iter().flat_map(|m| to_genai_message(m, turns)).collect()
}

// ============================================================================
// Tool Conversion: toolloop -> genai
// ============================================================================

/// Convert a tool descriptor to a genai tool
pub fn to_genai_tool(tool: &ToolDescriptor) -> GenaiTool {
    GenaiTool::new(&tool.name)
        .with_description(&tool.description)
        .with_schema(tool.input_schema.clone())
}

/// Convert tool descriptors to genai tools
pub fn to_genai_tools(tools: &[ToolDescriptor]) -> Vec<GenaiTool> {
    tools.iter().map(to_genai_tool).collect()
}

/// Chat options for a streamed round
pub fn stream_options() -> GenaiOptions {
    // Capture tool calls in stream so they can be emitted at the end
    GenaiOptions::default().with_capture_tool_calls(true)
}

// ============================================================================
// Response Conversion: genai -> toolloop
// ============================================================================

/// Convert a genai tool call
pub fn from_genai_tool_call(tc: &GenaiToolCall) -> ToolCall {
    ToolCall {
        id: tc.call_id.clone(),
        name: tc.fn_name.clone(),
        input: tc.fn_arguments.clone(),
    }
}

/// Convert a genai stream event into zero or more fragments
///
/// Partial tool-call chunks are dropped; the complete calls captured by genai
/// are emitted, in order, when the stream ends.
pub fn from_genai_event(event: ChatStreamEvent) -> Vec<GatewayResult<Fragment>> {
    match event {
        ChatStreamEvent::Chunk(chunk) => {
            if chunk.content.is_empty() {
                vec![]
            } else {
                vec![Ok(Fragment::text(chunk.content))]
            }
        }
        ChatStreamEvent::End(end) => match end.captured_tool_calls() {
            Some(tool_calls) => tool_calls
                .iter()
                .map(|tc| Ok(Fragment::tool_call(from_genai_tool_call(tc))))
                .collect(),
            None => vec![],
        },
        _ => vec![],
    }
}

// ============================================================================
// Provider Resolution
// ============================================================================

/// Which model a gateway talks to, and how
#[derive(Debug, Clone)]
pub struct GatewayModelConfig {
    /// Provider identifier (e.g., "openai", "azure", "openrouter")
    pub provider: String,
    /// Model identifier, optionally prefixed with the provider ("openai/gpt-4o")
    pub model: String,
    /// API key for authentication; falls back to `<PROVIDER>_API_KEY`
    pub api_key: Option<String>,
    /// Custom API base URL (OpenAI-compatible)
    pub api_base: Option<String>,
}

impl GatewayModelConfig {
    /// Create a model config, taking the provider from a "provider/model" prefix
    pub fn new(model: impl Into<String>) -> Self {
        let model = model.into();
        let provider = match model.split_once('/') {
            Some((provider, _)) => provider.to_string(),
            None => "openai".to_string(),
        };
        Self {
            provider,
            model,
            api_key: None,
            api_base: None,
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the API base URL
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    /// Model name without the provider prefix
    pub fn model_name(&self) -> &str {
        self.model
            .split_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.model)
    }
}

/// Environment variable consulted for a provider's API key
pub fn provider_env_var(provider: &str) -> String {
    match provider.to_lowercase().as_str() {
        "gemini" | "google" => "GEMINI_API_KEY".to_string(),
        "azure" => "AZURE_OPENAI_API_KEY".to_string(),
        other => format!("{}_API_KEY", other.to_uppercase().replace('-', "_")),
    }
}

/// Create a genai Client with explicit auth and endpoint resolution
pub fn create_client(config: &GatewayModelConfig) -> Client {
    let auth_provider = config.provider.clone();
    let auth_explicit_key = config.api_key.clone();

    let auth_resolver = AuthResolver::from_resolver_async_fn(
        move |_model_iden: ModelIden| -> Pin<Box<dyn Future<Output = genai::resolver::Result<Option<AuthData>>> + Send>> {
            let provider = auth_provider.clone();
            let explicit_key = auth_explicit_key.clone();

            Box::pin(async move {
                if let Some(key) = explicit_key {
                    return Ok(Some(AuthData::from_single(key)));
                }

                // None lets genai handle the "no auth" case (fine for Ollama)
                Ok(std::env::var(provider_env_var(&provider))
                    .ok()
                    .map(AuthData::from_single))
            })
        },
    );

    let target_provider = config.provider.to_lowercase();
    let target_api_base = config.api_base.clone();

    let target_resolver = ServiceTargetResolver::from_resolver_fn(
        move |target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
            let ServiceTarget { ref model, .. } = target;

            let endpoint = match (target_provider.as_str(), target_api_base.as_ref()) {
                (_, Some(base)) => Endpoint::from_owned(base.clone()),
                ("openrouter", None) => Endpoint::from_static("https://openrouter.ai/api/v1/"),
                ("mistral", None) => Endpoint::from_static("https://api.mistral.ai/v1/"),
                // Native genai providers - let it resolve normally
                _ => return Ok(target),
            };

            let resolved_model = ModelIden::new(AdapterKind::OpenAI, model.model_name.clone());

            Ok(ServiceTarget {
                endpoint,
                auth: target.auth,
                model: resolved_model,
            })
        },
    );

    Client::builder()
        .with_auth_resolver(auth_resolver)
        .with_service_target_resolver(target_resolver)
        .build()
}

/// Map a genai error message into a gateway error for `provider`
pub fn map_genai_error(provider: &str, message: String) -> GatewayError {
    let lower = message.to_lowercase();
    if lower.contains("429") || lower.contains("rate limit") {
        GatewayError::rate_limited(provider, message)
    } else if lower.contains("no model") || lower.contains("model not found") {
        GatewayError::NoModel(message)
    } else {
        GatewayError::api_error(provider, 500, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genai::chat::ChatRole;
    use serde_json::json;

    #[test]
    fn test_flatten_tool_turns() {
        let call = ContentPart::tool_call("c1", "query_table", json!({"table": "customers"}));
        assert_eq!(
            flatten_part(&call),
            "[Tool call c1 -> query_table({\"table\":\"customers\"})]"
        );

        let result = ContentPart::tool_result("c1", vec![ContentPart::text("3 rows")], true);
        assert_eq!(flatten_part(&result), "[Tool result for c1 (ok)]: 3 rows");
    }

    #[test]
    fn test_message_conversion() {
        let msg = ConversationMessage::user("Hello, world!");
        let genai_msgs = to_genai_message(&msg, ToolTurns::Native);
        assert_eq!(genai_msgs.len(), 1);
        assert!(matches!(genai_msgs[0].role, ChatRole::User));
    }

    fn tool_round() -> Vec<ConversationMessage> {
        vec![
            ConversationMessage::with_parts(
                MessageRole::Assistant,
                vec![
                    ContentPart::text("Checking both tables."),
                    ContentPart::tool_call("c1", "query_table", json!({"table": "customers"})),
                    ContentPart::tool_call("c2", "query_table", json!({"table": "orders"})),
                ],
            ),
            ConversationMessage::with_parts(
                MessageRole::User,
                vec![
                    ContentPart::tool_result("c1", vec![ContentPart::text("3 rows")], true),
                    ContentPart::tool_result("c2", vec![ContentPart::text("timeout")], false),
                ],
            ),
        ]
    }

    #[test]
    fn test_tool_call_turn_is_native() {
        let round = tool_round();
        let genai_msgs = to_genai_message(&round[0], ToolTurns::Native);

        // Text first, then one assistant message holding both calls
        assert_eq!(genai_msgs.len(), 2);
        assert!(matches!(genai_msgs[0].role, ChatRole::Assistant));
        assert!(matches!(genai_msgs[1].role, ChatRole::Assistant));

        let call = to_genai_tool_call("c1", "query_table", &json!({"table": "customers"})).unwrap();
        assert_eq!(call.call_id, "c1");
        assert_eq!(call.fn_name, "query_table");
        assert_eq!(call.fn_arguments["table"], "customers");
    }

    #[test]
    fn test_tool_result_turn_is_native() {
        let round = tool_round();
        let genai_msgs = to_genai_message(&round[1], ToolTurns::Native);

        assert_eq!(genai_msgs.len(), 2);
        assert!(genai_msgs.iter().all(|m| matches!(m.role, ChatRole::Tool)));

        let failed = to_genai_tool_response("c2", &[ContentPart::text("timeout")], false);
        assert_eq!(failed.call_id, "c2");
        assert_eq!(failed.content, "[failed] timeout");
    }

    #[test]
    fn test_tool_free_request_flattens_turns() {
        let genai_msgs = to_genai_messages(&tool_round(), ToolTurns::Flattened);
        assert_eq!(genai_msgs.len(), 2);
        assert!(matches!(genai_msgs[0].role, ChatRole::Assistant));
        assert!(matches!(genai_msgs[1].role, ChatRole::User));
    }

    #[test]
    fn test_tool_conversion() {
        let tool = ToolDescriptor::new("query_table", "Run a query").with_schema(json!({
            "type": "object",
            "properties": { "table": { "type": "string" } }
        }));

        let genai_tool = to_genai_tool(&tool);
        assert_eq!(genai_tool.name, "query_table");
    }

    #[test]
    fn test_model_config_prefix() {
        let config = GatewayModelConfig::new("anthropic/claude-3-5-sonnet");
        assert_eq!(config.provider, "anthropic");
        assert_eq!(config.model_name(), "claude-3-5-sonnet");

        let config = GatewayModelConfig::new("gpt-4o");
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model_name(), "gpt-4o");
    }

    #[test]
    fn test_error_mapping() {
        let err = map_genai_error("openai", "HTTP 429 Too Many Requests".to_string());
        assert!(matches!(err, GatewayError::RateLimited { .. }));

        let err = map_genai_error("openai", "connection refused".to_string());
        assert!(err.is_connection_error());
    }

    #[test]
    fn test_provider_env_var() {
        assert_eq!(provider_env_var("openai"), "OPENAI_API_KEY");
        assert_eq!(provider_env_var("gemini"), "GEMINI_API_KEY");
        assert_eq!(provider_env_var("open-router"), "OPEN_ROUTER_API_KEY");
    }
}

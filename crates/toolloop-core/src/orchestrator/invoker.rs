//! Tool invocation with failure containment
//!
//! Every tool call must get exactly one result, or the next model round is
//! malformed. The invoker therefore never returns an error: registry failures,
//! unknown tools and cancellation all become a failed [`ToolResultOutcome`]
//! the model can read.

use crate::logging::Logger;
use crate::tools::{ToolError, ToolRegistry};
use crate::types::{CancellationToken, ContentPart, ToolCall, ToolDescriptor};

use super::context::LoopContext;
use super::sink::OutputSink;
use super::truncation::{truncate, TruncationPolicy};

/// Longest error message passed on to the model
const MAX_ERROR_CHARS: usize = 500;

const REMEDIATION_HINTS: &[&str] = &[
    "Check that the tool backend process is running.",
    "Check the tool configuration and credentials.",
    "If the error mentions the input, retry with corrected arguments.",
];

/// Result of one tool call as fed back to the model
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResultOutcome {
    Ok {
        parts: Vec<ContentPart>,
    },
    Failed {
        parts: Vec<ContentPart>,
        /// Sanitized error message
        diagnostic: String,
    },
}

impl ToolResultOutcome {
    /// Failure outcome for `tool_name` with a model-readable explanation
    pub fn failed(tool_name: &str, error: &str) -> Self {
        let diagnostic = sanitize_error(error);
        let mut text = format!("Tool `{}` failed: {}\n\nTroubleshooting:", tool_name, diagnostic);
        for hint in REMEDIATION_HINTS {
            text.push_str("\n- ");
            text.push_str(hint);
        }

        ToolResultOutcome::Failed {
            parts: vec![ContentPart::text(text)],
            diagnostic,
        }
    }

    /// Failure outcome for a call that was never started
    pub fn cancelled(tool_name: &str) -> Self {
        Self::failed(tool_name, &ToolError::Cancelled.to_string())
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ToolResultOutcome::Ok { .. })
    }

    pub fn parts(&self) -> &[ContentPart] {
        match self {
            ToolResultOutcome::Ok { parts } | ToolResultOutcome::Failed { parts, .. } => parts,
        }
    }

    /// Tool result part answering the call `call_id`
    pub fn into_part(self, call_id: impl Into<String>) -> ContentPart {
        let ok = self.is_ok();
        let parts = match self {
            ToolResultOutcome::Ok { parts } | ToolResultOutcome::Failed { parts, .. } => parts,
        };
        ContentPart::tool_result(call_id, parts, ok)
    }
}

/// Make an error message safe to show the model: control characters are
/// dropped, whitespace runs collapse to one space, and the length is capped.
pub fn sanitize_error(message: &str) -> String {
    let mut cleaned = String::with_capacity(message.len().min(MAX_ERROR_CHARS));
    let mut pending_space = false;
    let mut count = 0;

    for c in message.chars() {
        if c.is_whitespace() {
            pending_space = !cleaned.is_empty();
            continue;
        }
        if c.is_control() {
            continue;
        }
        if pending_space {
            cleaned.push(' ');
            count += 1;
            pending_space = false;
        }
        if count == MAX_ERROR_CHARS {
            cleaned.push('…');
            break;
        }
        cleaned.push(c);
        count += 1;
    }

    if cleaned.is_empty() {
        "unknown error".to_string()
    } else {
        cleaned
    }
}

/// Runs single tool calls for a loop run
pub struct ToolInvoker<'a> {
    registry: &'a dyn ToolRegistry,
    sink: &'a dyn OutputSink,
    logger: &'a dyn Logger,
    policy: TruncationPolicy,
}

impl<'a> ToolInvoker<'a> {
    pub fn new(ctx: &'a LoopContext, policy: TruncationPolicy) -> Self {
        Self {
            registry: ctx.registry.as_ref(),
            sink: ctx.sink.as_ref(),
            logger: ctx.logger.as_ref(),
            policy,
        }
    }

    /// Invoke `call`; `descriptor` is the offered tool with that name, if any
    pub async fn invoke(
        &self,
        call: &ToolCall,
        descriptor: Option<&ToolDescriptor>,
        cancel: &CancellationToken,
    ) -> ToolResultOutcome {
        self.sink.emit_progress(&format!("calling tool: `{}`", call.name));

        let result = match descriptor {
            None => Err(ToolError::NotFound(call.name.clone())),
            Some(_) if cancel.is_cancelled() => Err(ToolError::Cancelled),
            Some(descriptor) => {
                crate::log_debug!(self.logger, "[ToolInvoker] {} input: {}", descriptor.name, call.input);
                self.registry.invoke(&descriptor.name, call.input.clone(), cancel).await
            }
        };

        match result {
            Ok(output) => {
                let parts = truncate(output.content, &self.policy);
                crate::log_debug!(self.logger, "[ToolInvoker] {} returned {} parts", call.name, parts.len());
                ToolResultOutcome::Ok { parts }
            }
            Err(e) => {
                let outcome = ToolResultOutcome::failed(&call.name, &e.to_string());
                if let ToolResultOutcome::Failed { ref diagnostic, .. } = outcome {
                    crate::log_warn!(self.logger, "[ToolInvoker] {} failed: {}", call.name, diagnostic);
                    self.sink
                        .emit_warning(&format!("Tool `{}` failed: {}", call.name, diagnostic));
                }
                outcome
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockGateway;
    use crate::logging::NoOpLogger;
    use crate::orchestrator::sink::{RecordingSink, SinkEvent};
    use crate::orchestrator::truncation::text_len;
    use crate::tools::MemoryToolRegistry;
    use crate::types::ToolOutput;
    use serde_json::json;
    use std::sync::Arc;

    fn setup() -> (LoopContext, Arc<MemoryToolRegistry>, Arc<RecordingSink>) {
        let registry = Arc::new(MemoryToolRegistry::new());
        let sink = Arc::new(RecordingSink::new());
        let ctx = LoopContext::new(
            Arc::new(MockGateway::echo(Arc::new(NoOpLogger))),
            registry.clone(),
            sink.clone(),
        );
        (ctx, registry, sink)
    }

    #[test]
    fn test_sanitize_error() {
        assert_eq!(
            sanitize_error("  connection\trefused\n\n(os error 111)\u{7}  "),
            "connection refused (os error 111)"
        );
        assert_eq!(sanitize_error("\u{0}\u{1b}"), "unknown error");

        let long = sanitize_error(&"x".repeat(2000));
        assert_eq!(long.chars().count(), MAX_ERROR_CHARS + 1);
        assert!(long.ends_with('…'));
    }

    #[tokio::test]
    async fn test_success_is_truncated() {
        let (ctx, registry, sink) = setup();
        let tool = ToolDescriptor::new("dump", "Dump a table");
        registry.register_fn(tool.clone(), |_| Ok(ToolOutput::text("y".repeat(50))));

        let invoker = ToolInvoker::new(&ctx, TruncationPolicy::new(20));
        let call = ToolCall::new("c1", "dump", json!({}));
        let outcome = invoker.invoke(&call, Some(&tool), &CancellationToken::new()).await;

        assert!(outcome.is_ok());
        assert_eq!(outcome.parts()[0].as_text().map(str::len), Some(20));
        assert!(text_len(outcome.parts()) > 20);
        assert_eq!(sink.events(), vec![SinkEvent::Progress("calling tool: `dump`".into())]);
    }

    #[tokio::test]
    async fn test_failure_is_contained() {
        let (ctx, registry, sink) = setup();
        let tool = ToolDescriptor::new("query_table", "Query");
        registry.register_fn(tool.clone(), |_| {
            Err(ToolError::Failed("connection refused\n".into()))
        });

        let invoker = ToolInvoker::new(&ctx, TruncationPolicy::default());
        let call = ToolCall::new("c1", "query_table", json!({"table": "t"}));
        let outcome = invoker.invoke(&call, Some(&tool), &CancellationToken::new()).await;

        match &outcome {
            ToolResultOutcome::Failed { parts, diagnostic } => {
                assert_eq!(diagnostic, "connection refused");
                assert_eq!(parts.len(), 1);
                let text = parts[0].as_text().unwrap();
                assert!(text.contains("query_table"));
                assert!(text.contains("connection refused"));
                assert!(text.contains("backend process is running"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(sink.warnings().len(), 1);

        match outcome.into_part("c1") {
            ContentPart::ToolResult { call_id, ok, .. } => {
                assert_eq!(call_id, "c1");
                assert!(!ok);
            }
            other => panic!("unexpected part {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_never_reaches_registry() {
        let (ctx, registry, sink) = setup();
        let invoker = ToolInvoker::new(&ctx, TruncationPolicy::default());
        let call = ToolCall::new("c1", "drop_table", json!({}));

        let outcome = invoker.invoke(&call, None, &CancellationToken::new()).await;

        assert!(!outcome.is_ok());
        assert!(outcome.parts()[0].as_text().unwrap().contains("Unknown tool: drop_table"));
        assert_eq!(registry.call_count(), 0);
        assert_eq!(sink.progress(), vec!["calling tool: `drop_table`".to_string()]);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let (ctx, registry, _sink) = setup();
        let tool = ToolDescriptor::new("t", "");
        registry.register_fn(tool.clone(), |_| Ok(ToolOutput::text("x")));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let invoker = ToolInvoker::new(&ctx, TruncationPolicy::default());
        let outcome = invoker.invoke(&ToolCall::new("c1", "t", json!({})), Some(&tool), &cancel).await;

        assert!(matches!(outcome, ToolResultOutcome::Failed { ref diagnostic, .. } if diagnostic == "Tool call cancelled"));
        assert_eq!(registry.call_count(), 0);
    }
}

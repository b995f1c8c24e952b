//! The tool loop
//!
//! Drives rounds between the model gateway and the tool registry:
//!
//! ```text
//! AwaitingResponse -> Streaming -> HasToolCalls -> Invoking -> AwaitingResponse
//!                              \-> NoToolCalls  -> Done
//! ```
//!
//! Cancellation is checked at the top of every round and raced against the
//! stream; the iteration cap is checked after each tool round. The caller's
//! message history is only appended to, and only between rounds.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::LoopConfig;
use crate::gateway::RequestOptions;
use crate::types::{CancellationToken, ContentPart, ConversationMessage, MessageRole, ToolDescriptor, ToolMode};

use super::conclusion::{ConclusionEnforcer, ConclusionOutcome, RequestClassifier};
use super::context::LoopContext;
use super::error::{LoopError, LoopResult};
use super::invoker::{ToolInvoker, ToolResultOutcome};
use super::round::stream_round;

/// Why a loop run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// A round produced no tool calls
    NaturalStop,
    /// The round limit was reached
    IterationCap,
    /// The cancellation token fired
    Cancelled,
}

/// Mutable state of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopState {
    /// Completed tool rounds
    pub iteration: usize,
    pub max_iterations: usize,
    pub cancelled: bool,
}

impl LoopState {
    pub fn new(max_iterations: usize) -> Self {
        Self {
            iteration: 0,
            max_iterations: max_iterations.max(1),
            cancelled: false,
        }
    }

    fn cap_reached(&self) -> bool {
        self.iteration >= self.max_iterations
    }
}

/// Result of [`ToolLoop::run`]
#[derive(Debug, Clone, PartialEq)]
pub struct LoopOutcome {
    pub termination: TerminationReason,
    /// Gateway requests made
    pub rounds: usize,
    /// All text streamed to the sink, across rounds
    pub text: String,
    /// Tool result parts appended to the history, in call order
    pub tool_results: Vec<ContentPart>,
}

/// Result of [`ToolLoop::respond`]
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub loop_outcome: LoopOutcome,
    pub conclusion: ConclusionOutcome,
}

impl TurnOutcome {
    /// Everything the user saw: the loop's text plus any supplement
    pub fn full_text(&self) -> String {
        match self.conclusion {
            ConclusionOutcome::Supplemented { ref text, .. } => {
                format!("{}\n\n{}", self.loop_outcome.text, text)
            }
            _ => self.loop_outcome.text.clone(),
        }
    }
}

/// Bounded multi-round orchestration of model and tools
pub struct ToolLoop {
    ctx: LoopContext,
    config: LoopConfig,
    enforcer: ConclusionEnforcer,
}

impl ToolLoop {
    pub fn new(ctx: LoopContext, config: LoopConfig) -> Self {
        let enforcer = ConclusionEnforcer::from_config(&config.conclusion);
        Self { ctx, config, enforcer }
    }

    /// Use a custom analysis classifier for the conclusion enforcer
    pub fn with_classifier(mut self, classifier: Arc<dyn RequestClassifier>) -> Self {
        self.enforcer = self.enforcer.with_classifier(classifier);
        self
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn context(&self) -> &LoopContext {
        &self.ctx
    }

    /// Run rounds until the model stops calling tools, the cap is reached or
    /// `cancel` fires
    ///
    /// Tool failures never surface here; only gateway failures do.
    pub async fn run(
        &self,
        messages: &mut Vec<ConversationMessage>,
        tools: &[ToolDescriptor],
        cancel: &CancellationToken,
    ) -> LoopResult<LoopOutcome> {
        let mut state = LoopState::new(self.config.max_iterations);
        let invoker = ToolInvoker::new(&self.ctx, self.config.truncation);
        let logger = &self.ctx.logger;

        let mut rounds = 0;
        let mut text = String::new();
        let mut tool_results = Vec::new();

        let termination = loop {
            if cancel.is_cancelled() {
                state.cancelled = true;
                break TerminationReason::Cancelled;
            }

            rounds += 1;
            crate::log_debug!(
                logger,
                "[ToolLoop] Round {} ({} messages, {} tools)",
                rounds,
                messages.len(),
                tools.len()
            );

            let options = RequestOptions::new()
                .with_tools(tools.to_vec())
                .with_tool_mode(ToolMode::Auto);
            let round = stream_round(&self.ctx, messages, options, cancel)
                .await
                .map_err(|e| {
                    crate::log_error!(logger, "[ToolLoop] Round {} failed: {}", rounds, e);
                    e
                })?;
            text.push_str(&round.text);

            if round.cancelled {
                // Keep what the user already saw; calls from this round are dropped
                if !round.text.is_empty() {
                    messages.push(ConversationMessage::assistant(round.text));
                }
                state.cancelled = true;
                break TerminationReason::Cancelled;
            }

            if round.tool_calls.is_empty() {
                if !round.text.is_empty() {
                    messages.push(ConversationMessage::assistant(round.text));
                }
                break TerminationReason::NaturalStop;
            }

            crate::log_info!(
                logger,
                "[ToolLoop] Round {} requested {} tool calls",
                rounds,
                round.tool_calls.len()
            );

            let mut call_parts = Vec::with_capacity(round.tool_calls.len() + 1);
            if !round.text.is_empty() {
                call_parts.push(ContentPart::text(round.text));
            }
            let mut result_parts = Vec::with_capacity(round.tool_calls.len());

            for call in &round.tool_calls {
                let outcome = if cancel.is_cancelled() {
                    ToolResultOutcome::cancelled(&call.name)
                } else {
                    let descriptor = tools.iter().find(|t| t.name == call.name);
                    invoker.invoke(call, descriptor, cancel).await
                };
                call_parts.push(call.to_part());
                result_parts.push(outcome.into_part(call.id.clone()));
            }

            tool_results.extend(result_parts.iter().cloned());
            messages.push(ConversationMessage::with_parts(MessageRole::Assistant, call_parts));
            messages.push(ConversationMessage::with_parts(MessageRole::User, result_parts));

            state.iteration += 1;
            if state.cap_reached() {
                crate::log_warn!(logger, "[ToolLoop] Stopping after {} tool rounds", state.iteration);
                self.ctx.sink.emit_warning(&format!(
                    "Stopped after {} tool rounds (iteration limit). The answer may be incomplete; \
                     ask a follow-up question to continue.",
                    state.iteration
                ));
                break TerminationReason::IterationCap;
            }
        };

        crate::log_debug!(logger, "[ToolLoop] Finished: {:?} after {} rounds", termination, rounds);

        Ok(LoopOutcome {
            termination,
            rounds,
            text,
            tool_results,
        })
    }

    /// Answer one user prompt: list tools, run the loop, then enforce the
    /// conclusion sections
    pub async fn respond(
        &self,
        user_prompt: &str,
        messages: &mut Vec<ConversationMessage>,
        cancel: &CancellationToken,
    ) -> LoopResult<TurnOutcome> {
        let tools = self.ctx.registry.list().await.map_err(LoopError::ToolListing)?;
        let tools = self.config.tools.to_filter().apply(tools);
        crate::log_debug!(self.ctx.logger, "[ToolLoop] Offering {} tools", tools.len());

        messages.push(ConversationMessage::user(user_prompt));

        let loop_outcome = self.run(messages, &tools, cancel).await?;

        let conclusion = match loop_outcome.termination {
            TerminationReason::Cancelled => ConclusionOutcome::Cancelled,
            TerminationReason::NaturalStop | TerminationReason::IterationCap => {
                self.enforcer
                    .maybe_enforce(user_prompt, &loop_outcome.text, messages, &self.ctx, cancel)
                    .await?
            }
        };

        Ok(TurnOutcome {
            loop_outcome,
            conclusion,
        })
    }
}

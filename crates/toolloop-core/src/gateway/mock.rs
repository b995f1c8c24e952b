//! Mock gateway for testing
//!
//! Provides deterministic, scripted rounds without network dependencies and
//! records every request it receives so tests can assert on what the loop sent.

use async_trait::async_trait;
use futures::{stream, StreamExt};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::error::{GatewayError, GatewayResult};
use super::traits::{FragmentStream, ModelGateway, RequestOptions};
use crate::logging::Logger;
use crate::types::{
    CancellationToken, ContentPart, ConversationMessage, Fragment, MessageRole, ToolCall,
    ToolDescriptor, ToolMode,
};

/// Mock response mode
#[derive(Debug, Clone, Default)]
pub enum MockMode {
    /// Echo back the last user text
    #[default]
    Echo,
    /// One fragment list per round; rounds past the end of the script are empty
    Script(Vec<Vec<Fragment>>),
    /// The same fragments every round
    Repeat(Vec<Fragment>),
    /// Fail after `after_fragments` text fragments; 0 fails the request itself
    Error { message: String, after_fragments: usize },
    /// Return nothing (empty response)
    Empty,
}

/// Configuration for the mock gateway
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Response mode
    pub mode: MockMode,
    /// Delay between fragments in milliseconds (0 = no delay)
    pub fragment_delay_ms: u64,
}

/// A request as seen by the mock gateway
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<ConversationMessage>,
    pub tools: Vec<ToolDescriptor>,
    pub tool_mode: ToolMode,
}

/// Mock model gateway for testing
pub struct MockGateway {
    config: MockConfig,
    round: AtomicUsize,
    requests: Mutex<Vec<RecordedRequest>>,
    logger: Arc<dyn Logger>,
}

impl MockGateway {
    /// Create with specific config
    pub fn with_config(config: MockConfig, logger: Arc<dyn Logger>) -> Self {
        Self {
            config,
            round: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            logger,
        }
    }

    /// Create an echo gateway (echoes back the last user text)
    pub fn echo(logger: Arc<dyn Logger>) -> Self {
        Self::with_config(MockConfig::default(), logger)
    }

    /// Create a gateway that plays back one fragment list per round
    pub fn scripted(rounds: Vec<Vec<Fragment>>, logger: Arc<dyn Logger>) -> Self {
        Self::with_config(
            MockConfig {
                mode: MockMode::Script(rounds),
                ..Default::default()
            },
            logger,
        )
    }

    /// Create a gateway that returns the same fragments every round
    pub fn repeating(fragments: Vec<Fragment>, logger: Arc<dyn Logger>) -> Self {
        Self::with_config(
            MockConfig {
                mode: MockMode::Repeat(fragments),
                ..Default::default()
            },
            logger,
        )
    }

    /// Create a gateway whose requests fail
    pub fn error(message: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_config(
            MockConfig {
                mode: MockMode::Error {
                    message: message.into(),
                    after_fragments: 0,
                },
                ..Default::default()
            },
            logger,
        )
    }

    /// Set fragment delay
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.config.fragment_delay_ms = delay_ms;
        self
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn last_user_text(messages: &[ConversationMessage]) -> String {
        messages
            .iter()
            .rev()
            .filter(|m| m.role == MessageRole::User)
            .map(ConversationMessage::text)
            .find(|t| !t.is_empty())
            .unwrap_or_else(|| "Hello from MockGateway!".to_string())
    }

    fn fragments_for_round(&self, round: usize, messages: &[ConversationMessage]) -> Vec<GatewayResult<Fragment>> {
        match &self.config.mode {
            MockMode::Echo => {
                let text = Self::last_user_text(messages);
                vec![Ok(Fragment::text(format!("Echo: {}", text)))]
            }
            MockMode::Script(rounds) => rounds
                .get(round)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .map(Ok)
                .collect(),
            MockMode::Repeat(fragments) => fragments
                .iter()
                .cloned()
                .map(|f| match f {
                    // Keep ids unique across rounds
                    Fragment::ToolCall { tool_call } => Ok(Fragment::tool_call(ToolCall::new(
                        format!("{}-r{}", tool_call.id, round + 1),
                        tool_call.name,
                        tool_call.input,
                    ))),
                    other => Ok(other),
                })
                .collect(),
            MockMode::Error { message, after_fragments } => {
                let mut result: Vec<GatewayResult<Fragment>> = (0..*after_fragments)
                    .map(|i| Ok(Fragment::text(format!("Fragment {} before error. ", i))))
                    .collect();
                result.push(Err(GatewayError::Other(format!("Mock error: {}", message))));
                result
            }
            MockMode::Empty => vec![],
        }
    }
}

#[async_trait]
impl ModelGateway for MockGateway {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send_request(
        &self,
        messages: Vec<ConversationMessage>,
        options: RequestOptions,
        cancel_token: CancellationToken,
    ) -> GatewayResult<FragmentStream> {
        let round = self.round.fetch_add(1, Ordering::SeqCst);
        self.logger.debug(&format!(
            "[MockGateway] send_request round {} ({} messages, {} tools)",
            round + 1,
            messages.len(),
            options.tools.len()
        ));

        let fragments = self.fragments_for_round(round, &messages);

        self.requests.lock().push(RecordedRequest {
            messages,
            tools: options.tools,
            tool_mode: options.tool_mode,
        });

        if let MockMode::Error { message, after_fragments: 0 } = &self.config.mode {
            return Err(GatewayError::NoModel(message.clone()));
        }

        let delay_ms = self.config.fragment_delay_ms;
        let logger = self.logger.clone();

        let stream = stream::iter(fragments.into_iter().enumerate()).then(move |(i, fragment)| {
            let logger = logger.clone();
            let cancel = cancel_token.clone();
            async move {
                if i > 0 && delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }

                if cancel.is_cancelled() {
                    return Err(GatewayError::Cancelled);
                }

                logger.debug(&format!("[MockGateway] Yielding fragment {}", i));
                fragment
            }
        });

        Ok(Box::pin(stream))
    }
}

/// Text of every tool result part in a message list, in order; handy for
/// asserting what the loop fed back to the model.
pub fn tool_result_texts(messages: &[ConversationMessage]) -> Vec<String> {
    messages
        .iter()
        .flat_map(|m| m.parts.iter())
        .filter_map(|p| match p {
            ContentPart::ToolResult { parts, .. } => Some(
                parts
                    .iter()
                    .filter_map(ContentPart::as_text)
                    .collect::<Vec<_>>()
                    .join(""),
            ),
            _ => None,
        })
        .collect()
}

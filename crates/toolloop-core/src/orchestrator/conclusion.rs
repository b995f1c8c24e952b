//! Conclusion enforcement for analysis requests
//!
//! Analysis answers are expected to end with a fixed set of sections. When a
//! prompt looks like an analysis request and the answer lacks some of them,
//! the enforcer asks the model once more, with no tools attached, to write
//! only the missing sections.

use std::sync::Arc;

use crate::config::ConclusionConfig;
use crate::gateway::RequestOptions;
use crate::types::{CancellationToken, ConversationMessage, MessageRole};

use super::context::LoopContext;
use super::error::LoopResult;
use super::round::stream_round;

/// Decides whether a prompt asks for analysis rather than a lookup
pub trait RequestClassifier: Send + Sync {
    fn is_analysis(&self, prompt: &str) -> bool;
}

impl<F> RequestClassifier for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_analysis(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Case-insensitive substring match against a keyword list
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    keywords: Vec<String>,
}

impl KeywordClassifier {
    pub fn new(keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.into().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }
}

impl RequestClassifier for KeywordClassifier {
    fn is_analysis(&self, prompt: &str) -> bool {
        let prompt = prompt.to_lowercase();
        self.keywords.iter().any(|k| prompt.contains(k.as_str()))
    }
}

/// What the enforcer did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConclusionOutcome {
    /// The prompt was not an analysis request (or enforcement is off)
    NotAnalysis,
    /// All required sections were already present
    Complete,
    /// A supplementary round produced `text` for the `missing` sections
    Supplemented { text: String, missing: Vec<String> },
    /// Cancelled before or during the supplementary round
    Cancelled,
}

/// Post-pass that completes the required sections of analysis answers
pub struct ConclusionEnforcer {
    classifier: Arc<dyn RequestClassifier>,
    required_sections: Vec<String>,
    enabled: bool,
}

impl ConclusionEnforcer {
    pub fn new(classifier: Arc<dyn RequestClassifier>, required_sections: Vec<String>) -> Self {
        Self {
            classifier,
            required_sections,
            enabled: true,
        }
    }

    /// Enforcer with a keyword classifier built from `config`
    pub fn from_config(config: &ConclusionConfig) -> Self {
        Self {
            classifier: Arc::new(KeywordClassifier::new(config.keywords.iter().cloned())),
            required_sections: config.required_sections.clone(),
            enabled: config.enabled,
        }
    }

    /// Replace the classifier
    pub fn with_classifier(mut self, classifier: Arc<dyn RequestClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Required sections not found (case-insensitively) in `text`
    pub fn missing_sections(&self, text: &str) -> Vec<String> {
        let text = text.to_lowercase();
        self.required_sections
            .iter()
            .filter(|s| !text.contains(&s.to_lowercase()))
            .cloned()
            .collect()
    }

    /// Check the answer and, if needed, run the one supplementary round
    ///
    /// `messages` is the conversation as left by the loop; it is not
    /// modified. The supplementary text is streamed to the sink after the
    /// original answer and returned in the outcome.
    pub async fn maybe_enforce(
        &self,
        user_prompt: &str,
        accumulated_text: &str,
        messages: &[ConversationMessage],
        ctx: &LoopContext,
        cancel: &CancellationToken,
    ) -> LoopResult<ConclusionOutcome> {
        if !self.enabled || !self.classifier.is_analysis(user_prompt) {
            return Ok(ConclusionOutcome::NotAnalysis);
        }

        let missing = self.missing_sections(accumulated_text);
        if missing.is_empty() {
            return Ok(ConclusionOutcome::Complete);
        }
        if cancel.is_cancelled() {
            return Ok(ConclusionOutcome::Cancelled);
        }

        crate::log_info!(
            ctx.logger,
            "[ConclusionEnforcer] Answer is missing {}; requesting them",
            missing.join(", ")
        );

        let mut request = messages.to_vec();
        if !accumulated_text.is_empty() && !answer_in_history(messages, accumulated_text) {
            request.push(ConversationMessage::assistant(accumulated_text));
        }
        request.push(ConversationMessage::user(directive(&missing)));

        ctx.sink.emit_text("\n\n");
        let round = stream_round(ctx, &request, RequestOptions::tool_free(), cancel).await?;

        if !round.tool_calls.is_empty() {
            crate::log_warn!(
                ctx.logger,
                "[ConclusionEnforcer] Ignoring {} tool calls in the supplementary round",
                round.tool_calls.len()
            );
        }
        if round.cancelled {
            return Ok(ConclusionOutcome::Cancelled);
        }

        Ok(ConclusionOutcome::Supplemented {
            text: round.text,
            missing,
        })
    }
}

/// Whether the assistant turns since the last prompt already carry `answer`
///
/// The loop records text from tool rounds inside the tool-call turns, so the
/// answer can be spread over several assistant messages.
fn answer_in_history(messages: &[ConversationMessage], answer: &str) -> bool {
    let since_prompt = messages
        .iter()
        .rposition(|m| m.role == MessageRole::User && !m.text().is_empty())
        .map_or(0, |i| i + 1);

    let recorded: String = messages[since_prompt..]
        .iter()
        .filter(|m| m.role == MessageRole::Assistant)
        .map(ConversationMessage::text)
        .collect();

    !recorded.is_empty() && recorded.ends_with(answer)
}

fn directive(missing: &[String]) -> String {
    let mut text = String::from(
        "Your answer above is missing the following required sections:\n",
    );
    for section in missing {
        text.push_str("- ");
        text.push_str(section);
        text.push('\n');
    }
    text.push_str(
        "\nWrite only these sections, using the headings exactly as listed and drawing only on \
         the findings already in your answer. Do not repeat the rest of the answer and do not \
         call any tools.",
    );
    text
}

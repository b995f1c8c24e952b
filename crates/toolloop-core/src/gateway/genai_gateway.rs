//! GenaiGateway - model gateway backed by the genai crate
//!
//! Handles all genai-supported providers (OpenAI, Anthropic, Gemini, Ollama, ...)
//! and OpenAI-compatible endpoints (OpenRouter, Mistral, any custom `api_base`).

use async_trait::async_trait;
use futures::{stream, StreamExt};
use std::sync::Arc;

use genai::chat::{ChatRequest, ChatStreamEvent};

use crate::logging::Logger;
use crate::types::{CancellationToken, ConversationMessage, ToolMode};

use super::error::{GatewayError, GatewayResult};
use super::genai_adapter::{
    create_client, from_genai_event, map_genai_error, stream_options, to_genai_messages,
    to_genai_tools, GatewayModelConfig, ToolTurns,
};
use super::traits::{FragmentStream, ModelGateway, RequestOptions};

/// Model gateway using genai for all supported LLM APIs
pub struct GenaiGateway {
    config: GatewayModelConfig,
    logger: Arc<dyn Logger>,
}

impl GenaiGateway {
    /// Create a new GenaiGateway
    pub fn new(config: GatewayModelConfig, logger: Arc<dyn Logger>) -> Self {
        Self { config, logger }
    }

    /// The model configuration this gateway was built with
    pub fn model_config(&self) -> &GatewayModelConfig {
        &self.config
    }
}

#[async_trait]
impl ModelGateway for GenaiGateway {
    fn name(&self) -> &str {
        &self.config.provider
    }

    async fn send_request(
        &self,
        messages: Vec<ConversationMessage>,
        options: RequestOptions,
        cancel_token: CancellationToken,
    ) -> GatewayResult<FragmentStream> {
        if cancel_token.is_cancelled() {
            return Err(GatewayError::Cancelled);
        }

        self.logger.info(&format!(
            "[GenaiGateway] send_request: provider={}, model={}, messages={}, tools={}",
            self.config.provider,
            self.config.model,
            messages.len(),
            options.tools.len()
        ));

        // A tool-free round gets no tool definitions at all, so the model
        // cannot answer with a call, and earlier tool turns go as text.
        let with_tools = options.tool_mode != ToolMode::None && !options.tools.is_empty();
        let turns = if with_tools { ToolTurns::Native } else { ToolTurns::Flattened };

        let mut chat_req = ChatRequest::new(to_genai_messages(&messages, turns));
        if with_tools {
            chat_req = chat_req.with_tools(to_genai_tools(&options.tools));
        }

        let genai_options = stream_options();
        let model_name = self.config.model_name();

        let client = create_client(&self.config);
        let chat_stream = client
            .exec_chat_stream(model_name, chat_req, Some(&genai_options))
            .await
            .map_err(|e| map_genai_error(&self.config.provider, e.to_string()))?;

        self.logger.debug("[GenaiGateway] Stream started");

        let cancel = cancel_token.clone();
        let logger = Arc::clone(&self.logger);
        let provider_id = self.config.provider.clone();

        let fragments = chat_stream
            .stream
            .map(move |result| {
                if cancel.is_cancelled() {
                    logger.info("[GenaiGateway] Stream cancelled");
                    return vec![Err(GatewayError::Cancelled)];
                }

                match result {
                    Ok(event) => {
                        if let ChatStreamEvent::End(_) = &event {
                            logger.debug("[GenaiGateway] Stream event: End");
                        }
                        from_genai_event(event)
                    }
                    Err(e) => {
                        logger.error(&format!("[GenaiGateway] Stream error: {}", e));
                        vec![Err(map_genai_error(&provider_id, e.to_string()))]
                    }
                }
            })
            .flat_map(stream::iter);

        Ok(Box::pin(fragments))
    }
}

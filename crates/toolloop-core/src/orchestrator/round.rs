//! One request/response cycle with the model gateway

use futures::StreamExt;

use crate::gateway::{GatewayError, RequestOptions};
use crate::types::{CancellationToken, ConversationMessage, Fragment, ToolCall};

use super::context::LoopContext;
use super::error::LoopResult;

/// What a round produced
#[derive(Debug, Default)]
pub(crate) struct RoundOutput {
    /// Text already emitted to the sink
    pub text: String,
    /// Tool calls in the order received
    pub tool_calls: Vec<ToolCall>,
    /// Cancellation was observed before the stream finished
    pub cancelled: bool,
}

/// Send `messages` and consume the reply, racing cancellation
///
/// Text fragments go to the sink as they arrive. A gateway failure is
/// returned as an error unless it is just the gateway noticing cancellation.
pub(crate) async fn stream_round(
    ctx: &LoopContext,
    messages: &[ConversationMessage],
    options: RequestOptions,
    cancel: &CancellationToken,
) -> LoopResult<RoundOutput> {
    let mut output = RoundOutput::default();

    let mut stream = match ctx
        .gateway
        .send_request(messages.to_vec(), options, cancel.clone())
        .await
    {
        Ok(stream) => stream,
        Err(GatewayError::Cancelled) if cancel.is_cancelled() => {
            output.cancelled = true;
            return Ok(output);
        }
        Err(e) => return Err(e.into()),
    };

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                output.cancelled = true;
                break;
            }
            next = stream.next() => next,
        };

        match next {
            None => break,
            Some(Ok(Fragment::Text { text })) => {
                ctx.sink.emit_text(&text);
                output.text.push_str(&text);
            }
            Some(Ok(Fragment::ToolCall { tool_call })) => output.tool_calls.push(tool_call),
            Some(Err(GatewayError::Cancelled)) if cancel.is_cancelled() => {
                output.cancelled = true;
                break;
            }
            Some(Err(e)) => return Err(e.into()),
        }
    }

    Ok(output)
}

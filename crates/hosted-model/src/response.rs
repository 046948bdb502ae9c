use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use ensemble_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
    ToolCallRequest,
};
use pin_project_lite::pin_project;
use serde_json::Value;

use crate::Error;
use crate::io::Sse;
use crate::proto::{ChatCompletionChunk, ToolCallDelta};

/// A tool call being assembled from streamed fragments.
struct PartialToolCall {
    index: Option<u32>,
    id: String,
    name: String,
    arguments: String,
}

struct PartialState {
    sse: Sse,
    id: Option<String>,
    tool_calls: Vec<PartialToolCall>,
    // Indexes of tool calls that are assembled but not yet delivered to the
    // caller. They are drained only after the finish reason arrived, when
    // all argument fragments are in.
    pending_tool_call_idx: VecDeque<usize>,
    // This field will be cleared after the response returns the complete
    // event.
    pending_finish_reason: Option<ModelFinishReason>,
}

impl PartialState {
    fn merge_tool_call(&mut self, delta: ToolCallDelta) {
        let Some(partial) = self
            .tool_calls
            .iter_mut()
            .find(|call| call.index == delta.index)
        else {
            self.pending_tool_call_idx.push_back(self.tool_calls.len());
            let (name, arguments) = delta
                .function
                .map(|f| (f.name, f.arguments))
                .unwrap_or_default();
            self.tool_calls.push(PartialToolCall {
                index: delta.index,
                id: delta.id.unwrap_or_default(),
                name: name.unwrap_or_default(),
                arguments: arguments.unwrap_or_default(),
            });
            return;
        };
        // Patch the partial tool call with the new fragments.
        if let Some(id) = delta.id {
            partial.id.push_str(&id);
        }
        if let Some(function) = delta.function {
            if let Some(name) = function.name {
                partial.name.push_str(&name);
            }
            if let Some(arguments) = function.arguments {
                partial.arguments.push_str(&arguments);
            }
        }
    }
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, PartialState), Error>;

pin_project! {
    pub struct HostedResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
    }
}

impl HostedResponse {
    #[inline]
    pub fn from_sse(sse: Sse) -> Self {
        let partial_state = PartialState {
            sse,
            id: None,
            tool_calls: Default::default(),
            pending_tool_call_idx: Default::default(),
            pending_finish_reason: Default::default(),
        };
        let next_event_fut = async move { next_event(partial_state).await };
        Self {
            next_event_fut: Some(Box::pin(next_event_fut)),
        }
    }
}

impl ModelResponse for HostedResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            // The stream has been exhausted.
            return Poll::Ready(Ok(None));
        };
        let (event, partial_state) =
            match ready!(next_event_fut.as_mut().poll(cx)) {
                Ok((Some(event), partial_state)) => (event, partial_state),
                Ok((None, _)) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Err(err));
                }
            };

        // The stream may still have more data to pull, create a new future
        // for the next event.
        let next_event_fut = async move { next_event(partial_state).await };
        *this.next_event_fut = Some(Box::pin(next_event_fut));

        Poll::Ready(Ok(Some(event)))
    }
}

async fn next_event(
    mut partial_state: PartialState,
) -> Result<(Option<ModelResponseEvent>, PartialState), Error> {
    let mut message_delta = None;

    loop {
        let sse_event = match partial_state.sse.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(err) => {
                return Err(Error::new(format!("{err:?}"), ErrorKind::Other));
            }
        };
        trace!("got sse event: {sse_event}");
        if sse_event == "[DONE]" {
            break;
        }

        let mut chunk = serde_json::from_str::<ChatCompletionChunk>(&sse_event)
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;
        if partial_state.id.get_or_insert_with(|| chunk.id.clone()) != &chunk.id
        {
            return Err(Error::new("chunk id mismatch", ErrorKind::Other));
        };

        let Some(choice) = chunk.choices.pop() else {
            break;
        };

        if let Some(finish_reason) = choice.finish_reason {
            let finish_reason = if finish_reason == "tool_calls" {
                ModelFinishReason::ToolCalls
            } else {
                ModelFinishReason::Stop
            };
            partial_state.pending_finish_reason = Some(finish_reason);
            break;
        }

        if let Some(content) = choice.delta.content {
            message_delta = Some(content);
        }
        if let Some(tool_calls) = choice.delta.tool_calls {
            for tool_call in tool_calls {
                partial_state.merge_tool_call(tool_call);
            }
        }

        if message_delta.is_some() {
            break;
        }
    }

    // The order of events are important. Always emit message delta first,
    // then emit pending tool calls, and finally emit the pending finish
    // reason if any.

    if let Some(message_delta) = message_delta {
        return Ok((
            Some(ModelResponseEvent::MessageDelta(message_delta)),
            partial_state,
        ));
    }

    if let Some(idx) = partial_state.pending_tool_call_idx.pop_front() {
        let tool_call = &partial_state.tool_calls[idx];
        let arguments = serde_json::from_str::<Value>(&tool_call.arguments)
            .unwrap_or_default();
        return Ok((
            Some(ModelResponseEvent::ToolCall(ToolCallRequest {
                id: tool_call.id.clone(),
                name: tool_call.name.clone(),
                arguments,
            })),
            partial_state,
        ));
    }

    if let Some(finish_reason) = partial_state.pending_finish_reason.take() {
        return Ok((
            Some(ModelResponseEvent::Completed(finish_reason)),
            partial_state,
        ));
    }

    Ok((None, partial_state))
}

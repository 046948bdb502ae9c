use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use ensemble_model::{
    ModelFinishReason, ModelProvider, ModelProviderError, ModelRequest,
    ModelResponse, ModelResponseEvent, ToolCallRequest,
};
use tracing::Instrument;

/// A per-delta callback, invoked as text chunks arrive from the backend.
type OnDelta<'a> = &'a dyn Fn(&str);
type SendRequestResult = Result<ModelOutcome, Box<dyn ModelProviderError>>;
type BoxedSendRequestFuture<'a> =
    Pin<Box<dyn Future<Output = SendRequestResult> + 'a>>;
#[rustfmt::skip]
type HandlerFn = Arc<
    dyn for<'a> Fn(ModelRequest, OnDelta<'a>)
        -> BoxedSendRequestFuture<'a> + Send + Sync
>;

/// A wrapper around a model provider that drives one streamed request to
/// completion and provides a type-erased interface for the other modules.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    /// Creates a model client backed by the given provider.
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req, on_delta| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("got a request: {:?}", req);
                    let resp_or_err = fut.await;
                    drive_response::<P>(resp_or_err, on_delta).await
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request, streaming text deltas through `on_delta`, and
    /// returns the collected outcome.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. The response stops streaming further
    /// events when this operation is cancelled.
    #[inline]
    pub async fn send_request(
        &self,
        req: ModelRequest,
        on_delta: OnDelta<'_>,
    ) -> Result<ModelOutcome, Box<dyn ModelProviderError>> {
        (self.handler_fn)(req, on_delta).await
    }
}

/// A completely received response from the model client.
#[derive(Clone, Debug)]
pub struct ModelOutcome {
    /// The full text produced in this turn.
    pub text: String,
    /// Tool calls requested by the model.
    pub tool_calls: Vec<ToolCallRequest>,
    /// The reason the model finished generating.
    pub finish_reason: Option<ModelFinishReason>,
}

async fn drive_response<P: ModelProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
    on_delta: OnDelta<'_>,
) -> SendRequestResult {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("got an error: {err:?}");
            return Err(Box::new(err));
        }
    };

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    let mut finish_reason = None;

    trace!("start receiving events");

    let mut pinned_resp = pin!(resp);
    loop {
        let event_or_err =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx)).await;
        let event = match event_or_err {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(err) => {
                error!("got an error: {err:?}");
                return Err(Box::new(err));
            }
        };
        trace!("got an event: {event:?}");

        match event {
            ModelResponseEvent::MessageDelta(msg) => {
                text.push_str(&msg);
                on_delta(&msg);
            }
            ModelResponseEvent::ToolCall(req) => {
                tool_calls.push(req);
            }
            ModelResponseEvent::Completed(reason) => {
                finish_reason = Some(reason);
            }
        }
    }

    trace!("finished a request");

    Ok(ModelOutcome {
        text,
        tool_calls,
        finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use ensemble_model::ModelMessage;
    use ensemble_test_model::{PresetEvent, PresetResponse, ScriptedProvider};

    use super::*;

    #[tokio::test]
    async fn test_send_request() {
        let provider = ScriptedProvider::default();
        provider.push_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("How ".to_owned()),
            PresetEvent::MessageDelta("are ".to_owned()),
            PresetEvent::MessageDelta("you?".to_owned()),
        ]));

        let model_client = ModelClient::new(provider);

        let delta_count = Cell::new(0usize);
        let outcome = model_client
            .send_request(
                ModelRequest {
                    messages: vec![ModelMessage::User("Hi".to_owned())],
                    tools: vec![],
                },
                &|_| delta_count.set(delta_count.get() + 1),
            )
            .await
            .unwrap();
        assert_eq!(outcome.text, "How are you?");
        assert_eq!(outcome.finish_reason, Some(ModelFinishReason::Stop));
        assert!(outcome.tool_calls.is_empty());
        assert_eq!(delta_count.get(), 3);
    }

    #[tokio::test]
    async fn test_error_handling() {
        let provider = ScriptedProvider::default();
        let model_client = ModelClient::new(provider);
        let outcome_or_err = model_client
            .send_request(
                ModelRequest {
                    messages: vec![ModelMessage::User("Hi".to_owned())],
                    tools: vec![],
                },
                &|_| {},
            )
            .await;
        assert!(matches!(outcome_or_err, Err(_)));
    }
}

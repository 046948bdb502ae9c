//! A local fake model for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use ensemble_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    #[allow(dead_code)]
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[derive(Clone)]
enum ScriptEntry {
    Respond(PresetResponse),
    Fail(ErrorKind),
}

#[derive(Debug)]
pub struct ScriptedResponse {
    events: VecDeque<PresetEvent>,
    had_tool_call: bool,
    completed: bool,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for ScriptedResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };

        if let Some(sleep) = &mut this.sleep {
            let sleep = sleep.as_mut();
            ready!(sleep.poll(cx));
            this.sleep = None;

            if let Some(event) = this.events.pop_front() {
                let event = match event {
                    PresetEvent::MessageDelta(msg) => {
                        ModelResponseEvent::MessageDelta(msg)
                    }
                    PresetEvent::ToolCall(req) => {
                        this.had_tool_call = true;
                        ModelResponseEvent::ToolCall(req)
                    }
                };
                return Poll::Ready(Ok(Some(event)));
            }
            if !this.completed {
                this.completed = true;
                return Poll::Ready(Ok(Some(ModelResponseEvent::Completed(
                    if this.had_tool_call {
                        ModelFinishReason::ToolCalls
                    } else {
                        ModelFinishReason::Stop
                    },
                ))));
            }
            // In case this method is called after completion.
            return Poll::Ready(Ok(None));
        }
        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_event(cx)
    }
}

/// A local fake model for testing purpose.
///
/// Before sending requests, queue up the script: one entry per expected
/// request, either a preset response or an injected failure. Entries are
/// consumed in FIFO order; a request beyond the end of the script fails.
/// Clones share the same script queue and request log, so a provider can
/// be handed to the code under test while the test keeps a handle for
/// assertions.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    script: Arc<Mutex<VecDeque<ScriptEntry>>>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    /// Queues a preset response for the next unanswered request.
    #[inline]
    pub fn push_response(&self, preset: PresetResponse) {
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptEntry::Respond(preset));
    }

    /// Queues an injected failure for the next unanswered request.
    #[inline]
    pub fn push_failure(&self, kind: ErrorKind) {
        self.script.lock().unwrap().push_back(ScriptEntry::Fail(kind));
    }

    /// Sets a delay between streamed events.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns the requests received so far.
    #[inline]
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ModelProvider for ScriptedProvider {
    type Error = crate::Error;
    type Response = ScriptedResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        self.requests.lock().unwrap().push(req.clone());

        let entry = self.script.lock().unwrap().pop_front();
        let result = match entry {
            None => Err(Error {
                message: "script exhausted",
                kind: ErrorKind::Other,
            }),
            Some(ScriptEntry::Fail(kind)) => Err(Error {
                message: "scripted failure",
                kind,
            }),
            Some(ScriptEntry::Respond(preset)) => Ok(ScriptedResponse {
                events: preset.events.into(),
                had_tool_call: false,
                completed: false,
                delay: self.delay.unwrap_or(Duration::from_millis(1)),
                sleep: None,
            }),
        };
        ready(result)
    }
}

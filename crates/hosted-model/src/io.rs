//! Transport plumbing for one in-flight completion: a byte source over
//! the HTTP response body, and an SSE reader that yields the `data`
//! payload of each event.

use bytes::Bytes;
use reqwest::Response;

/// Error raised when the body stream fails mid-response.
#[derive(Debug, PartialEq, Eq)]
pub struct StreamError;

/// Source of raw body bytes. Tests feed scripted chunks through the
/// same interface the HTTP body uses.
pub enum ByteStream {
    Http(Response),
    #[cfg(test)]
    Scripted(std::collections::VecDeque<Bytes>),
}

impl ByteStream {
    #[inline]
    pub fn http(response: Response) -> Self {
        ByteStream::Http(response)
    }

    #[cfg(test)]
    pub fn scripted<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
    {
        ByteStream::Scripted(chunks.into_iter().collect())
    }

    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, StreamError> {
        match self {
            ByteStream::Http(response) => {
                response.chunk().await.map_err(|_| StreamError)
            }
            #[cfg(test)]
            ByteStream::Scripted(chunks) => Ok(chunks.pop_front()),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SseError {
    Stream(StreamError),
    InvalidPayload,
}

/// An incremental server-sent-event reader.
///
/// Only `data` fields terminated by a blank line are accepted; the
/// chat-completions stream emits nothing else, and lines end with a
/// plain LF there.
pub struct Sse {
    buf: String,
    stream: ByteStream,
}

impl Sse {
    #[inline]
    pub fn new(stream: ByteStream) -> Self {
        Self {
            buf: String::new(),
            stream,
        }
    }

    /// Returns the payload of the next complete event, or `None` once
    /// the stream is exhausted.
    pub async fn next_event(&mut self) -> Result<Option<String>, SseError> {
        loop {
            if let Some(event) = self.take_buffered_event()? {
                return Ok(Some(event));
            }
            match self.stream.next_chunk().await.map_err(SseError::Stream)? {
                Some(bytes) => {
                    let Ok(text) = str::from_utf8(&bytes) else {
                        return Err(SseError::InvalidPayload);
                    };
                    self.buf.push_str(text);
                }
                // A partial event left in the buffer is dropped; the
                // server always terminates events before closing.
                None => return Ok(None),
            }
        }
    }

    fn take_buffered_event(&mut self) -> Result<Option<String>, SseError> {
        let Some(end) = self.buf.find("\n\n") else {
            return Ok(None);
        };

        // The payload may itself contain ": ", so match the field name
        // prefix only.
        let Some(data) = self.buf[..end].strip_prefix("data: ") else {
            return Err(SseError::InvalidPayload);
        };
        let data = data.to_owned();
        self.buf.drain(..end + 2);

        Ok(Some(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_normal_events() {
        let mut sse = Sse::new(ByteStream::scripted([
            Bytes::from_static(b"data: hello\n\n"),
            Bytes::from_static(b"data: bye\n\n"),
        ]));
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "bye");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_event_split_across_chunks() {
        let mut sse = Sse::new(ByteStream::scripted([
            Bytes::from_static(b"data:"),
            Bytes::from_static(b" hello\n"),
            Bytes::from_static(b"\n"),
        ]));
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_payload_containing_separator() {
        // Pretty-printed JSON payloads contain ": " themselves.
        let mut sse = Sse::new(ByteStream::scripted([Bytes::from_static(
            b"data: {\"query\": \"tokyo weather\"}\n\n",
        )]));
        assert_eq!(
            sse.next_event().await.unwrap().unwrap(),
            r#"{"query": "tokyo weather"}"#
        );
    }

    #[tokio::test]
    async fn test_invalid_data() {
        let mut sse = Sse::new(ByteStream::scripted([Bytes::from_static(
            b"xxxxxx\n\n",
        )]));
        assert_eq!(
            sse.next_event().await.unwrap_err(),
            SseError::InvalidPayload
        );

        // Incomplete events are not yielded.
        let mut sse = Sse::new(ByteStream::scripted([Bytes::from_static(
            b"xxxxxx\n",
        )]));
        assert_eq!(sse.next_event().await.unwrap(), None);

        let mut sse = Sse::new(ByteStream::scripted([
            Bytes::from_static(b"data: hello\n"),
            Bytes::from_static(b"data: bye\n"),
        ]));
        assert_eq!(sse.next_event().await.unwrap(), None);
    }
}

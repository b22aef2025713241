//! Streaming decode pipeline
//!
//! Turns pushed body chunks into a lazily produced sequence of typed values:
//!
//! 1. bytes are decoded as UTF-8, holding back a split multi-byte character
//!    until the rest of it arrives;
//! 2. text is cut into newline-delimited frames, keeping the unterminated
//!    remainder for the next chunk;
//! 3. each frame is trimmed, stripped of the format's data prefix and checked
//!    against the end-of-stream sentinel;
//! 4. remaining frames are decoded into `T`. A frame that fails to decode is
//!    logged and skipped; it never ends the stream.
//!
//! The decoded values travel over an unbounded channel to an
//! [`ElementStream`], which the caller polls like any other `Stream`.

use crate::constants::{DONE_SENTINEL, SSE_DATA_PREFIX};
use crate::source::{ChunkHandler, ChunkSource, Completion, Subscription};
use ailite_core::{Error, HttpRequest};
use bytes::Bytes;
use futures::Stream;
use serde::de::DeserializeOwned;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Failure to decode a single frame
///
/// Never fatal to a stream: the frame is logged and skipped.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The payload is not valid JSON or does not match the target type
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    /// A caller-supplied decoder rejected the payload
    #[error("{0}")]
    Custom(String),
}

/// Buffer management for line-based streaming protocols
///
/// Chunk boundaries carry no meaning: a line or a UTF-8 character split
/// across two chunks is reassembled before it is returned.
#[derive(Debug, Default)]
pub struct LineBuffer {
    // Bytes not yet decoded, at most one incomplete UTF-8 sequence
    pending: Vec<u8>,
    // Decoded text after the last newline
    text: String,
}

impl LineBuffer {
    /// Create a new line buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Add data to the buffer and return every line it completes
    ///
    /// Lines are returned without their terminator (`\n` or `\r\n`) and
    /// otherwise untouched, blank lines included.
    pub fn push(&mut self, data: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(data);
        self.decode_pending();
        self.take_lines()
    }

    /// End of data: return the unterminated remainder, if any
    ///
    /// An incomplete UTF-8 sequence left at the end can never be completed and
    /// is dropped.
    pub fn finish(&mut self) -> Option<String> {
        if !self.pending.is_empty() {
            warn!(
                bytes = self.pending.len(),
                "dropping incomplete UTF-8 sequence at end of stream"
            );
            self.pending.clear();
        }

        if self.text.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.text))
        }
    }

    fn decode_pending(&mut self) {
        let mut consumed = 0;
        while consumed < self.pending.len() {
            match std::str::from_utf8(&self.pending[consumed..]) {
                Ok(valid) => {
                    self.text.push_str(valid);
                    consumed = self.pending.len();
                }
                Err(error) => {
                    let valid_end = consumed + error.valid_up_to();
                    if let Ok(valid) = std::str::from_utf8(&self.pending[consumed..valid_end]) {
                        self.text.push_str(valid);
                    }
                    match error.error_len() {
                        // Truncated sequence: wait for the next chunk
                        None => {
                            consumed = valid_end;
                            break;
                        }
                        Some(len) => {
                            warn!(bytes = len, "dropping invalid UTF-8 sequence");
                            consumed = valid_end + len;
                        }
                    }
                }
            }
        }
        self.pending.drain(..consumed);
    }

    fn take_lines(&mut self) -> Vec<String> {
        let Some(end) = self.text.rfind('\n') else {
            return Vec::new();
        };
        let rest = self.text.split_off(end + 1);
        let complete = std::mem::replace(&mut self.text, rest);
        complete.lines().map(str::to_string).collect()
    }
}

/// One classified line of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    /// Nothing but whitespace
    Blank,
    /// The end-of-stream sentinel
    Done,
    /// A payload to decode, with the data prefix removed
    Payload(&'a str),
}

/// Framing conventions of a streaming endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFormat {
    data_prefix: Option<String>,
    sentinel: Option<String>,
}

impl StreamFormat {
    /// Server-sent events as used by OpenAI: `data: ` frames ending in `[DONE]`
    pub fn server_sent_events() -> Self {
        Self {
            data_prefix: Some(SSE_DATA_PREFIX.to_string()),
            sentinel: Some(DONE_SENTINEL.to_string()),
        }
    }

    /// Newline-delimited JSON: no prefix, ends when the connection closes
    pub fn ndjson() -> Self {
        Self {
            data_prefix: None,
            sentinel: None,
        }
    }

    /// Use a different data prefix
    pub fn with_data_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.data_prefix = Some(prefix.into());
        self
    }

    /// Use a different end-of-stream sentinel
    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = Some(sentinel.into());
        self
    }

    /// Classify one line
    ///
    /// The prefix is stripped only when present; a frame without it is used
    /// verbatim. Anything starting with the sentinel ends the stream.
    pub fn classify<'a>(&self, line: &'a str) -> Frame<'a> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Frame::Blank;
        }

        let payload = self
            .data_prefix
            .as_deref()
            .and_then(|prefix| trimmed.strip_prefix(prefix))
            .unwrap_or(trimmed);

        match self.sentinel.as_deref() {
            Some(sentinel) if payload.starts_with(sentinel) => Frame::Done,
            _ => Frame::Payload(payload),
        }
    }
}

impl Default for StreamFormat {
    fn default() -> Self {
        Self::server_sent_events()
    }
}

/// Opens streams and decodes their frames into typed values
///
/// # Example
///
/// ```no_run
/// use ailite_core::HttpRequest;
/// use ailite_providers::{ReqwestClient, StreamDecoder};
/// use futures::StreamExt;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Chunk {
///     id: String,
/// }
///
/// # async fn example() -> Result<(), ailite_core::Error> {
/// let client = ReqwestClient::new()?;
/// let request = HttpRequest::post("https://example.com/v1/stream");
///
/// let mut chunks = StreamDecoder::default().decode::<Chunk>(&client, request);
/// while let Some(chunk) = chunks.next().await {
///     println!("{}", chunk?.id);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct StreamDecoder {
    format: StreamFormat,
}

impl StreamDecoder {
    /// Create a decoder for the given framing
    pub fn new(format: StreamFormat) -> Self {
        Self { format }
    }

    /// The framing this decoder expects
    pub fn format(&self) -> &StreamFormat {
        &self.format
    }

    /// Open `request` on `source` and decode each frame as JSON into `T`
    ///
    /// JSON keys are matched against `T`'s serde field names, which for the
    /// provider models follow the wire's snake_case.
    pub fn decode<T>(&self, source: &dyn ChunkSource, request: HttpRequest) -> ElementStream<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.decode_with(source, request, |payload: &[u8]| {
            serde_json::from_slice(payload).map_err(DecodeError::from)
        })
    }

    /// Open `request` on `source` and decode each frame with `decode`
    ///
    /// Every call opens a fresh connection with its own state.
    pub fn decode_with<T, F>(
        &self,
        source: &dyn ChunkSource,
        request: HttpRequest,
        decode: F,
    ) -> ElementStream<T>
    where
        T: Send + 'static,
        F: Fn(&[u8]) -> Result<T, DecodeError> + Send + Sync + 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let sink = Arc::new(DecoderSink {
            decode,
            state: Mutex::new(DecoderState {
                format: self.format.clone(),
                lines: LineBuffer::new(),
                sender: Some(sender),
                subscription: None,
            }),
        });

        let subscription = source.open(request, sink.clone());
        sink.attach(subscription.clone());

        ElementStream {
            receiver,
            subscription,
            sink,
            cancelled: false,
        }
    }
}

struct DecoderState<T> {
    format: StreamFormat,
    lines: LineBuffer,
    // `None` once the stream has terminated for any reason
    sender: Option<mpsc::UnboundedSender<Result<T, Error>>>,
    subscription: Option<Subscription>,
}

struct DecoderSink<T, F> {
    decode: F,
    state: Mutex<DecoderState<T>>,
}

impl<T, F> DecoderSink<T, F>
where
    F: Fn(&[u8]) -> Result<T, DecodeError>,
{
    fn lock(&self) -> MutexGuard<'_, DecoderState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn attach(&self, subscription: Subscription) {
        let mut state = self.lock();
        if state.sender.is_some() {
            state.subscription = Some(subscription);
            return;
        }
        // Terminated before the subscription handle came back
        drop(state);
        subscription.close();
    }

    fn dispatch(&self, state: &mut DecoderState<T>, lines: Vec<String>) {
        for line in lines {
            let Some(sender) = state.sender.as_ref() else {
                return;
            };

            match state.format.classify(&line) {
                Frame::Blank => {}
                Frame::Done => {
                    debug!("end of stream sentinel received");
                    state.sender = None;
                }
                Frame::Payload(payload) => match (self.decode)(payload.as_bytes()) {
                    Ok(element) => {
                        trace!(bytes = payload.len(), "frame decoded");
                        if sender.send(Ok(element)).is_err() {
                            debug!("stream consumer went away");
                            state.sender = None;
                        }
                    }
                    Err(error) => {
                        warn!(%error, frame = %line, "skipping undecodable frame");
                    }
                },
            }
        }
    }
}

impl<T, F> ChunkHandler for DecoderSink<T, F>
where
    T: Send,
    F: Fn(&[u8]) -> Result<T, DecodeError> + Send + Sync,
{
    fn on_chunk(&self, chunk: Bytes) {
        let release = {
            let mut state = self.lock();
            if state.sender.is_none() {
                return;
            }
            let lines = state.lines.push(&chunk);
            self.dispatch(&mut state, lines);
            if state.sender.is_none() {
                state.subscription.take()
            } else {
                None
            }
        };

        // Closing re-enters `on_complete`, so the lock must be released first
        if let Some(subscription) = release {
            subscription.close();
        }
    }

    fn on_complete(&self, completion: Completion) {
        let mut state = self.lock();
        state.subscription = None;
        if state.sender.is_none() {
            return;
        }

        match completion {
            Completion::Finished => {
                let remainder: Vec<String> = state.lines.finish().into_iter().collect();
                self.dispatch(&mut state, remainder);
                debug!("stream ended with the connection");
            }
            Completion::Failed(error) => {
                warn!(%error, "stream failed");
                if let Some(sender) = state.sender.as_ref() {
                    let _ = sender.send(Err(error));
                }
            }
            Completion::Cancelled => debug!("stream cancelled"),
        }

        state.sender = None;
    }
}

/// A lazily produced sequence of decoded stream elements
///
/// Yields `Ok(element)` for every decoded frame in arrival order. A transport
/// failure is yielded once as `Err` and ends the sequence. Dropping the stream
/// or calling [`cancel`](Self::cancel) closes the underlying connection.
pub struct ElementStream<T> {
    receiver: mpsc::UnboundedReceiver<Result<T, Error>>,
    subscription: Subscription,
    sink: Arc<dyn ChunkHandler>,
    cancelled: bool,
}

impl<T> ElementStream<T> {
    /// Stop the stream and release its connection
    ///
    /// Nothing further is yielded, including elements already decoded but
    /// not yet polled. Calling it again has no effect.
    pub fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;
        // Terminate the decoder first so no in-flight delivery can still emit
        self.sink.on_complete(Completion::Cancelled);
        self.subscription.close();
        self.receiver.close();
    }

    /// Whether the underlying connection has been released
    pub fn is_closed(&self) -> bool {
        self.subscription.is_closed()
    }

    /// The subscription backing this stream
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }
}

impl<T> Stream for ElementStream<T> {
    type Item = Result<T, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancelled {
            return Poll::Ready(None);
        }
        match self.receiver.poll_recv(cx) {
            Poll::Ready(None) => {
                self.subscription.close();
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

impl<T> Drop for ElementStream<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

//! Event dispatch for the LLM chat stream
//!
//! Maps named SSE events onto [`StreamCallbacks`]:
//! - `start` -> `on_start`
//! - `chunk` -> `on_chunk` with the `text` field of the JSON payload
//! - `end` -> `on_end`, then the stream is closed and `on_complete` fires
//! - `error_event` / `error` -> `on_error_event`; reading continues
//!
//! Transport failures and a body that ends before `end` are reported through
//! `on_stream_error` and also close the stream. `on_complete` runs exactly
//! once per stream unless the caller aborts it through [`StreamHandle::close`].

use futures_util::{Stream, StreamExt};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::parser::{SseDecoder, SseEvent};

/// Why a stream stopped without an `end` event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFailure {
    /// No token was stored, so the stream was never opened
    NotAuthenticated,
    /// Server refused the stream
    Http { status: u16, message: String },
    /// Connection or read failure
    Transport(String),
    /// Malformed or oversized event data
    Decode(String),
    /// Body ended before an `end` event
    UnexpectedEof,
}

impl fmt::Display for StreamFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamFailure::NotAuthenticated => {
                write!(f, "Authentication error: User not logged in")
            }
            StreamFailure::Http { status, message } => write!(f, "HTTP {}: {}", status, message),
            StreamFailure::Transport(e) => write!(f, "Connection error: {}", e),
            StreamFailure::Decode(e) => write!(f, "Malformed event stream: {}", e),
            StreamFailure::UnexpectedEof => write!(f, "Stream closed before completion"),
        }
    }
}

/// Receiver for chat stream events; every method defaults to a no-op
pub trait StreamCallbacks: Send {
    fn on_start(&mut self, _event: &SseEvent) {}
    fn on_chunk(&mut self, _text: &str, _event: &SseEvent) {}
    fn on_end(&mut self, _event: &SseEvent) {}
    fn on_error_event(&mut self, _event: &SseEvent) {}
    fn on_stream_error(&mut self, _error: &StreamFailure) {}
    fn on_complete(&mut self) {}
}

/// How a stream finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// `end` event received
    Ended,
    /// Stopped through `on_stream_error`
    Failed(StreamFailure),
    /// Aborted by the caller
    Closed,
}

/// Whether the stream stays open after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

/// Route one decoded event to its callback
pub fn dispatch_event<C: StreamCallbacks + ?Sized>(event: &SseEvent, callbacks: &mut C) -> Flow {
    match event.event.as_str() {
        "start" => {
            callbacks.on_start(event);
            Flow::Continue
        }
        "chunk" => {
            match serde_json::from_str::<Value>(&event.data) {
                Ok(value) => match value.get("text").and_then(Value::as_str) {
                    Some(text) => callbacks.on_chunk(text, event),
                    None => debug!("chunk without text field: {}", event.data),
                },
                Err(e) => {
                    // Plain-text chunks are passed through untouched
                    debug!("chunk is not JSON ({}), forwarding raw data", e);
                    callbacks.on_chunk(&event.data, event);
                }
            }
            Flow::Continue
        }
        "end" => {
            callbacks.on_end(event);
            Flow::Close
        }
        "error_event" | "error" => {
            warn!("Server reported an error event: {}", event.data);
            callbacks.on_error_event(event);
            Flow::Continue
        }
        other => {
            debug!("ignoring event {:?}", other);
            Flow::Continue
        }
    }
}

/// Report a failure that ends the stream
pub fn fail<C: StreamCallbacks + ?Sized>(callbacks: &mut C, failure: StreamFailure) -> StreamOutcome {
    error!("Chat stream failed: {}", failure);
    callbacks.on_stream_error(&failure);
    callbacks.on_complete();
    StreamOutcome::Failed(failure)
}

/// Read a byte stream to its terminal event
pub async fn drive<S, E, C>(mut body: S, callbacks: &mut C) -> StreamOutcome
where
    S: Stream<Item = std::result::Result<bytes::Bytes, E>> + Unpin,
    E: fmt::Display,
    C: StreamCallbacks + ?Sized,
{
    let mut decoder = SseDecoder::new();

    while let Some(chunk) = body.next().await {
        let bytes = match chunk {
            Ok(bytes) => bytes,
            Err(e) => return fail(callbacks, StreamFailure::Transport(e.to_string())),
        };

        let events = match decoder.add_bytes(&bytes) {
            Ok(events) => events,
            Err(e) => return fail(callbacks, StreamFailure::Decode(e.to_string())),
        };

        for event in &events {
            if dispatch_event(event, callbacks) == Flow::Close {
                callbacks.on_complete();
                return StreamOutcome::Ended;
            }
        }
    }

    if decoder.finish() {
        debug!("discarding unterminated trailing event");
    }
    fail(callbacks, StreamFailure::UnexpectedEof)
}

/// Running stream, the counterpart of an open `EventSource`
#[derive(Debug)]
pub struct StreamHandle {
    task: JoinHandle<StreamOutcome>,
}

impl StreamHandle {
    pub(crate) fn new(task: JoinHandle<StreamOutcome>) -> Self {
        Self { task }
    }

    /// Stop reading; no further callbacks run
    pub fn close(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the stream to reach a terminal state
    ///
    /// Borrows so a caller can still [`close`](Self::close) the stream after
    /// abandoning the wait. Call at most once to completion.
    pub async fn join(&mut self) -> StreamOutcome {
        match (&mut self.task).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => StreamOutcome::Closed,
            Err(e) => StreamOutcome::Failed(StreamFailure::Transport(e.to_string())),
        }
    }
}

/// Everything a [`CollectingCallbacks`] saw, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Start(String),
    Chunk(String),
    End(String),
    ErrorEvent(String),
    StreamError(StreamFailure),
    Complete,
}

/// Callbacks that record the event trail; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct CollectingCallbacks {
    log: Arc<Mutex<Vec<Recorded>>>,
}

impl CollectingCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Recorded> {
        self.log.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Concatenated chunk text
    pub fn text(&self) -> String {
        self.events()
            .into_iter()
            .filter_map(|r| match r {
                Recorded::Chunk(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn completions(&self) -> usize {
        self.events()
            .iter()
            .filter(|r| matches!(r, Recorded::Complete))
            .count()
    }

    fn push(&self, record: Recorded) {
        if let Ok(mut log) = self.log.lock() {
            log.push(record);
        }
    }
}

impl StreamCallbacks for CollectingCallbacks {
    fn on_start(&mut self, event: &SseEvent) {
        self.push(Recorded::Start(event.data.clone()));
    }

    fn on_chunk(&mut self, text: &str, _event: &SseEvent) {
        self.push(Recorded::Chunk(text.to_string()));
    }

    fn on_end(&mut self, event: &SseEvent) {
        self.push(Recorded::End(event.data.clone()));
    }

    fn on_error_event(&mut self, event: &SseEvent) {
        self.push(Recorded::ErrorEvent(event.data.clone()));
    }

    fn on_stream_error(&mut self, error: &StreamFailure) {
        self.push(Recorded::StreamError(error.clone()));
    }

    fn on_complete(&mut self) {
        self.push(Recorded::Complete);
    }
}

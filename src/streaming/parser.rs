//! Incremental Server-Sent Events decoder
//!
//! Turns an arbitrary split of `text/event-stream` bytes into complete events:
//! - Line endings: LF, CRLF or lone CR (a CR at a chunk edge is handled)
//! - Fields: `event`, `data` (multi-line joined with `\n`), `id`, `retry`
//! - Comments (`:` prefix) ignored, one space after the colon stripped
//! - Buffer: 1MB maximum for the unterminated tail plus pending data

use crate::errors::{ClientError, Result};

/// Maximum buffered bytes (1MB)
pub const MAX_BUFFER_SIZE: usize = 1_048_576;

/// Event name used when the server sends no `event:` field
pub const DEFAULT_EVENT: &str = "message";

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// One dispatched event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
    pub id: Option<String>,
    pub retry: Option<u64>,
}

impl SseEvent {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
            id: None,
            retry: None,
        }
    }
}

#[derive(Debug, Default)]
struct PendingEvent {
    event: Option<String>,
    data: Vec<String>,
    data_len: usize,
    retry: Option<u64>,
}

/// Incremental SSE decoder
#[derive(Debug)]
pub struct SseDecoder {
    /// Bytes of the current, not yet terminated line
    buffer: Vec<u8>,

    /// Fields seen since the last blank line
    pending: PendingEvent,

    last_event_id: Option<String>,

    /// Previous chunk ended in CR; a leading LF belongs to it
    skip_lf: bool,

    bom_checked: bool,

    max_buffer_size: usize,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::with_capacity(MAX_BUFFER_SIZE)
    }

    pub fn with_capacity(max_buffer_size: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            pending: PendingEvent::default(),
            last_event_id: None,
            skip_lf: false,
            bom_checked: false,
            max_buffer_size,
        }
    }

    /// Feed bytes, returning every event completed by them (in order)
    pub fn add_bytes(&mut self, bytes: &[u8]) -> Result<Vec<SseEvent>> {
        self.buffer.extend_from_slice(bytes);

        if !self.bom_checked {
            if self.buffer.len() < UTF8_BOM.len() && UTF8_BOM.starts_with(&self.buffer) {
                return Ok(Vec::new());
            }
            if self.buffer.starts_with(UTF8_BOM) {
                self.buffer.drain(..UTF8_BOM.len());
            }
            self.bom_checked = true;
        }

        let mut events = Vec::new();
        let mut start = 0;

        for i in 0..self.buffer.len() {
            let byte = self.buffer[i];

            if self.skip_lf {
                self.skip_lf = false;
                if byte == b'\n' {
                    start = i + 1;
                    continue;
                }
            }

            if byte == b'\n' || byte == b'\r' {
                let line = String::from_utf8_lossy(&self.buffer[start..i]).into_owned();
                self.skip_lf = byte == b'\r';
                start = i + 1;
                if let Some(event) = self.process_line(&line) {
                    events.push(event);
                }
            }
        }

        self.buffer.drain(..start);

        // Only the unterminated tail and the pending event count against the cap
        let buffered = self.buffer.len() + self.pending.data_len;
        if buffered > self.max_buffer_size {
            self.clear();
            return Err(ClientError::Stream(format!(
                "Buffer overflow: {} bytes exceeds maximum {}",
                buffered, self.max_buffer_size
            )));
        }
        Ok(events)
    }

    /// End of stream. An event without its closing blank line is dropped;
    /// returns whether anything was discarded.
    pub fn finish(&mut self) -> bool {
        let discarded = !self.buffer.is_empty()
            || !self.pending.data.is_empty()
            || self.pending.event.is_some();
        self.clear();
        discarded
    }

    /// Last `id:` seen on the stream
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() && self.pending.data.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.pending = PendingEvent::default();
        self.skip_lf = false;
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.find(':') {
            Some(idx) => {
                let value = &line[idx + 1..];
                (&line[..idx], value.strip_prefix(' ').unwrap_or(value))
            }
            None => (line, ""),
        };

        match field {
            "event" => self.pending.event = Some(value.to_string()),
            "data" => {
                self.pending.data_len += value.len() + 1;
                self.pending.data.push(value.to_string());
            }
            "id" => {
                if !value.contains('\0') {
                    self.last_event_id = Some(value.to_string());
                }
            }
            "retry" => {
                if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
                    self.pending.retry = value.parse().ok();
                }
            }
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let pending = std::mem::take(&mut self.pending);
        if pending.data.is_empty() {
            return None;
        }
        let event = pending
            .event
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| DEFAULT_EVENT.to_string());
        Some(SseEvent {
            event,
            data: pending.data.join("\n"),
            id: self.last_event_id.clone(),
            retry: pending.retry,
        })
    }
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

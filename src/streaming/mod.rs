//! Streaming module
//!
//! SSE decoding and the event-dispatch rules for LLM chat streams.

pub mod client;
pub mod parser;

// Re-export commonly used types
pub use client::{
    dispatch_event, drive, CollectingCallbacks, Flow, Recorded, StreamCallbacks, StreamFailure,
    StreamHandle, StreamOutcome,
};
pub use parser::{SseDecoder, SseEvent, MAX_BUFFER_SIZE};

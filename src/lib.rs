//! blogctl - terminal client for a blog-manager backend
//!
//! Talks to the backend's REST and event-stream endpoints on behalf of one
//! logged-in user.
//!
//! # Architecture
//!
//! - **api**: typed services for auth, posts, images, settings and the LLM helper
//! - **session**: file-backed token storage and auth state
//! - **streaming**: SSE decoding and chat callback dispatch
//! - **guard**: route access rules applied before every command
//! - **content / frontmatter / search**: local markdown handling

pub mod errors;
pub mod types;
pub mod config;
pub mod telemetry;

pub mod api;
pub mod session;
pub mod streaming;

pub mod content;
pub mod frontmatter;
pub mod guard;
pub mod search;

pub mod cli;
pub mod doctor;

// Re-export commonly used types
pub use api::BlogManagerClient;
pub use errors::{ClientError, Result};
pub use session::{AuthStore, SessionStore};

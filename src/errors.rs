//! Error types for blogctl
//!
//! Every API call funnels its failures into [`ClientError`] so the CLI can
//! report backend messages verbatim.

use thiserror::Error;

/// Main error type for the blog-manager client
#[derive(Error, Debug)]
pub enum ClientError {
    /// Backend answered with a non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Backend answered 2xx but the response envelope reported a failure
    #[error("API error: {0}")]
    Api(String),

    /// Backend rejected the stored token; the local session has been cleared
    #[error("Session expired or invalid, please log in again")]
    Unauthorized,

    /// Operation needs a token and none is stored
    #[error("Not logged in")]
    NotAuthenticated,

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed local or remote data (dates, front matter, URLs)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Event-stream failures
    #[error("Streaming error: {0}")]
    Stream(String),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String),
}

impl ClientError {
    /// Status code when the error came from an HTTP response
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Unauthorized => Some(401),
            ClientError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Convert anyhow errors to ClientError
impl From<anyhow::Error> for ClientError {
    fn from(err: anyhow::Error) -> Self {
        ClientError::Generic(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::Parse(format!("invalid URL: {}", err))
    }
}

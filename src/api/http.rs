//! Shared HTTP plumbing for every backend service
//!
//! Builds URLs against the configured origin, attaches the stored bearer
//! token to outgoing requests and applies the session-expiry rule: any 401
//! wipes the local session before the error reaches the caller.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::errors::{ClientError, Result};
use crate::session::SessionStore;
use crate::types::MessageResponse;

/// Default backend origin
pub const DEFAULT_BASE_URL: &str = "http://localhost:5200";

/// Request timeout for ordinary calls (10 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connect timeout for long-lived event streams
const STREAM_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Backend client shared by all services
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    stream_client: Client,
    base_url: Url,
    session: SessionStore,
}

impl ApiClient {
    /// Create a client with the default 10s timeout
    pub fn new(base_url: &str, session: SessionStore) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT, session)
    }

    /// Create a client with a custom per-request timeout
    pub fn with_timeout(base_url: &str, timeout: Duration, session: SessionStore) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "backend URL cannot be used as a base: {}",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Request)?;

        // Streams stay open for as long as the model talks, so only the
        // connection phase is bounded.
        let stream_client = Client::builder()
            .connect_timeout(STREAM_CONNECT_TIMEOUT)
            .build()
            .map_err(ClientError::Request)?;

        Ok(Self {
            client,
            stream_client,
            base_url,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Current token, or [`ClientError::NotAuthenticated`]
    pub fn require_token(&self) -> Result<String> {
        self.session.get_token().ok_or(ClientError::NotAuthenticated)
    }

    /// Join percent-encoded path segments onto the base URL
    pub fn url(&self, segments: &[&str]) -> Result<Url> {
        self.build_url(segments, false)
    }

    /// Same as [`ApiClient::url`] but keeps a trailing `/`
    pub fn url_with_slash(&self, segments: &[&str]) -> Result<Url> {
        self.build_url(segments, true)
    }

    fn build_url(&self, segments: &[&str], trailing_slash: bool) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ClientError::Config(format!("backend URL cannot be a base: {}", self.base_url))
            })?;
            path.pop_if_empty();
            path.extend(segments);
            if trailing_slash {
                path.push("");
            }
        }
        Ok(url)
    }

    /// Request with the bearer token attached when one is stored
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        Self::authorize(self.client.request(method, url), self.session.get_token())
    }

    pub fn get(&self, url: Url) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    pub fn post(&self, url: Url) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// GET on the stream client (no overall timeout)
    pub fn stream_get(&self, url: Url) -> RequestBuilder {
        self.stream_client.get(url)
    }

    fn authorize(builder: RequestBuilder, token: Option<String>) -> RequestBuilder {
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request, applying the 401 rule. Other statuses are passed through.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        debug!(url = %response.url(), status = %response.status(), "response");
        self.intercept(response)
    }

    /// Send a request and turn any non-2xx status into [`ClientError::Http`]
    pub async fn send_checked(&self, builder: RequestBuilder) -> Result<Response> {
        let response = self.send(builder).await?;
        ensure_success(response).await
    }

    pub(crate) fn intercept(&self, response: Response) -> Result<Response> {
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Backend rejected the session token; clearing local session");
            self.session.clear_auth_data()?;
            return Err(ClientError::Unauthorized);
        }
        Ok(response)
    }
}

/// Pass 2xx responses through, otherwise read the body into an error
pub async fn ensure_success(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let message = read_error_message(response).await;
    Err(ClientError::Http {
        status: status.as_u16(),
        message,
    })
}

/// Best-effort human message from an error response body
pub async fn read_error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    message_from_body(status, &body)
}

/// `message` field of a JSON body, else the trimmed text, else a status line
pub fn message_from_body(status: StatusCode, body: &str) -> String {
    if let Some(message) = MessageResponse::from_body(body) {
        return message;
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    format!("request failed with status {}", status.as_u16())
}

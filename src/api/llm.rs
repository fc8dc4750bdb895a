//! LLM helper endpoints under `/llm`
//!
//! Plain calls return the response body as text. The streaming calls open an
//! event stream on a background task and report through [`StreamCallbacks`].
//! The stream token travels in the query string, as the backend expects for
//! event-source clients.

use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use tracing::{error, info};

use crate::api::http::{read_error_message, ApiClient};
use crate::errors::{ClientError, Result};
use crate::streaming::client::{drive, fail, StreamCallbacks, StreamFailure, StreamHandle};
use crate::types::LlmType;

/// Endpoint used by [`LlmService::stream_chat`]
pub const STREAM_CHAT_PATH: &str = "stream-chat";

/// Endpoint used by [`LlmService::stream_suggestion`]
pub const STREAM_SUGGESTION_PATH: &str = "stream-suggestion";

#[derive(Debug, Clone)]
pub struct LlmService {
    api: ApiClient,
}

impl LlmService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `GET /llm/getsuggestion?param=`
    pub async fn get_suggestion(&self, param: &str) -> Result<String> {
        self.text_call("getsuggestion", &[("param", param)], "get suggestion")
            .await
    }

    /// `GET /llm/chat?param=` (whole reply at once)
    pub async fn chat(&self, param: &str) -> Result<String> {
        self.text_call("chat", &[("param", param)], "chat").await
    }

    /// `POST /llm/set?llmType=`
    pub async fn set_llm_type(&self, llm_type: LlmType) -> Result<()> {
        self.api.require_token()?;
        let url = self.api.url(&["llm", "set"])?;
        let request = self.api.post(url).query(&[("llmType", llm_type.as_str())]);
        let response = self.api.send(request).await?;
        check("set LLM type", response).await?;
        info!(llm = %llm_type, "LLM type switched");
        Ok(())
    }

    /// `GET /llm/get`; the backend answers `"null"` when nothing is selected
    pub async fn current_llm_type(&self) -> Result<String> {
        self.text_call("get", &[], "get current LLM type").await
    }

    /// Stream a chat reply from `/llm/stream-chat`
    ///
    /// Returns `None` when no token is stored; `on_stream_error` and
    /// `on_complete` have already been called in that case.
    pub fn stream_chat<C>(&self, param: &str, callbacks: C) -> Option<StreamHandle>
    where
        C: StreamCallbacks + 'static,
    {
        self.open_stream(STREAM_CHAT_PATH, param, callbacks)
    }

    /// Stream a writing suggestion from `/llm/stream-suggestion`
    pub fn stream_suggestion<C>(&self, param: &str, callbacks: C) -> Option<StreamHandle>
    where
        C: StreamCallbacks + 'static,
    {
        self.open_stream(STREAM_SUGGESTION_PATH, param, callbacks)
    }

    fn open_stream<C>(&self, endpoint: &str, param: &str, mut callbacks: C) -> Option<StreamHandle>
    where
        C: StreamCallbacks + 'static,
    {
        let token = match self.api.session().get_token() {
            Some(token) => token,
            None => {
                error!("Not logged in, cannot open chat stream");
                fail(&mut callbacks, StreamFailure::NotAuthenticated);
                return None;
            }
        };

        let url = match self.api.url(&["llm", endpoint]) {
            Ok(url) => url,
            Err(e) => {
                fail(&mut callbacks, StreamFailure::Transport(e.to_string()));
                return None;
            }
        };

        let request = self
            .api
            .stream_get(url)
            .header(ACCEPT, "text/event-stream")
            .query(&[("param", param), ("token", token.as_str())]);
        let api = self.api.clone();

        let task = tokio::spawn(async move {
            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => return fail(&mut callbacks, StreamFailure::Transport(e.to_string())),
            };

            let response = match api.intercept(response) {
                Ok(response) => response,
                Err(e) => {
                    return fail(
                        &mut callbacks,
                        StreamFailure::Http {
                            status: StatusCode::UNAUTHORIZED.as_u16(),
                            message: e.to_string(),
                        },
                    )
                }
            };

            let status = response.status();
            if !status.is_success() {
                let message = read_error_message(response).await;
                return fail(
                    &mut callbacks,
                    StreamFailure::Http {
                        status: status.as_u16(),
                        message,
                    },
                );
            }

            drive(response.bytes_stream(), &mut callbacks).await
        });

        Some(StreamHandle::new(task))
    }

    async fn text_call(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
        operation: &str,
    ) -> Result<String> {
        self.api.require_token()?;
        let url = self.api.url(&["llm", endpoint])?;
        let response = self.api.send(self.api.get(url).query(query)).await?;
        let response = check(operation, response).await?;
        Ok(response.text().await?)
    }
}

/// Non-2xx -> `"<operation> failed: <reason> - <body>"`
async fn check(operation: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let reason = status.canonical_reason().unwrap_or("unknown status");
    let body = response.text().await.unwrap_or_default();
    error!(
        "{} failed: {} {} - {}",
        operation,
        status.as_u16(),
        reason,
        body
    );
    Err(ClientError::Http {
        status: status.as_u16(),
        message: format!("{} failed: {} - {}", operation, reason, body.trim()),
    })
}

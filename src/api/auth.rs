//! Account endpoints under `/api/auth`

use tracing::{error, info};

use crate::api::http::{message_from_body, ApiClient};
use crate::errors::{ClientError, Result};
use crate::types::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

const LOGIN_FAILED: &str = "login failed";
const REGISTER_FAILED: &str = "registration failed";

/// Login / registration calls
#[derive(Debug, Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `POST /api/auth/login`
    pub async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse> {
        let url = self.api.url(&["api", "auth", "login"])?;
        let response = self
            .api
            .send(self.api.post(url).json(credentials))
            .await
            .map_err(|e| describe(e, LOGIN_FAILED))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = message_or_default(status, &body, LOGIN_FAILED);
            error!(username = %credentials.username, "Login rejected: {}", message);
            return Err(ClientError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let login: LoginResponse = response.json().await?;
        info!(username = %login.username, "Logged in");
        Ok(login)
    }

    /// `POST /api/auth/register`
    pub async fn register(&self, user: &RegisterRequest) -> Result<RegisterResponse> {
        let url = self.api.url(&["api", "auth", "register"])?;
        let response = self
            .api
            .send(self.api.post(url).json(user))
            .await
            .map_err(|e| describe(e, REGISTER_FAILED))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = message_or_default(status, &body, REGISTER_FAILED);
            error!(username = %user.username, "Registration rejected: {}", message);
            return Err(ClientError::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

/// Server `message`, else the body text, else the operation's default
fn message_or_default(status: reqwest::StatusCode, body: &str, default: &str) -> String {
    if body.trim().is_empty() {
        return default.to_string();
    }
    message_from_body(status, body)
}

/// Transport errors keep their text; anything without one gets the default
fn describe(err: ClientError, default: &str) -> ClientError {
    match err {
        ClientError::Request(e) => {
            let text = e.to_string();
            if text.is_empty() {
                ClientError::Generic(default.to_string())
            } else {
                ClientError::Generic(format!("{}: {}", default, text))
            }
        }
        other => other,
    }
}

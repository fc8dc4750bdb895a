//! Backend settings under `/config`

use tracing::{error, info};

use crate::api::http::ApiClient;
use crate::errors::{ClientError, Result};
use crate::types::SystemConfig;

#[derive(Debug, Clone)]
pub struct ConfigService {
    api: ApiClient,
}

impl ConfigService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `GET /config/get`
    pub async fn get_config(&self) -> Result<SystemConfig> {
        let url = self.api.url(&["config", "get"])?;
        let response = self
            .api
            .send_checked(self.api.get(url))
            .await
            .map_err(|e| with_status_context("Failed to fetch config", e))?;
        Ok(response.json().await?)
    }

    /// `POST /config/set`; needs a stored token
    pub async fn update_config(&self, config: &SystemConfig) -> Result<bool> {
        self.api.require_token()?;

        let url = self.api.url(&["config", "set"])?;
        let response = self
            .api
            .send_checked(self.api.post(url).json(config))
            .await
            .map_err(|e| with_status_context("Failed to update config", e))?;

        let accepted: bool = response.json().await?;
        info!(accepted, "system config update sent");
        Ok(accepted)
    }
}

fn with_status_context(context: &str, err: ClientError) -> ClientError {
    error!("{}: {}", context, err);
    match err {
        ClientError::Http { status, message } => ClientError::Http {
            status,
            message: format!("Network response was not ok ({}): {}", status, message),
        },
        other => other,
    }
}

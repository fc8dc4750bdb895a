//! Backend settings, image upload replies and LLM selection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ClientError;

/// Server-side configuration exposed through `/config/get` and `/config/set`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SystemConfig {
    #[serde(rename = "blogStoragePath", default)]
    pub blog_storage_path: String,
    #[serde(rename = "imageStoragePath", default)]
    pub image_storage_path: String,
    #[serde(rename = "xmodelAPIKey", default)]
    pub xmodel_api_key: String,
    #[serde(rename = "bigmodelAPIKey", default)]
    pub bigmodel_api_key: String,
}

impl SystemConfig {
    /// Apply a `key=value` edit using either the wire or the snake_case name
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<(), ClientError> {
        let slot = match key {
            "blogStoragePath" | "blog_storage_path" => &mut self.blog_storage_path,
            "imageStoragePath" | "image_storage_path" => &mut self.image_storage_path,
            "xmodelAPIKey" | "xmodel_api_key" => &mut self.xmodel_api_key,
            "bigmodelAPIKey" | "bigmodel_api_key" => &mut self.bigmodel_api_key,
            other => {
                return Err(ClientError::Config(format!(
                    "unknown system config field: {}",
                    other
                )))
            }
        };
        *slot = value.to_string();
        Ok(())
    }
}

/// Reply from `POST /image/upload`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageUploadResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub image_id: Option<i64>,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl ImageUploadResponse {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            path: None,
            image_id: None,
            file_name: None,
        }
    }
}

/// LLM backends the server can switch between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LlmType {
    XModel,
    BigModel,
}

impl LlmType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmType::XModel => "XModel",
            LlmType::BigModel => "BigModel",
        }
    }
}

impl fmt::Display for LlmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "XModel" => Ok(LlmType::XModel),
            "BigModel" => Ok(LlmType::BigModel),
            other => Err(ClientError::Parse(format!(
                "unsupported LLM type: {} (expected XModel or BigModel)",
                other
            ))),
        }
    }
}

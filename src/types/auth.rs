//! Authentication payloads exchanged with `/api/auth`

use serde::{Deserialize, Serialize};

/// Logged-in user as remembered by the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Successful login: a JWT plus the account it belongs to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub id: i64,
    pub username: String,
    pub email: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl LoginResponse {
    /// The user half of the response, without the token
    pub fn user(&self) -> User {
        User {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterResponse {
    pub message: String,
}

/// Error body the backend sends on rejected auth requests
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    /// Non-empty `message` of a JSON error body
    pub fn from_body(body: &str) -> Option<String> {
        serde_json::from_str::<MessageResponse>(body)
            .ok()
            .map(|m| m.message)
            .filter(|m| !m.is_empty())
    }
}

/// Point-in-time view of the auth store
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_authenticated: bool,
}

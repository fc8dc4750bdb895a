//! On-disk token storage
//!
//! Keeps the access token and the logged-in user in `session.json` under the
//! state directory. Every read goes back to disk so separate processes (and a
//! 401 handled mid-request) always agree on the current session.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::{LoginResponse, User};

/// File name of the persisted session inside the state directory
pub const SESSION_FILE: &str = "session.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<Value>,
}

/// Token/user persistence
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store backed by `<state_dir>/session.json`
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            path: state_dir.as_ref().join(SESSION_FILE),
        }
    }

    /// Store backed by an explicit file
    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist token and user from a successful login
    pub fn save_auth_data(&self, login: &LoginResponse) -> Result<()> {
        let session = StoredSession {
            token: Some(login.access_token.clone()),
            user: Some(serde_json::to_value(login.user())?),
        };
        self.write(&session)?;
        debug!(path = %self.path.display(), user = %login.username, "session saved");
        Ok(())
    }

    /// Forget token and user. Missing files are fine.
    pub fn clear_auth_data(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_token(&self) -> Option<String> {
        self.read().token.filter(|t| !t.is_empty())
    }

    pub fn get_user(&self) -> Option<User> {
        let raw = self.read().user?;
        match serde_json::from_value(raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Ignoring malformed stored user: {}", e);
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.get_token().is_some()
    }

    fn read(&self) -> StoredSession {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => return StoredSession::default(),
        };
        serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), "Session file unreadable, treating as logged out: {}", e);
            StoredSession::default()
        })
    }

    fn write(&self, session: &StoredSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, json)?;
        restrict_to_owner(&self.path)?;
        Ok(())
    }
}

/// The file holds a bearer token; keep it owner-only
#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn login() -> LoginResponse {
        LoginResponse {
            access_token: "jwt-123".to_string(),
            token_type: "Bearer".to_string(),
            id: 9,
            username: "ulna".to_string(),
            email: "ulna@example.com".to_string(),
        }
    }

    #[test]
    fn test_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        assert!(store.get_token().is_none());
        assert!(store.get_user().is_none());
        assert!(!store.is_authenticated());
    }

    #[cfg(unix)]
    #[test]
    fn test_session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        store.save_auth_data(&login()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_save_then_read() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("nested"));
        store.save_auth_data(&login()).unwrap();

        assert_eq!(store.get_token().as_deref(), Some("jwt-123"));
        let user = store.get_user().unwrap();
        assert_eq!(user.id, 9);
        assert_eq!(user.username, "ulna");
        assert!(store.is_authenticated());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        store.clear_auth_data().unwrap();
        store.save_auth_data(&login()).unwrap();
        store.clear_auth_data().unwrap();
        store.clear_auth_data().unwrap();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_corrupt_user_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        fs::write(store.path(), r#"{"token":"t","user":{"name":"nope"}}"#).unwrap();
        assert_eq!(store.get_token().as_deref(), Some("t"));
        assert!(store.get_user().is_none());
    }

    #[test]
    fn test_garbage_file_reads_as_logged_out() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        fs::write(store.path(), "not json").unwrap();
        assert!(!store.is_authenticated());
    }
}

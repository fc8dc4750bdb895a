//! In-memory authentication state backed by the on-disk session

use tracing::info;

use crate::api::AuthService;
use crate::errors::Result;
use crate::session::store::SessionStore;
use crate::types::{AuthSnapshot, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, User};

/// Current user and token, loaded from and written through to a [`SessionStore`]
#[derive(Debug, Clone)]
pub struct AuthStore {
    store: SessionStore,
    user: Option<User>,
    token: Option<String>,
}

impl AuthStore {
    /// Empty state; call [`AuthStore::init_auth`] to pick up a saved session
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            user: None,
            token: None,
        }
    }

    /// Load the persisted session. State changes only if both token and user exist.
    pub fn init_auth(&mut self) {
        if let (Some(token), Some(user)) = (self.store.get_token(), self.store.get_user()) {
            self.token = Some(token);
            self.user = Some(user);
        }
    }

    /// Authenticate, persist the session and update state
    pub async fn login(
        &mut self,
        service: &AuthService,
        credentials: &LoginRequest,
    ) -> Result<LoginResponse> {
        let response = service.login(credentials).await?;
        self.store.save_auth_data(&response)?;
        self.token = Some(response.access_token.clone());
        self.user = Some(response.user());
        Ok(response)
    }

    /// Create an account; does not log in
    pub async fn register(
        &self,
        service: &AuthService,
        user: &RegisterRequest,
    ) -> Result<RegisterResponse> {
        service.register(user).await
    }

    /// Drop the session from disk and memory
    pub fn logout(&mut self) -> Result<()> {
        self.store.clear_auth_data()?;
        if let Some(user) = self.user.take() {
            info!(username = %user.username, "Logged out");
        }
        self.token = None;
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        AuthSnapshot {
            user: self.user.clone(),
            token: self.token.clone(),
            is_authenticated: self.is_authenticated(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn saved_login() -> LoginResponse {
        LoginResponse {
            access_token: "tok".to_string(),
            token_type: "Bearer".to_string(),
            id: 1,
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
        }
    }

    #[test]
    fn test_init_auth_loads_saved_session() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        store.save_auth_data(&saved_login()).unwrap();

        let mut auth = AuthStore::new(store);
        assert!(!auth.is_authenticated());
        auth.init_auth();
        assert!(auth.is_authenticated());
        assert_eq!(auth.user().unwrap().username, "admin");
        assert_eq!(auth.token(), Some("tok"));
    }

    #[test]
    fn test_init_auth_requires_token_and_user() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        fs::write(store.path(), r#"{"token":"orphan"}"#).unwrap();

        let mut auth = AuthStore::new(store);
        auth.init_auth();
        assert!(!auth.is_authenticated());
        assert!(auth.user().is_none());
    }

    #[test]
    fn test_logout_clears_everything() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        store.save_auth_data(&saved_login()).unwrap();

        let mut auth = AuthStore::new(store.clone());
        auth.init_auth();
        auth.logout().unwrap();

        assert_eq!(auth.snapshot(), AuthSnapshot::default());
        assert!(!store.is_authenticated());
    }
}

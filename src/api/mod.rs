//! Backend API services
//!
//! One service per backend area, all sharing a single [`ApiClient`] (and so a
//! single session store).

pub mod auth;
pub mod blogs;
pub mod http;
pub mod images;
pub mod llm;
pub mod system;

pub use auth::AuthService;
pub use blogs::BlogService;
pub use http::{ApiClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use images::{image_url, ImageService};
pub use llm::LlmService;
pub use system::ConfigService;

use std::time::Duration;

use crate::errors::Result;
use crate::session::SessionStore;

/// All services bound to one backend
#[derive(Debug, Clone)]
pub struct BlogManagerClient {
    api: ApiClient,
}

impl BlogManagerClient {
    pub fn new(base_url: &str, timeout: Duration, session: SessionStore) -> Result<Self> {
        Ok(Self {
            api: ApiClient::with_timeout(base_url, timeout, session)?,
        })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &SessionStore {
        self.api.session()
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.api.clone())
    }

    pub fn blogs(&self) -> BlogService {
        BlogService::new(self.api.clone())
    }

    pub fn images(&self) -> ImageService {
        ImageService::new(self.api.clone())
    }

    pub fn system(&self) -> ConfigService {
        ConfigService::new(self.api.clone())
    }

    pub fn llm(&self) -> LlmService {
        LlmService::new(self.api.clone())
    }
}

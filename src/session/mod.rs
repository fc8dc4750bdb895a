//! Session module
//!
//! Token persistence and the authentication state built on top of it.

pub mod auth;
pub mod store;

pub use auth::AuthStore;
pub use store::{SessionStore, SESSION_FILE};

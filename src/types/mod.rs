//! Type definitions module
//!
//! Wire types shared by the API services, the session store and the CLI.

pub mod auth;
pub mod blog;
pub mod system;

// Re-export commonly used types
pub use auth::{
    AuthSnapshot, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
    RegisterResponse, User,
};
pub use blog::{AddedBlog, ApiResponse, BlogDetail, BlogKey, BlogListItem, BlogMeta, OpOutcome};
pub use system::{ImageUploadResponse, LlmType, SystemConfig};

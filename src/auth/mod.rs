//! Authentication module

pub mod admin;
pub mod middleware;
pub mod password;

pub use admin::AdminAuthenticator;
pub use middleware::{admin_auth_middleware, extract_credentials, AdminContext};
pub use password::PasswordHasher;

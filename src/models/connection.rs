//! MongoDB connection switch request

use secrecy::Secret;
use serde::Deserialize;
use validator::Validate;

/// Change connection request
#[derive(Debug, Deserialize, Validate)]
pub struct ConnectionDetails {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1, max = 65535))]
    pub port: u32,
    pub username: Option<String>,
    pub password: Option<Secret<String>>,
    #[validate(length(min = 1))]
    pub database: String,
}

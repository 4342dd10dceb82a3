//! 管理员凭据校验
//!
//! 启动时对配置中的管理员密码做一次 Argon2 哈希，请求到来时只做校验，
//! 明文密码不在内存中长期保留。

use super::password::PasswordHasher;
use crate::{config::SecurityConfig, error::AppError};
use secrecy::ExposeSecret;
use std::sync::Arc;

pub struct AdminAuthenticator {
    username: String,
    password_hash: String,
    hasher: PasswordHasher,
}

impl AdminAuthenticator {
    pub fn from_config(security: &SecurityConfig) -> Result<Self, AppError> {
        let hasher = PasswordHasher::from_config(security)?;
        let password_hash = hasher.hash(security.admin_password.expose_secret())?;

        Ok(Self {
            username: security.admin_username.clone(),
            password_hash,
            hasher,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// 校验用户名和密码
    pub fn verify(&self, username: &str, password: &str) -> Result<(), AppError> {
        if username != self.username {
            return Err(AppError::Unauthorized);
        }
        self.hasher.verify(password, &self.password_hash)
    }

    /// 在阻塞线程池中校验，避免 Argon2 占用异步工作线程
    pub async fn verify_blocking(
        self: Arc<Self>,
        username: String,
        password: String,
    ) -> Result<(), AppError> {
        tokio::task::spawn_blocking(move || self.verify(&username, &password))
            .await
            .map_err(|e| AppError::Internal(format!("Credential check aborted: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn security() -> SecurityConfig {
        SecurityConfig {
            admin_username: "admin".to_string(),
            admin_password: Secret::new("cse-512-master-password".to_string()),
            hash_memory_kib: 1024,
            hash_iterations: 1,
            hash_parallelism: 1,
            trust_proxy: false,
            allowed_ips: None,
        }
    }

    #[test]
    fn test_verify_admin_credentials() {
        let authenticator = AdminAuthenticator::from_config(&security()).unwrap();

        assert!(authenticator.verify("admin", "cse-512-master-password").is_ok());
        assert!(authenticator.verify("admin", "wrong").is_err());
        assert!(authenticator.verify("root", "cse-512-master-password").is_err());
    }

    #[tokio::test]
    async fn test_verify_blocking() {
        let authenticator = Arc::new(AdminAuthenticator::from_config(&security()).unwrap());

        let ok = authenticator
            .clone()
            .verify_blocking("admin".to_string(), "cse-512-master-password".to_string())
            .await;
        assert!(ok.is_ok());

        let denied = authenticator
            .verify_blocking("admin".to_string(), "nope".to_string())
            .await;
        assert!(matches!(denied, Err(AppError::Unauthorized)));
    }
}

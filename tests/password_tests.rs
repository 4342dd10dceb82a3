//! 密码哈希功能单元测试
//!
//! 测试 Argon2id 密码哈希和管理员凭据校验

use ehr_service::auth::{AdminAuthenticator, PasswordHasher};
use ehr_service::config::SecurityConfig;
use secrecy::Secret;

fn security(password: &str) -> SecurityConfig {
    SecurityConfig {
        admin_username: "admin".to_string(),
        admin_password: Secret::new(password.to_string()),
        hash_memory_kib: 1024,
        hash_iterations: 1,
        hash_parallelism: 1,
        trust_proxy: false,
        allowed_ips: None,
    }
}

#[test]
fn test_hasher_from_config() {
    let hasher = PasswordHasher::from_config(&security("irrelevant-here")).unwrap();
    let hash = hasher.hash("MyPassword123").unwrap();

    assert!(hasher.verify("MyPassword123", &hash).is_ok());
    assert!(hasher.verify("mypassword123", &hash).is_err());
}

#[test]
fn test_hash_is_not_plaintext() {
    let hasher = PasswordHasher::with_cost(1024, 1, 1).unwrap();
    let hash = hasher.hash("cse-512-master-password").unwrap();

    assert!(!hash.contains("cse-512-master-password"));
    assert!(hash.starts_with("$argon2id$"));
}

#[test]
fn test_verify_rejects_malformed_hash() {
    let hasher = PasswordHasher::with_cost(1024, 1, 1).unwrap();
    assert!(hasher.verify("anything", "not-a-phc-string").is_err());
}

#[test]
fn test_admin_authenticator_unicode_password() {
    let authenticator = AdminAuthenticator::from_config(&security("密码-pässwörd-🔐")).unwrap();

    assert_eq!(authenticator.username(), "admin");
    assert!(authenticator.verify("admin", "密码-pässwörd-🔐").is_ok());
    assert!(authenticator.verify("admin", "密码-passwort-🔐").is_err());
}

#[test]
fn test_admin_authenticator_rejects_invalid_cost() {
    let mut config = security("a-long-admin-password");
    config.hash_memory_kib = 1;
    assert!(AdminAuthenticator::from_config(&config).is_err());
}

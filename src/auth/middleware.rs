//! 管理员认证中间件

use crate::{auth::admin::AdminAuthenticator, error::AppError};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// 请求头中的管理员用户名
pub const ADMIN_USERNAME_HEADER: &str = "username";
/// 请求头中的管理员密码
pub const ADMIN_PASSWORD_HEADER: &str = "password";

/// 认证上下文（附加到请求扩展）
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub username: String,
}

// 实现 FromRequestParts 以便在 handler 中直接提取 AdminContext
impl<S> FromRequestParts<S> for AdminContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminContext>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// 从请求头提取管理员凭据
pub fn extract_credentials(headers: &HeaderMap) -> Result<(String, String), AppError> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    };

    match (header(ADMIN_USERNAME_HEADER), header(ADMIN_PASSWORD_HEADER)) {
        (Some(username), Some(password)) => Ok((username, password)),
        _ => Err(AppError::Unauthorized),
    }
}

/// 管理员认证中间件 - 必须认证
pub async fn admin_auth_middleware(
    State(authenticator): State<Arc<AdminAuthenticator>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (username, password) = extract_credentials(req.headers())?;

    if let Err(e) = authenticator
        .verify_blocking(username.clone(), password)
        .await
    {
        tracing::warn!(username = %username, "Admin authentication failed");
        return Err(e);
    }

    req.extensions_mut().insert(AdminContext { username });

    Ok(next.run(req).await)
}

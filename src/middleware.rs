//! HTTP 中间件
//! 应用状态、请求追踪、IP 白名单

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    auth::AdminAuthenticator,
    config::AppConfig,
    db::PatientStore,
    error::AppError,
    repository::PatientRepository,
    services::{ConnectionService, PatientService},
};

/// 应用状态
///
/// 服务共享同一个 PatientStore，管理员切换连接后所有服务立即使用新连接。
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<PatientStore>,
    pub patient_service: Arc<PatientService>,
    pub connection_service: Arc<ConnectionService>,
    pub admin_authenticator: Arc<AdminAuthenticator>,
}

impl AppState {
    /// 基于已连接的存储后端组装所有服务
    pub fn new(config: AppConfig, repo: Arc<dyn PatientRepository>) -> Result<Self, AppError> {
        let store = Arc::new(PatientStore::new(repo));
        let admin_authenticator = Arc::new(AdminAuthenticator::from_config(&config.security)?);

        Ok(Self {
            patient_service: Arc::new(PatientService::new(store.clone())),
            connection_service: Arc::new(ConnectionService::new(
                store.clone(),
                config.database.clone(),
            )),
            admin_authenticator,
            store,
            config,
        })
    }
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().clone();
    let uri = req.uri().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    async move {
        let start = Instant::now();

        let mut response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status().as_u16();

        metrics::counter!(
            "http_requests_total",
            "method" => method_label(method.as_str()),
            "status" => status_label(status)
        )
        .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            method = %method,
            uri = %uri,
            status = status,
            elapsed_ms = elapsed.as_millis() as u64,
            "Request completed"
        );

        // 在响应头中回写 trace_id / request_id
        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

fn method_label(method: &str) -> &'static str {
    match method {
        "GET" => "GET",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "PATCH" => "PATCH",
        _ => "UNKNOWN",
    }
}

fn status_label(status: u16) -> &'static str {
    match status {
        200 => "200",
        201 => "201",
        204 => "204",
        400 => "400",
        401 => "401",
        403 => "403",
        404 => "404",
        409 => "409",
        422 => "422",
        500 => "500",
        _ => "other",
    }
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// IP 白名单中间件
pub async fn ip_whitelist_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(allowed_ips) = &state.config.security.allowed_ips {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let client_ip = get_client_ip(req.headers(), peer, state.config.security.trust_proxy);

        if !allowed_ips.contains(&client_ip) {
            tracing::warn!(client_ip = %client_ip, "IP not in whitelist");
            return Err(AppError::Forbidden);
        }

        tracing::debug!(client_ip = %client_ip, "IP allowed by whitelist");
    }

    Ok(next.run(req).await)
}

/// 获取客户端 IP 地址
///
/// 仅在 `trust_proxy` 开启时读取代理头，否则使用 TCP 对端地址。
fn get_client_ip(headers: &HeaderMap, peer: Option<IpAddr>, trust_proxy: bool) -> String {
    if trust_proxy {
        // X-Forwarded-For 可能包含多个 IP，取第一个
        if let Some(first_ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            return first_ip.to_string();
        }

        if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
            return real_ip.trim().to_string();
        }
    }

    peer.map(|ip| ip.to_string()).unwrap_or_else(|| "unknown".to_string())
}

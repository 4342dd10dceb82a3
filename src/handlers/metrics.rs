//! 指标处理器
//! 提供 /metrics 端点

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::middleware::AppState;

/// 指标响应
#[derive(Serialize)]
pub struct MetricsResponse {
    pub storage_backend: String,
    pub process_uptime_secs: u64,
    pub version: String,
}

/// 指标暴露端点
pub async fn metrics_export(State(state): State<Arc<AppState>>) -> Json<MetricsResponse> {
    // 计数器通过 metrics facade 上报，这里只返回进程级信息
    let repo = state.store.current().await;

    Json(MetricsResponse {
        storage_backend: repo.backend().to_string(),
        process_uptime_secs: crate::handlers::health::get_uptime(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

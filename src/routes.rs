//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
};

use crate::{auth::admin_auth_middleware, handlers, middleware::AppState};

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查）
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::metrics::metrics_export));

    // 患者档案
    let patient_routes = Router::new()
        .route("/api/v1/patients", post(handlers::patient::create_patient))
        .route(
            "/api/v1/patients/{patient_id}",
            get(handlers::patient::get_patient).put(handlers::patient::update_patient),
        )
        // 病历
        .route(
            "/api/v1/patients/{patient_id}/medical-records",
            get(handlers::medical_records::get_medical_records)
                .put(handlers::medical_records::update_medical_records),
        )
        .route(
            "/api/v1/patients/{patient_id}/medical-records/conditions",
            post(handlers::medical_records::add_condition),
        )
        .route(
            "/api/v1/patients/{patient_id}/medical-records/medications",
            post(handlers::medical_records::add_medication),
        )
        .route(
            "/api/v1/patients/{patient_id}/medical-records/observations",
            post(handlers::medical_records::add_observation),
        );

    // 管理员路由（username / password 请求头认证）
    let admin_routes = Router::new()
        .route(
            "/api/v1/admin/change-connection",
            post(handlers::admin::change_connection),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.admin_authenticator.clone(),
            admin_auth_middleware,
        ));

    // 组合所有路由
    Router::new()
        .merge(public_routes)
        .merge(patient_routes)
        .merge(admin_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::ip_whitelist_middleware,
        ))
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .layer(RequestBodyLimitLayer::new(state.config.server.max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .with_state(state)
}

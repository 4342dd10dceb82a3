//! 管理员 HTTP 处理器

use crate::{
    auth::AdminContext, error::AppError, extract::JsonBody, middleware::AppState,
    models::ConnectionDetails,
};
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

/// 切换 MongoDB 连接
pub async fn change_connection(
    State(state): State<Arc<AppState>>,
    admin: AdminContext,
    JsonBody(details): JsonBody<ConnectionDetails>,
) -> Result<impl IntoResponse, AppError> {
    state
        .connection_service
        .change_connection(details, &admin.username)
        .await?;

    Ok(Json(json!({
        "message": "MongoDB connection updated successfully"
    })))
}

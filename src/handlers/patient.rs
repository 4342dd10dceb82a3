//! 患者档案 HTTP 处理器

use crate::{
    error::AppError,
    extract::JsonBody,
    middleware::AppState,
    models::{Patient, PatientCreatedResponse},
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// 创建患者档案
pub async fn create_patient(
    State(state): State<Arc<AppState>>,
    JsonBody(patient): JsonBody<Patient>,
) -> Result<impl IntoResponse, AppError> {
    let patient_id = state.patient_service.create_patient(patient).await?;

    Ok(Json(PatientCreatedResponse {
        message: "Patient record created successfully".to_string(),
        patient_id,
    }))
}

/// 获取患者档案
pub async fn get_patient(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let patient = state.patient_service.get_patient(&patient_id).await?;
    Ok(Json(patient))
}

/// 更新患者档案（任意字段）
pub async fn update_patient(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<String>,
    JsonBody(fields): JsonBody<Map<String, Value>>,
) -> Result<impl IntoResponse, AppError> {
    state
        .patient_service
        .update_patient(&patient_id, fields)
        .await?;

    Ok(Json(json!({
        "message": "Patient record updated successfully"
    })))
}

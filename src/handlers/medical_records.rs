//! 病历 HTTP 处理器

use crate::{
    error::AppError,
    extract::JsonBody,
    middleware::AppState,
    models::{Condition, MedicalRecords, Medication, Observation, RecordKind},
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// 获取病历
pub async fn get_medical_records(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let records = state
        .patient_service
        .get_medical_records(&patient_id)
        .await?;
    Ok(Json(records))
}

/// 整体替换病历
pub async fn update_medical_records(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<String>,
    JsonBody(records): JsonBody<MedicalRecords>,
) -> Result<impl IntoResponse, AppError> {
    state
        .patient_service
        .replace_medical_records(&patient_id, records)
        .await?;

    Ok(Json(json!({
        "message": "Medical records updated successfully"
    })))
}

/// 追加诊断
pub async fn add_condition(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<String>,
    JsonBody(condition): JsonBody<Condition>,
) -> Result<impl IntoResponse, AppError> {
    add_record(&state, &patient_id, RecordKind::Condition, &condition).await
}

/// 追加用药
pub async fn add_medication(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<String>,
    JsonBody(medication): JsonBody<Medication>,
) -> Result<impl IntoResponse, AppError> {
    add_record(&state, &patient_id, RecordKind::Medication, &medication).await
}

/// 追加观察结果
pub async fn add_observation(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<String>,
    JsonBody(observation): JsonBody<Observation>,
) -> Result<impl IntoResponse, AppError> {
    add_record(&state, &patient_id, RecordKind::Observation, &observation).await
}

async fn add_record<T>(
    state: &AppState,
    patient_id: &str,
    kind: RecordKind,
    entry: &T,
) -> Result<Json<serde_json::Value>, AppError>
where
    T: serde::Serialize + validator::Validate,
{
    state
        .patient_service
        .add_record(patient_id, kind, entry)
        .await?;

    Ok(Json(json!({ "message": kind.added_message() })))
}

//! 测试公共模块
//! 提供测试辅助函数和测试工具

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use ehr_service::{
    config::{
        AppConfig, DatabaseConfig, LoggingConfig, SecurityConfig, ServerConfig, StorageBackend,
    },
    middleware::AppState,
    repository::InMemoryPatientRepository,
};
use http_body_util::BodyExt;
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "test-admin-password";

/// 创建测试配置
pub fn create_test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            addr: "127.0.0.1:0".to_string(), // 使用随机端口
            graceful_shutdown_timeout_secs: 5,
            max_body_bytes: 64 * 1024,
        },
        database: DatabaseConfig {
            backend: StorageBackend::Memory,
            host: "127.0.0.1".to_string(),
            port: 27017,
            username: None,
            password: None,
            name: "ehr_database_test".to_string(),
            collection: "patients".to_string(),
            app_name: "ehr-service-test".to_string(),
            connect_timeout_secs: 1,
            server_selection_timeout_secs: 1,
            max_pool_size: 2,
            min_pool_size: 0,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            admin_username: ADMIN_USERNAME.to_string(),
            admin_password: Secret::new(ADMIN_PASSWORD.to_string()),
            // 测试使用低开销参数
            hash_memory_kib: 1024,
            hash_iterations: 1,
            hash_parallelism: 1,
            trust_proxy: false,
            allowed_ips: None,
        },
    }
}

/// 创建测试应用状态（内存存储）
pub fn create_test_app_state(config: AppConfig) -> Arc<AppState> {
    let repo = Arc::new(InMemoryPatientRepository::new());
    Arc::new(AppState::new(config, repo).expect("Failed to build app state"))
}

/// 创建测试应用
pub fn create_test_app() -> Router {
    ehr_service::routes::create_router(create_test_app_state(create_test_config()))
}

/// 测试用患者数据
pub fn sample_patient(patient_id: &str) -> Value {
    json!({
        "patientID": patient_id,
        "name": "Jane Doe",
        "age": 42,
        "gender": "female",
        "region": "southwest",
        "medicalRecords": {
            "conditions": [sample_condition("cond-1")],
            "medications": [],
            "observations": []
        }
    })
}

pub fn sample_condition(id: &str) -> Value {
    json!({
        "id": id,
        "code": {
            "coding": [{
                "system": "http://snomed.info/sct",
                "code": "44054006",
                "display": "Diabetes mellitus type 2"
            }]
        },
        "onsetDateTime": "2021-03-14T00:00:00Z",
        "clinicalStatus": "active"
    })
}

pub fn sample_medication(patient_id: &str) -> Value {
    json!({
        "status": "active",
        "stage": "ordered",
        "medication": "Metformin 500 MG",
        "patientReference": format!("Patient/{}", patient_id),
        "contextReference": "Encounter/enc-1",
        "dateWritten": "2021-03-15T00:00:00Z",
        "dosageInstruction": [{ "sequence": 1, "asNeeded": false, "timing": null }]
    })
}

pub fn sample_observation(id: &str) -> Value {
    json!({
        "id": id,
        "code": "8867-4",
        "value": "72",
        "unit": "/min",
        "effectiveDateTime": "2021-03-15T09:30:00Z",
        "components": []
    })
}

/// 发送 JSON 请求并解析响应
pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    read_response(response).await
}

/// 发送原始请求体（用于非法 JSON）
pub async fn send_raw(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    read_response(response).await
}

/// 读取响应状态与 JSON 体（非 JSON 时返回 Null）
pub async fn read_response(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// 创建患者并返回存储 `_id`
pub async fn create_patient(app: &Router, patient_id: &str) -> String {
    let (status, body) = send_json(
        app,
        "POST",
        "/api/v1/patients",
        Some(sample_patient(patient_id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create failed: {}", body);
    body["patient_id"].as_str().unwrap().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_test_config() {
        let config = create_test_config();
        assert_eq!(config.server.addr, "127.0.0.1:0");
        assert_eq!(config.database.backend, StorageBackend::Memory);
        assert!(config.validate().is_ok());
    }
}

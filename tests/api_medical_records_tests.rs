//! 病历 API 集成测试

use axum::http::StatusCode;
use ehr_service::{
    middleware::AppState,
    repository::{InMemoryPatientRepository, PatientRepository},
};
use mongodb::bson::doc;
use serde_json::json;
use std::sync::Arc;

mod common;
use common::{
    create_patient, create_test_app, create_test_config, sample_condition, sample_medication,
    sample_observation, send_json,
};

#[tokio::test]
async fn test_get_medical_records() {
    let app = create_test_app();
    create_patient(&app, "M001").await;

    let (status, body) =
        send_json(&app, "GET", "/api/v1/patients/M001/medical-records", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["conditions"].as_array().unwrap().len(), 1);
    assert_eq!(body["conditions"][0]["id"], "cond-1");
    assert!(body["medications"].as_array().unwrap().is_empty());
    assert!(body.get("_id").is_none());
    assert!(body.get("patientID").is_none());
}

#[tokio::test]
async fn test_get_medical_records_unknown_patient() {
    let app = create_test_app();

    let (status, body) =
        send_json(&app, "GET", "/api/v1/patients/none/medical-records", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Medical records not found");
}

#[tokio::test]
async fn test_get_medical_records_missing_field() {
    let repo = Arc::new(InMemoryPatientRepository::new());
    repo.insert_patient(doc! { "patientID": "M002", "name": "Legacy Import" })
        .await
        .unwrap();

    let state = AppState::new(create_test_config(), repo).unwrap();
    let app = ehr_service::routes::create_router(Arc::new(state));

    let (status, _) = send_json(&app, "GET", "/api/v1/patients/M002", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
        send_json(&app, "GET", "/api/v1/patients/M002/medical-records", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Medical records not found");
}

#[tokio::test]
async fn test_replace_medical_records() {
    let app = create_test_app();
    create_patient(&app, "M003").await;

    let records = json!({
        "conditions": [],
        "medications": [sample_medication("M003")],
        "observations": [sample_observation("obs-1"), sample_observation("obs-2")]
    });

    let (status, body) = send_json(
        &app,
        "PUT",
        "/api/v1/patients/M003/medical-records",
        Some(records),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Medical records updated successfully");

    let (_, body) = send_json(&app, "GET", "/api/v1/patients/M003/medical-records", None).await;
    assert!(body["conditions"].as_array().unwrap().is_empty());
    assert_eq!(body["medications"][0]["medication"], "Metformin 500 MG");
    assert_eq!(body["medications"][0]["dosageInstruction"][0]["sequence"], 1);
    assert!(body["medications"][0]["dosageInstruction"][0]["timing"].is_null());
    assert_eq!(body["observations"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_replace_medical_records_unknown_patient() {
    let app = create_test_app();

    let (status, body) = send_json(
        &app,
        "PUT",
        "/api/v1/patients/ghost/medical-records",
        Some(json!({ "conditions": [], "medications": [], "observations": [] })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Patient not found");
}

#[tokio::test]
async fn test_add_condition() {
    let app = create_test_app();
    create_patient(&app, "M004").await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/v1/patients/M004/medical-records/conditions",
        Some(sample_condition("cond-2")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Condition added successfully");

    let (_, records) =
        send_json(&app, "GET", "/api/v1/patients/M004/medical-records", None).await;
    let conditions = records["conditions"].as_array().unwrap();
    assert_eq!(conditions.len(), 2);
    assert_eq!(conditions[1]["id"], "cond-2");
    assert_eq!(conditions[1]["clinicalStatus"], "active");
}

#[tokio::test]
async fn test_add_medication_and_observation() {
    let app = create_test_app();
    create_patient(&app, "M005").await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/v1/patients/M005/medical-records/medications",
        Some(sample_medication("M005")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Medication added successfully");

    let mut observation = sample_observation("obs-9");
    observation["value"] = json!(null);
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/v1/patients/M005/medical-records/observations",
        Some(observation),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Observation added successfully");

    let (_, records) =
        send_json(&app, "GET", "/api/v1/patients/M005/medical-records", None).await;
    assert_eq!(records["medications"][0]["patientReference"], "Patient/M005");
    assert_eq!(records["observations"][0]["id"], "obs-9");
    assert!(records["observations"][0]["value"].is_null());
}

#[tokio::test]
async fn test_add_entry_to_unknown_patient() {
    let app = create_test_app();

    for (path, entry) in [
        ("conditions", sample_condition("c")),
        ("medications", sample_medication("x")),
        ("observations", sample_observation("o")),
    ] {
        let (status, body) = send_json(
            &app,
            "POST",
            &format!("/api/v1/patients/ghost/medical-records/{}", path),
            Some(entry),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "Patient not found");
    }
}

#[tokio::test]
async fn test_add_condition_validation() {
    let app = create_test_app();
    create_patient(&app, "M006").await;

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/v1/patients/M006/medical-records/conditions",
        Some(sample_condition("")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_condition_recreates_missing_list() {
    let app = create_test_app();
    create_patient(&app, "M007").await;

    let (status, _) = send_json(
        &app,
        "PUT",
        "/api/v1/patients/M007",
        Some(json!({ "medicalRecords": {} })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/v1/patients/M007/medical-records/conditions",
        Some(sample_condition("cond-new")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, records) =
        send_json(&app, "GET", "/api/v1/patients/M007/medical-records", None).await;
    assert_eq!(records["conditions"][0]["id"], "cond-new");
    assert!(records.get("medications").is_none());
}

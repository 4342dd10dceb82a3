//! 患者档案服务
//! 负责请求校验、BSON 转换、日志与指标，存储细节交给 PatientRepository

use crate::{
    db::PatientStore,
    error::AppError,
    models::{
        patient::{MEDICAL_RECORDS_FIELD, PATIENT_ID_FIELD, PATIENT_ID_MAX_LEN},
        MedicalRecords, Patient, RecordKind,
    },
};
use mongodb::bson::{self, Bson, Document};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use validator::{Validate, ValidateLength};

pub struct PatientService {
    store: Arc<PatientStore>,
}

impl PatientService {
    pub fn new(store: Arc<PatientStore>) -> Self {
        Self { store }
    }

    /// 创建患者档案，返回存储生成的 `_id`（十六进制）
    pub async fn create_patient(&self, patient: Patient) -> Result<String, AppError> {
        patient.validate().map_err(|e| AppError::validation(&e))?;

        let document = bson::to_document(&patient)?;
        let repo = self.store.current().await;
        let object_id = repo.insert_patient(document).await?;

        record_operation("create");
        tracing::info!(
            patient_id = %patient.patient_id,
            object_id = %object_id,
            backend = repo.backend(),
            "Patient record created"
        );

        Ok(object_id.to_hex())
    }

    /// 获取完整患者文档
    pub async fn get_patient(&self, patient_id: &str) -> Result<Value, AppError> {
        let repo = self.store.current().await;
        let document = repo
            .find_patient(patient_id)
            .await?
            .ok_or_else(|| AppError::not_found("Patient not found"))?;

        record_operation("get");
        Ok(document_to_json(document))
    }

    /// 以 `$set` 方式更新任意字段
    pub async fn update_patient(
        &self,
        patient_id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), AppError> {
        let update = update_document(fields)?;
        let field_names: Vec<String> = update.keys().cloned().collect();

        let repo = self.store.current().await;
        if !repo.set_fields(patient_id, update).await? {
            return Err(AppError::not_found("Patient not found"));
        }

        record_operation("update");
        tracing::info!(patient_id = %patient_id, fields = ?field_names, "Patient record updated");
        Ok(())
    }

    /// 获取病历
    pub async fn get_medical_records(&self, patient_id: &str) -> Result<Value, AppError> {
        let repo = self.store.current().await;
        let records = repo
            .find_medical_records(patient_id)
            .await?
            .ok_or_else(|| AppError::not_found("Medical records not found"))?;

        record_operation("get_medical_records");
        Ok(records.into_relaxed_extjson())
    }

    /// 整体替换病历
    pub async fn replace_medical_records(
        &self,
        patient_id: &str,
        records: MedicalRecords,
    ) -> Result<(), AppError> {
        records.validate().map_err(|e| AppError::validation(&e))?;

        let mut update = Document::new();
        update.insert(MEDICAL_RECORDS_FIELD, bson::to_document(&records)?);

        let repo = self.store.current().await;
        if !repo.set_fields(patient_id, update).await? {
            return Err(AppError::not_found("Patient not found"));
        }

        record_operation("replace_medical_records");
        tracing::info!(patient_id = %patient_id, "Medical records replaced");
        Ok(())
    }

    /// 向病历列表追加一条记录
    pub async fn add_record<T>(
        &self,
        patient_id: &str,
        kind: RecordKind,
        entry: &T,
    ) -> Result<(), AppError>
    where
        T: Serialize + Validate,
    {
        entry.validate().map_err(|e| AppError::validation(&e))?;

        let document = bson::to_document(entry)?;
        let repo = self.store.current().await;
        if !repo
            .push_entry(patient_id, kind.field_path(), document)
            .await?
        {
            return Err(AppError::not_found("Patient not found"));
        }

        record_operation(kind.as_str());
        tracing::info!(patient_id = %patient_id, kind = kind.as_str(), "Medical record entry added");
        Ok(())
    }
}

fn record_operation(kind: &'static str) {
    metrics::counter!("patient_operations_total", "kind" => kind).increment(1);
}

/// 将 JSON 更新体转换为 `$set` 文档
///
/// 拒绝空更新、`$` 开头的操作符键、`_id`、空路径段以及互为前缀的路径。
pub(crate) fn update_document(fields: Map<String, Value>) -> Result<Document, AppError> {
    if fields.is_empty() {
        return Err(AppError::bad_request("Update payload must not be empty"));
    }

    for key in fields.keys() {
        if let Some(other) = fields.keys().find(|other| is_parent_path(key, other)) {
            return Err(AppError::bad_request(format!(
                "Updating '{}' would conflict at '{}'",
                other, key
            )));
        }
    }

    let mut update = Document::new();
    for (key, value) in fields {
        if key.starts_with('$') || key.split('.').any(|segment| segment.is_empty()) {
            return Err(AppError::bad_request(format!("Invalid field name: '{}'", key)));
        }
        if key == "_id" || key.starts_with("_id.") {
            return Err(AppError::bad_request("Field '_id' is immutable"));
        }

        let value = Bson::try_from(value).map_err(|e| {
            AppError::bad_request(format!("Invalid value for '{}': {}", key, e))
        })?;
        update.insert(key, value);
    }

    if let Some(value) = update.get(PATIENT_ID_FIELD) {
        let valid = matches!(
            value,
            Bson::String(id) if id.validate_length(Some(1), Some(PATIENT_ID_MAX_LEN), None)
        );
        if !valid {
            return Err(AppError::bad_request(format!(
                "patientID must be a string of 1 to {} characters",
                PATIENT_ID_MAX_LEN
            )));
        }
    }

    Ok(update)
}

/// `parent` 是 `path` 的上级路径（如 `contact` 与 `contact.phone`）
fn is_parent_path(parent: &str, path: &str) -> bool {
    path.strip_prefix(parent).is_some_and(|rest| rest.starts_with('.'))
}

/// 文档转 JSON：`_id` 输出为十六进制字符串，其余值用 relaxed extended JSON
pub(crate) fn document_to_json(document: Document) -> Value {
    let object_id = document.get_object_id("_id").ok().map(|id| id.to_hex());

    let mut value = Bson::Document(document).into_relaxed_extjson();
    if let (Some(id), Some(object)) = (object_id, value.as_object_mut()) {
        object.insert("_id".to_string(), Value::String(id));
    }
    value
}

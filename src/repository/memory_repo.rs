//! In-memory patient repository
//!
//! Documents live in insertion order inside `Arc<RwLock<_>>`. Updates follow
//! MongoDB's `$set` / `$push` rules for dotted paths: intermediate documents
//! are created on demand, and a path that runs through a non-document value is
//! rejected. Positional array segments (`a.0.b`) are not supported.

use super::PatientRepository;
use crate::error::AppError;
use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
pub struct InMemoryPatientRepository {
    patients: Arc<RwLock<Vec<Document>>>,
}

impl InMemoryPatientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前文档数量
    pub async fn len(&self) -> usize {
        self.patients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.patients.read().await.is_empty()
    }
}

fn patient_id_of(doc: &Document) -> Option<&str> {
    doc.get_str("patientID").ok()
}

fn duplicate_patient() -> AppError {
    AppError::Conflict("A patient with this patientID already exists".to_string())
}

/// Walk `path` from `doc`, creating missing intermediate documents, and hand
/// the parent document plus the final key to `apply`.
fn with_parent<T>(
    doc: &mut Document,
    path: &str,
    apply: impl FnOnce(&mut Document, &str) -> Result<T, AppError>,
) -> Result<T, AppError> {
    match path.split_once('.') {
        None => apply(doc, path),
        Some((head, rest)) => {
            if !doc.contains_key(head) {
                doc.insert(head, Document::new());
            }
            match doc.get_mut(head) {
                Some(Bson::Document(child)) => with_parent(child, rest, apply),
                _ => Err(AppError::bad_request(format!(
                    "Cannot apply update to '{}': '{}' is not an embedded document",
                    path, head
                ))),
            }
        }
    }
}

/// `$set` semantics for a single dotted path
pub(crate) fn set_path(doc: &mut Document, path: &str, value: Bson) -> Result<(), AppError> {
    with_parent(doc, path, |parent, key| {
        parent.insert(key, value);
        Ok(())
    })
}

/// `$push` semantics for a single dotted path
pub(crate) fn push_path(doc: &mut Document, path: &str, value: Bson) -> Result<(), AppError> {
    with_parent(doc, path, |parent, key| {
        if !parent.contains_key(key) {
            parent.insert(key, Bson::Array(Vec::new()));
        }
        match parent.get_mut(key) {
            Some(Bson::Array(items)) => {
                items.push(value);
                Ok(())
            }
            _ => Err(AppError::bad_request(format!(
                "Cannot push to '{}': field is not an array",
                path
            ))),
        }
    })
}

#[async_trait]
impl PatientRepository for InMemoryPatientRepository {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert_patient(&self, patient: Document) -> Result<ObjectId, AppError> {
        let mut patients = self.patients.write().await;

        if let Some(id) = patient_id_of(&patient) {
            if patients.iter().any(|p| patient_id_of(p) == Some(id)) {
                return Err(duplicate_patient());
            }
        }

        let object_id = ObjectId::new();
        let mut stored = Document::new();
        stored.insert("_id", object_id);
        for (key, value) in patient {
            if key != "_id" {
                stored.insert(key, value);
            }
        }

        patients.push(stored);
        Ok(object_id)
    }

    async fn find_patient(&self, patient_id: &str) -> Result<Option<Document>, AppError> {
        let patients = self.patients.read().await;
        Ok(patients
            .iter()
            .find(|p| patient_id_of(p) == Some(patient_id))
            .cloned())
    }

    async fn find_medical_records(&self, patient_id: &str) -> Result<Option<Bson>, AppError> {
        let patients = self.patients.read().await;
        Ok(patients
            .iter()
            .find(|p| patient_id_of(p) == Some(patient_id))
            .and_then(|p| p.get("medicalRecords").cloned()))
    }

    async fn set_fields(&self, patient_id: &str, fields: Document) -> Result<bool, AppError> {
        let mut patients = self.patients.write().await;

        let Some(index) = patients
            .iter()
            .position(|p| patient_id_of(p) == Some(patient_id))
        else {
            return Ok(false);
        };

        // 先在副本上应用，失败时原文档保持不变
        let mut updated = patients[index].clone();
        for (path, value) in fields {
            set_path(&mut updated, &path, value)?;
        }

        if let Some(new_id) = patient_id_of(&updated) {
            let clash = patients
                .iter()
                .enumerate()
                .any(|(i, p)| i != index && patient_id_of(p) == Some(new_id));
            if clash {
                return Err(duplicate_patient());
            }
        }

        patients[index] = updated;
        Ok(true)
    }

    async fn push_entry(
        &self,
        patient_id: &str,
        path: &str,
        entry: Document,
    ) -> Result<bool, AppError> {
        let mut patients = self.patients.write().await;

        match patients
            .iter_mut()
            .find(|p| patient_id_of(p) == Some(patient_id))
        {
            Some(patient) => {
                push_path(patient, path, Bson::Document(entry))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn shutdown(&self) {
        tracing::debug!("In-memory repository released");
    }
}

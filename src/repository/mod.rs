//! Patient document storage layer
//!
//! Repositories work on raw BSON documents. Typed validation happens in the
//! service layer, so the generic `$set` update can carry arbitrary fields.

pub mod memory_repo;
pub mod mongo_repo;

pub use memory_repo::InMemoryPatientRepository;
pub use mongo_repo::MongoPatientRepository;

use crate::error::AppError;
use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};

/// Storage operations on the patients collection, keyed by `patientID`
#[async_trait]
pub trait PatientRepository: Send + Sync {
    /// Backend name reported by health and metrics endpoints
    fn backend(&self) -> &'static str;

    /// Insert a new patient document and return its generated `_id`
    async fn insert_patient(&self, patient: Document) -> Result<ObjectId, AppError>;

    /// First document whose `patientID` matches
    async fn find_patient(&self, patient_id: &str) -> Result<Option<Document>, AppError>;

    /// `medicalRecords` value of the matching document, if both exist
    async fn find_medical_records(&self, patient_id: &str) -> Result<Option<Bson>, AppError>;

    /// Apply `fields` as a `$set`. Returns false when no patient matched.
    async fn set_fields(&self, patient_id: &str, fields: Document) -> Result<bool, AppError>;

    /// `$push` one entry onto the array at `path`. Returns false when no patient matched.
    async fn push_entry(
        &self,
        patient_id: &str,
        path: &str,
        entry: Document,
    ) -> Result<bool, AppError>;

    /// Round-trip to the backing store
    async fn ping(&self) -> Result<(), AppError>;

    /// Release connections. The repository must not be used afterwards.
    async fn shutdown(&self);
}

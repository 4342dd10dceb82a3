//! MongoDB patient repository (患者数据访问)

use super::PatientRepository;
use crate::{
    config::DatabaseConfig,
    db::{client_options, ConnectionTarget},
    error::AppError,
};
use async_trait::async_trait;
use mongodb::{
    bson::{doc, oid::ObjectId, Bson, Document},
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
    Client, Collection, Database, IndexModel,
};

/// MongoDB duplicate key error code
const DUPLICATE_KEY_CODE: i32 = 11000;

/// 客户端更新内容导致的写错误：BadValue、PathNotViable、ConflictingUpdateOperators
const INVALID_UPDATE_CODES: [i32; 3] = [2, 28, 40];

pub struct MongoPatientRepository {
    client: Client,
    database: Database,
    patients: Collection<Document>,
}

impl MongoPatientRepository {
    /// 连接 MongoDB，验证连通性并确保索引存在
    pub async fn connect(
        target: &ConnectionTarget,
        settings: &DatabaseConfig,
    ) -> Result<Self, AppError> {
        tracing::debug!(uri = %target.redacted_uri(), "Connecting to MongoDB...");

        let client = Client::with_options(client_options(target, settings))?;
        let repo = Self::from_client(client, &target.database, &settings.collection);

        repo.ping().await?;
        repo.ensure_indexes().await?;

        tracing::info!(
            uri = %target.redacted_uri(),
            collection = %settings.collection,
            "MongoDB connection established"
        );

        Ok(repo)
    }

    /// 基于已有客户端构建（不做连通性检查）
    pub fn from_client(client: Client, database: &str, collection: &str) -> Self {
        let database = client.database(database);
        let patients = database.collection::<Document>(collection);

        Self {
            client,
            database,
            patients,
        }
    }

    /// 创建 patientID 唯一索引
    pub async fn ensure_indexes(&self) -> Result<(), AppError> {
        let index = IndexModel::builder()
            .keys(doc! { "patientID": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.patients.create_index(index).await?;
        tracing::debug!("patientID unique index ensured");
        Ok(())
    }
}

fn write_error_code(err: &mongodb::error::Error) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => Some(write_error.code),
        _ => None,
    }
}

fn map_write_error(err: mongodb::error::Error) -> AppError {
    match write_error_code(&err) {
        Some(DUPLICATE_KEY_CODE) => {
            AppError::Conflict("A patient with this patientID already exists".to_string())
        }
        Some(code) if INVALID_UPDATE_CODES.contains(&code) => {
            let message = match err.kind.as_ref() {
                ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
                    write_error.message.clone()
                }
                _ => err.to_string(),
            };
            AppError::bad_request(format!("Update rejected: {}", message))
        }
        _ => AppError::Database(err),
    }
}

#[async_trait]
impl PatientRepository for MongoPatientRepository {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn insert_patient(&self, patient: Document) -> Result<ObjectId, AppError> {
        let result = self
            .patients
            .insert_one(patient)
            .await
            .map_err(map_write_error)?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| AppError::Internal("inserted _id is not an ObjectId".to_string()))
    }

    async fn find_patient(&self, patient_id: &str) -> Result<Option<Document>, AppError> {
        let patient = self.patients.find_one(doc! { "patientID": patient_id }).await?;
        Ok(patient)
    }

    async fn find_medical_records(&self, patient_id: &str) -> Result<Option<Bson>, AppError> {
        let projected = self
            .patients
            .find_one(doc! { "patientID": patient_id })
            .projection(doc! { "_id": 0, "medicalRecords": 1 })
            .await?;

        Ok(projected.and_then(|doc| doc.get("medicalRecords").cloned()))
    }

    async fn set_fields(&self, patient_id: &str, fields: Document) -> Result<bool, AppError> {
        let result = self
            .patients
            .update_one(doc! { "patientID": patient_id }, doc! { "$set": fields })
            .await
            .map_err(map_write_error)?;

        Ok(result.matched_count > 0)
    }

    async fn push_entry(
        &self,
        patient_id: &str,
        path: &str,
        entry: Document,
    ) -> Result<bool, AppError> {
        let mut push = Document::new();
        push.insert(path, entry);

        let result = self
            .patients
            .update_one(doc! { "patientID": patient_id }, doc! { "$push": push })
            .await
            .map_err(map_write_error)?;

        Ok(result.matched_count > 0)
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn shutdown(&self) {
        self.client.clone().shutdown().await;
        tracing::info!(database = %self.database.name(), "MongoDB client shut down");
    }
}

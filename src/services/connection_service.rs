//! MongoDB 连接切换服务
//!
//! 新连接在替换前必须通过 ping 与索引检查；任何一步失败，当前连接保持不变。

use crate::{
    config::DatabaseConfig,
    db::{ConnectionTarget, PatientStore},
    error::AppError,
    models::ConnectionDetails,
    repository::{MongoPatientRepository, PatientRepository},
};
use std::sync::Arc;
use validator::Validate;

pub struct ConnectionService {
    store: Arc<PatientStore>,
    settings: DatabaseConfig,
}

impl ConnectionService {
    /// `settings` 提供超时、连接池和集合名，主机与库名来自每次请求
    pub fn new(store: Arc<PatientStore>, settings: DatabaseConfig) -> Self {
        Self { store, settings }
    }

    /// 切换到新的 MongoDB 连接
    pub async fn change_connection(
        &self,
        details: ConnectionDetails,
        requested_by: &str,
    ) -> Result<(), AppError> {
        details.validate().map_err(|e| AppError::validation(&e))?;
        let target = ConnectionTarget::try_from(details)?;

        tracing::info!(
            uri = %target.redacted_uri(),
            requested_by = %requested_by,
            "Switching MongoDB connection"
        );

        let repo = MongoPatientRepository::connect(&target, &self.settings)
            .await
            .map_err(|e| {
                tracing::error!(uri = %target.redacted_uri(), error = %e, "New MongoDB connection failed");
                AppError::ConnectionUpdate(connection_failure_reason(e))
            })?;

        let previous = self.store.replace(Arc::new(repo)).await;
        metrics::counter!("storage_connection_changes_total").increment(1);

        // 旧连接在后台关闭，进行中的请求不受影响
        tokio::spawn(async move {
            previous.shutdown().await;
        });

        tracing::info!(uri = %target.redacted_uri(), "MongoDB connection updated");
        Ok(())
    }
}

fn connection_failure_reason(error: AppError) -> String {
    match error {
        AppError::Database(e) => e.to_string(),
        other => other.user_message(),
    }
}

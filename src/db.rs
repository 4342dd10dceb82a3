//! 存储连接管理
//! 提供 MongoDB 客户端选项、可热切换的患者存储和健康检查

use crate::{
    config::{DatabaseConfig, StorageBackend},
    error::AppError,
    models::ConnectionDetails,
    repository::{InMemoryPatientRepository, MongoPatientRepository, PatientRepository},
};
use mongodb::options::{ClientOptions, Credential, ServerAddress};
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// 一次 MongoDB 连接的目标
#[derive(Debug, Clone)]
pub struct ConnectionTarget {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<Secret<String>>,
    pub database: String,
}

impl ConnectionTarget {
    /// 仅当用户名和密码同时存在时才使用认证
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// 用于日志的连接串，密码以 *** 代替
    pub fn redacted_uri(&self) -> String {
        match (&self.username, self.has_credentials()) {
            (Some(username), true) => format!(
                "mongodb://{}:***@{}:{}/{}",
                username, self.host, self.port, self.database
            ),
            _ => format!("mongodb://{}:{}/{}", self.host, self.port, self.database),
        }
    }
}

impl From<&DatabaseConfig> for ConnectionTarget {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
            password: config.password.clone(),
            database: config.name.clone(),
        }
    }
}

impl TryFrom<ConnectionDetails> for ConnectionTarget {
    type Error = AppError;

    fn try_from(details: ConnectionDetails) -> Result<Self, Self::Error> {
        let port = u16::try_from(details.port)
            .ok()
            .filter(|port| *port > 0)
            .ok_or_else(|| AppError::bad_request(format!("Invalid port: {}", details.port)))?;

        Ok(Self {
            host: details.host,
            port,
            username: details.username,
            password: details.password,
            database: details.database,
        })
    }
}

/// 构建 MongoDB 客户端选项
pub fn client_options(target: &ConnectionTarget, settings: &DatabaseConfig) -> ClientOptions {
    let mut options = ClientOptions::default();
    options.hosts = vec![ServerAddress::Tcp {
        host: target.host.clone(),
        port: Some(target.port),
    }];
    options.app_name = Some(settings.app_name.clone());
    options.connect_timeout = Some(Duration::from_secs(settings.connect_timeout_secs));
    options.server_selection_timeout =
        Some(Duration::from_secs(settings.server_selection_timeout_secs));
    options.max_pool_size = Some(settings.max_pool_size);
    options.min_pool_size = Some(settings.min_pool_size);

    if let (Some(username), Some(password)) = (&target.username, &target.password) {
        let mut credential = Credential::default();
        credential.username = Some(username.clone());
        credential.password = Some(password.expose_secret().clone());
        options.credential = Some(credential);
    }

    options
}

/// 按配置创建存储后端
pub async fn connect_repository(
    config: &DatabaseConfig,
) -> Result<Arc<dyn PatientRepository>, AppError> {
    match config.backend {
        StorageBackend::Mongodb => {
            let target = ConnectionTarget::from(config);
            let repo = MongoPatientRepository::connect(&target, config).await?;
            Ok(Arc::new(repo))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory patient store, data will not survive a restart");
            Ok(Arc::new(InMemoryPatientRepository::new()))
        }
    }
}

/// 可热切换的患者存储
///
/// 请求开始时通过 `current()` 取得仓库句柄，切换后进行中的请求
/// 继续使用旧句柄直至完成。
pub struct PatientStore {
    active: RwLock<Arc<dyn PatientRepository>>,
}

impl PatientStore {
    pub fn new(repo: Arc<dyn PatientRepository>) -> Self {
        Self {
            active: RwLock::new(repo),
        }
    }

    /// 当前使用的仓库
    pub async fn current(&self) -> Arc<dyn PatientRepository> {
        self.active.read().await.clone()
    }

    /// 替换仓库，返回被替换的旧仓库
    pub async fn replace(&self, repo: Arc<dyn PatientRepository>) -> Arc<dyn PatientRepository> {
        let mut active = self.active.write().await;
        std::mem::replace(&mut *active, repo)
    }
}

/// 存储健康检查
pub async fn health_check(store: &PatientStore) -> HealthStatus {
    let repo = store.current().await;
    match repo.ping().await {
        Ok(()) => {
            tracing::debug!(backend = repo.backend(), "Storage health check: OK");
            HealthStatus::Healthy
        }
        Err(e) => {
            tracing::warn!(backend = repo.backend(), "Storage health check failed: {}", e);
            HealthStatus::Unhealthy(e.to_string())
        }
    }
}

/// 健康状态
#[derive(Debug, Clone)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

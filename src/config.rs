//! 配置系统
//! 从环境变量加载所有配置，使用 Secret 包装敏感信息

use config::{Config, ConfigError, Environment};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址，例如 "0.0.0.0:8000"
    pub addr: String,
    /// 优雅关闭超时时间（秒）
    pub graceful_shutdown_timeout_secs: u64,
    /// 请求体大小上限（字节）
    pub max_body_bytes: usize,
}

/// 存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// MongoDB 服务器
    Mongodb,
    /// 进程内存储，仅用于开发与测试
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Mongodb => "mongodb",
            StorageBackend::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    pub host: String,
    pub port: u16,
    /// 由 `db.createUser` 创建的数据库用户
    pub username: Option<String>,
    /// 数据库密码（使用 Secret 包装，防止日志泄露）
    pub password: Option<Secret<String>>,
    /// 数据库名
    pub name: String,
    /// 患者集合名
    pub collection: String,
    /// 上报给 mongod 的客户端名称
    pub app_name: String,
    /// 建立连接超时时间（秒）
    pub connect_timeout_secs: u64,
    /// 服务器选择超时时间（秒）
    pub server_selection_timeout_secs: u64,
    /// 最大连接数
    pub max_pool_size: u32,
    /// 最小连接数
    pub min_pool_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// 管理员用户名
    pub admin_username: String,
    /// 管理员密码（使用 Secret 包装，防止日志泄露）
    pub admin_password: Secret<String>,
    /// Argon2 内存开销（KiB）
    pub hash_memory_kib: u32,
    /// Argon2 迭代次数
    pub hash_iterations: u32,
    /// Argon2 并行度
    pub hash_parallelism: u32,
    /// 是否信任 X-Forwarded-For / X-Real-IP 头（仅在反向代理之后开启）
    pub trust_proxy: bool,
    /// IP 白名单（可选），环境变量中以逗号分隔
    pub allowed_ips: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 添加默认配置
        settings = settings
            .set_default("server.addr", "0.0.0.0:8000")?
            .set_default("server.graceful_shutdown_timeout_secs", 30)?
            .set_default("server.max_body_bytes", 1024 * 1024)?
            .set_default("database.backend", "mongodb")?
            .set_default("database.host", "localhost")?
            .set_default("database.port", 27017)?
            .set_default("database.name", "ehr_database")?
            .set_default("database.collection", "patients")?
            .set_default("database.app_name", "ehr-service")?
            .set_default("database.connect_timeout_secs", 10)?
            .set_default("database.server_selection_timeout_secs", 30)?
            .set_default("database.max_pool_size", 10)?
            .set_default("database.min_pool_size", 0)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("security.admin_username", "admin")?
            .set_default("security.hash_memory_kib", 19456)?
            .set_default("security.hash_iterations", 2)?
            .set_default("security.hash_parallelism", 1)?
            .set_default("security.trust_proxy", false)?;

        // 从环境变量加载配置（前缀为 EHR_）
        settings = settings.add_source(
            Environment::with_prefix("EHR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("security.allowed_ips"),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 验证端口范围
        if let Some(port_str) = self.server.addr.split(':').next_back() {
            if let Ok(port) = port_str.parse::<u16>() {
                if port != 0 && port < 1024 {
                    return Err(ConfigError::Message("Server port should be >= 1024".to_string()));
                }
            }
        }

        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        // 验证日志格式
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        // 验证数据库配置
        if self.database.port == 0 {
            return Err(ConfigError::Message("database.port must be > 0".to_string()));
        }

        if self.database.name.trim().is_empty() || self.database.collection.trim().is_empty() {
            return Err(ConfigError::Message(
                "database.name and database.collection must not be empty".to_string(),
            ));
        }

        if self.database.max_pool_size == 0
            || self.database.max_pool_size < self.database.min_pool_size
        {
            return Err(ConfigError::Message(
                "max_pool_size must be > 0 and >= min_pool_size".to_string(),
            ));
        }

        // 验证管理员密码长度（至少 12 字符）
        if self.security.admin_password.expose_secret().len() < 12 {
            return Err(ConfigError::Message(
                "Admin password must be at least 12 characters long".to_string(),
            ));
        }

        if self.security.admin_username.trim().is_empty() {
            return Err(ConfigError::Message("Admin username must not be empty".to_string()));
        }

        Ok(())
    }
}

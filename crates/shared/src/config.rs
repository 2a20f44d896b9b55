//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::error::{Result, SharedError};

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 连接串；未配置时健康检查返回 400，统计接口走 Mock 快照
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    /// Mock 模式：不连接真实数据库，使用内存存储与固定统计快照
    pub use_mock: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            min_connections: 0,
            connect_timeout_seconds: 5,
            idle_timeout_seconds: 600,
            use_mock: false,
        }
    }
}

impl DatabaseConfig {
    /// 返回已配置的连接串，空字符串视为未配置
    pub fn require_url(&self) -> Result<&str> {
        match self.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(SharedError::NotConfigured("DATABASE_URL")),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.require_url().is_ok()
    }
}

/// Web Push 配置（VAPID 密钥对）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    pub vapid_public_key: Option<String>,
    pub vapid_private_key: Option<String>,
    /// 联系方式，如 mailto:ops@example.com
    pub vapid_subject: Option<String>,
}

/// 服务配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 允许的跨域来源，逗号分隔，"*" 表示全部
    pub cors_origins: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: "http://localhost:3000".to_string(),
        }
    }
}

/// 可观测性配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// 服务名称，用于标识追踪和指标的来源
    pub service_name: String,
    pub log_level: String,
    /// 是否启用 JSON 格式日志
    pub json_logs: bool,
    pub metrics_enabled: bool,
    pub metrics_port: u16,
    /// OpenTelemetry OTLP 端点，为空时不导出分布式追踪
    pub otlp_endpoint: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown-service".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_port: 9090,
            otlp_endpoint: None,
        }
    }
}

impl ObservabilityConfig {
    /// 注入服务名
    pub fn with_service_name(mut self, service_name: &str) -> Self {
        self.service_name = service_name.to_string();
        self
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub push: PushConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. config/{service_name}.toml（服务特定配置）
    /// 4. 环境变量（BACKOFFICE_ 前缀，双下划线分隔层级，如 BACKOFFICE_DATABASE__URL -> database.url）
    /// 5. 通用环境变量（DATABASE_URL、VAPID_PUBLIC_KEY 等）
    pub fn load(service_name: &str) -> std::result::Result<Self, ConfigError> {
        // .env 文件不存在是正常情况
        let _ = dotenvy::dotenv();

        let env = std::env::var("BACKOFFICE_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env.clone())?
            .add_source(File::from(Path::new(&config_dir).join("default.toml")).required(false))
            .add_source(
                File::from(Path::new(&config_dir).join(format!("{}.toml", env))).required(false),
            )
            .add_source(
                File::from(Path::new(&config_dir).join(format!("{}.toml", service_name)))
                    .required(false),
            )
            .add_source(
                Environment::with_prefix("BACKOFFICE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;
        config.apply_well_known_env(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// 应用不带前缀的通用环境变量
    ///
    /// 部署平台通常直接注入 DATABASE_URL 与 VAPID_* 变量，这里优先级最高。
    pub fn apply_well_known_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(key) = non_empty("VAPID_PUBLIC_KEY") {
            self.push.vapid_public_key = Some(key);
        }
        if let Some(key) = non_empty("VAPID_PRIVATE_KEY") {
            self.push.vapid_private_key = Some(key);
        }
        if let Some(subject) = non_empty("VAPID_SUBJECT") {
            self.push.vapid_subject = Some(subject);
        }
        if let Some(port) = non_empty("PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
    }

    /// 获取服务地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.max_connections, 10);
        assert!(config.database.url.is_none());
        assert!(!config.database.use_mock);
    }

    #[test]
    fn test_server_addr() {
        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(config.server_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_require_url_rejects_blank() {
        let mut db = DatabaseConfig::default();
        assert!(db.require_url().unwrap_err().is_not_configured());

        db.url = Some("   ".to_string());
        assert!(!db.is_configured());

        db.url = Some("postgres://localhost/backoffice".to_string());
        assert_eq!(db.require_url().unwrap(), "postgres://localhost/backoffice");
    }

    #[test]
    fn test_well_known_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_URL", "postgres://env/db"),
            ("VAPID_PUBLIC_KEY", "pub-key"),
            ("VAPID_PRIVATE_KEY", ""),
            ("PORT", "9000"),
        ]);

        let mut config = AppConfig::default();
        config.apply_well_known_env(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.url.as_deref(), Some("postgres://env/db"));
        assert_eq!(config.push.vapid_public_key.as_deref(), Some("pub-key"));
        // 空值不覆盖
        assert!(config.push.vapid_private_key.is_none());
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_observability_service_name() {
        let obs = ObservabilityConfig::default().with_service_name("backoffice-admin-service");
        assert_eq!(obs.service_name, "backoffice-admin-service");
        assert_eq!(obs.log_level, "info");
    }
}

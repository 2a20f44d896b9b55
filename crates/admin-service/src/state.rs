//! 应用状态定义
//!
//! 包含 Axum 路由共享的应用状态

use std::sync::Arc;

use backoffice_shared::config::AppConfig;
use backoffice_shared::database::Database;
use tracing::{info, warn};

use crate::error::{AdminError, Result};
use crate::repository::{MemoryStore, Repositories};

/// Axum 应用共享状态
///
/// 未配置数据库且不在 Mock 模式时 `repos` 为空，
/// 依赖数据库的接口返回 400 NOT_CONFIGURED。
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    repos: Option<Repositories>,
    /// PostgreSQL 连接池句柄，仅用于关闭
    database: Option<Database>,
    /// Mock 模式标记，对应 `database.use_mock`
    pub using_mock: bool,
}

impl AppState {
    pub fn new(config: AppConfig, repos: Option<Repositories>) -> Self {
        let using_mock = config.database.use_mock;
        Self {
            config: Arc::new(config),
            repos,
            database: None,
            using_mock,
        }
    }

    /// 按配置选择存储实现
    ///
    /// - `use_mock = true`：内存存储
    /// - 配置了 `DATABASE_URL`：PostgreSQL（惰性连接）
    /// - 其余情况：无存储
    pub fn from_config(config: AppConfig) -> Result<Self> {
        if config.database.use_mock {
            info!("Mock mode enabled, using in-memory store");
            let repos = Repositories::in_memory(Arc::new(MemoryStore::new()));
            return Ok(Self::new(config, Some(repos)));
        }

        if !config.database.is_configured() {
            warn!("DATABASE_URL is not set, database endpoints will report NOT_CONFIGURED");
            return Ok(Self::new(config, None));
        }

        let db = Database::connect_lazy(&config.database)?;
        let mut state = Self::new(config, Some(Repositories::postgres(db.clone())));
        state.database = Some(db);
        Ok(state)
    }

    /// 关闭数据库连接池（优雅关闭时调用）
    pub async fn close(&self) {
        if let Some(db) = &self.database {
            db.close().await;
        }
    }

    /// 获取仓储，未配置时返回 400
    pub fn repos(&self) -> Result<&Repositories> {
        self.repos
            .as_ref()
            .ok_or(AdminError::NotConfigured("DATABASE_URL"))
    }

    pub fn repositories(&self) -> Option<&Repositories> {
        self.repos.as_ref()
    }
}

//! 数据库连接管理模块
//!
//! 提供 PostgreSQL 连接池管理、连通性探测和迁移执行。
//!
//! 连接池以惰性方式创建：服务启动时数据库不可用不会阻止进程启动，
//! 连接失败会在每次请求的探测结果中体现。

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, instrument, warn};

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::observability::metrics;

/// 嵌入的迁移脚本（仓库根目录 migrations/）
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// 单次探测结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    /// 数据库服务端时间（SELECT NOW()）
    pub server_time: DateTime<Utc>,
    pub latency_ms: u64,
}

/// 显式获取连接后的连通性测试结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionReport {
    pub server_time: DateTime<Utc>,
    pub version: String,
    pub latency_ms: u64,
}

/// 已应用的迁移记录
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AppliedMigration {
    pub version: i64,
    pub description: String,
    pub installed_on: DateTime<Utc>,
}

/// 数据库连接池包装
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 创建数据库连接池（惰性连接）
    ///
    /// 仅校验连接串格式，首个查询时才真正建立连接。
    #[instrument(skip(config))]
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self> {
        let url = config.require_url()?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect_lazy(url)?;

        info!(
            max_connections = config.max_connections,
            "Database connection pool created (lazy)"
        );

        Ok(Self { pool })
    }

    /// 获取连接池引用
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 执行一次 SELECT NOW() 往返
    pub async fn probe(&self) -> Result<ProbeReport> {
        let start = Instant::now();
        let result = sqlx::query_scalar::<_, DateTime<Utc>>("SELECT NOW()")
            .fetch_one(&self.pool)
            .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(server_time) => {
                metrics::record_db_probe("ok", latency_ms);
                Ok(ProbeReport {
                    server_time,
                    latency_ms,
                })
            }
            Err(e) => {
                metrics::record_db_probe("fail", latency_ms);
                warn!(error = %e, latency_ms, "Database probe failed");
                Err(e.into())
            }
        }
    }

    /// 显式从连接池获取一个连接执行测试查询，完成后归还
    #[instrument(skip(self))]
    pub async fn test_connection(&self) -> Result<ConnectionReport> {
        let start = Instant::now();
        let mut conn = self.pool.acquire().await?;

        let server_time = sqlx::query_scalar::<_, DateTime<Utc>>("SELECT NOW()")
            .fetch_one(&mut *conn)
            .await?;
        let version = sqlx::query_scalar::<_, String>("SELECT version()")
            .fetch_one(&mut *conn)
            .await?;

        // 显式归还连接
        drop(conn);

        Ok(ConnectionReport {
            server_time,
            version,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// 执行待应用的迁移，返回全部已应用记录
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<Vec<AppliedMigration>> {
        info!("Running database migrations...");
        MIGRATOR.run(&self.pool).await?;

        let applied = sqlx::query_as::<_, AppliedMigration>(
            r#"
            SELECT version, description, installed_on
            FROM _sqlx_migrations
            WHERE success = true
            ORDER BY version
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        info!(count = applied.len(), "Database migrations applied");
        Ok(applied)
    }

    /// 关闭连接池，等待已借出的连接归还
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}

//! 数据库管理 API 处理器
//!
//! 迁移、种子数据、结构自省与统计

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::{info, warn};

use crate::{
    dto::{ApiResponse, MigrationResultDto, StatsResponse, TableCountDto},
    error::AdminError,
    fallback::{self, DataSource, FallbackReason},
    models::{ColumnInfo, DatabaseStats, SeedReport, TableInfo},
    state::AppState,
};

/// 执行数据库迁移
///
/// POST /api/database/init
pub async fn init_database(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<MigrationResultDto>>, AdminError> {
    let repos = state.repos()?;
    let applied = repos.admin.run_migrations().await?;

    info!(count = applied.len(), "Database initialized");
    Ok(Json(ApiResponse::success_with_message(
        MigrationResultDto { applied },
        "数据库初始化完成",
    )))
}

/// 写入演示数据
///
/// POST /api/database/seed
pub async fn seed_database(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SeedReport>>, AdminError> {
    let repos = state.repos()?;
    let report = repos.admin.seed().await?;

    let message = if report.skipped {
        "已有数据，跳过写入"
    } else {
        "演示数据写入完成"
    };
    Ok(Json(ApiResponse::success_with_message(report, message)))
}

/// 获取数据表列表
///
/// GET /api/database/tables
pub async fn list_tables(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TableInfo>>>, AdminError> {
    let repos = state.repos()?;
    let tables = repos.admin.list_tables().await?;
    Ok(Json(ApiResponse::success(tables)))
}

/// 获取表的列定义
///
/// GET /api/database/tables/{name}/columns
pub async fn table_columns(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<Vec<ColumnInfo>>>, AdminError> {
    let repos = state.repos()?;
    let columns = repos.admin.table_columns(&name).await?;

    if columns.is_empty() {
        return Err(AdminError::TableNotFound(name));
    }
    Ok(Json(ApiResponse::success(columns)))
}

/// 获取表的精确行数
///
/// GET /api/database/tables/{name}/count
pub async fn table_count(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<TableCountDto>>, AdminError> {
    let repos = state.repos()?;
    let row_count = repos
        .admin
        .count_rows(&name)
        .await?
        .ok_or_else(|| AdminError::TableNotFound(name.clone()))?;

    Ok(Json(ApiResponse::success(TableCountDto {
        table_name: name,
        row_count,
    })))
}

/// 数据库统计
///
/// GET /api/database/stats
///
/// 数据库不可用时返回固定快照，`usingMock` 为 true。
pub async fn database_stats(
    State(state): State<AppState>,
) -> Json<ApiResponse<StatsResponse<DatabaseStats>>> {
    const ENDPOINT: &str = "database_stats";

    let reason = match fallback::resolve(&state).await {
        DataSource::Live(repos) => match repos.admin.database_stats().await {
            Ok(stats) => {
                return Json(ApiResponse::success(StatsResponse {
                    using_mock: false,
                    fallback_reason: None,
                    stats,
                }));
            }
            Err(e) => {
                warn!(error = %e, "Database stats query failed");
                FallbackReason::QueryFailed
            }
        },
        DataSource::Mock(reason) => reason,
    };

    fallback::record(ENDPOINT, reason);
    Json(ApiResponse::success_with_message(
        StatsResponse {
            using_mock: true,
            fallback_reason: Some(reason),
            stats: fallback::mock_database_stats(),
        },
        "数据库不可用，返回模拟数据",
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use backoffice_shared::config::AppConfig;
    use backoffice_shared::database::ProbeReport;
    use chrono::Utc;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::repository::{MemoryStore, MockDatabaseAdminTrait, Repositories};
    use crate::routes;
    use crate::state::AppState;

    use super::*;

    fn state_with_admin(admin: MockDatabaseAdminTrait) -> AppState {
        let repos =
            Repositories::in_memory(Arc::new(MemoryStore::new())).with_admin(Arc::new(admin));
        AppState::new(AppConfig::default(), Some(repos))
    }

    async fn get_json(state: AppState, uri: &str) -> (StatusCode, Value) {
        let response = routes::app(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_stats_probe_failure_serves_snapshot_without_querying() {
        let mut admin = MockDatabaseAdminTrait::new();
        admin
            .expect_probe()
            .times(1)
            .returning(|| Err(AdminError::ConnectionFailed("connection refused".into())));
        admin.expect_database_stats().times(0);

        let (status, body) = get_json(state_with_admin(admin), "/api/database/stats").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["usingMock"], true);
        assert_eq!(body["data"]["fallbackReason"], "PROBE_FAILED");
        assert_eq!(
            body["data"]["stats"]["members"],
            fallback::mock_database_stats().members
        );
    }

    #[tokio::test]
    async fn test_stats_live_when_probe_succeeds() {
        let mut admin = MockDatabaseAdminTrait::new();
        admin.expect_probe().returning(|| {
            Ok(ProbeReport {
                server_time: Utc::now(),
                latency_ms: 2,
            })
        });
        admin.expect_database_stats().times(1).returning(|| {
            Ok(DatabaseStats {
                members: 7,
                ..Default::default()
            })
        });

        let (status, body) = get_json(state_with_admin(admin), "/api/database/stats").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["usingMock"], false);
        assert!(body["data"].get("fallbackReason").is_none());
        assert_eq!(body["data"]["stats"]["members"], 7);
    }

    #[tokio::test]
    async fn test_stats_query_failure_falls_back() {
        let mut admin = MockDatabaseAdminTrait::new();
        admin.expect_probe().returning(|| {
            Ok(ProbeReport {
                server_time: Utc::now(),
                latency_ms: 1,
            })
        });
        admin
            .expect_database_stats()
            .returning(|| Err(AdminError::Database(sqlx::Error::PoolTimedOut)));

        let (_, body) = get_json(state_with_admin(admin), "/api/database/stats").await;

        assert_eq!(body["data"]["usingMock"], true);
        assert_eq!(body["data"]["fallbackReason"], "QUERY_FAILED");
    }

    #[tokio::test]
    async fn test_db_status_reports_probe_error() {
        let mut admin = MockDatabaseAdminTrait::new();
        admin
            .expect_probe()
            .returning(|| Err(AdminError::ConnectionFailed("password authentication failed".into())));

        let (status, body) = get_json(state_with_admin(admin), "/api/db-status").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "CONNECTION_FAILED");
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .contains("password authentication failed")
        );
    }

    #[tokio::test]
    async fn test_unknown_table_is_not_found() {
        let mut admin = MockDatabaseAdminTrait::new();
        admin.expect_count_rows().returning(|_| Ok(None));
        admin.expect_table_columns().returning(|_| Ok(Vec::new()));

        let state = state_with_admin(admin);
        let (status, body) = get_json(state.clone(), "/api/database/tables/secrets/count").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "TABLE_NOT_FOUND");

        let (status, _) = get_json(state, "/api/database/tables/secrets/columns").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

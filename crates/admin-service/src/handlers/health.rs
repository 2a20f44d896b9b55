//! 连接健康检查 API 处理器
//!
//! 探测失败时返回 500 并带上数据库错误文本，这是这两个接口存在的意义。

use axum::{Json, extract::State};
use tracing::info;

use crate::{
    dto::{ApiResponse, ConnectionTestDto, DbStatusDto},
    error::AdminError,
    state::AppState,
};

/// 数据库连接状态
///
/// GET /api/db-status
pub async fn db_status(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DbStatusDto>>, AdminError> {
    if state.using_mock {
        let dto = DbStatusDto {
            status: "mock",
            using_mock: true,
            server_time: None,
            latency_ms: None,
        };
        return Ok(Json(ApiResponse::success_with_message(
            dto,
            "Mock 模式运行中",
        )));
    }

    let repos = state.repos()?;
    let report = repos.admin.probe().await?;

    let dto = DbStatusDto {
        status: "connected",
        using_mock: false,
        server_time: Some(report.server_time),
        latency_ms: Some(report.latency_ms),
    };
    Ok(Json(ApiResponse::success_with_message(dto, "数据库连接正常")))
}

/// 显式获取连接执行测试查询
///
/// GET /api/database/test
pub async fn test_connection(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ConnectionTestDto>>, AdminError> {
    let repos = state.repos()?;
    let report = repos.admin.test_connection().await?;

    info!(latency_ms = report.latency_ms, "Database connection test passed");
    Ok(Json(ApiResponse::success_with_message(
        report,
        "数据库连接测试成功",
    )))
}

/// 存活探针：服务进程正常即返回 ok
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": state.config.service_name,
    }))
}

/// 就绪探针：检查数据库连接是否可用
pub async fn readiness_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let database = match state.repositories() {
        Some(repos) if repos.admin.probe().await.is_ok() => "ok",
        Some(_) => "fail",
        None => "not_configured",
    };

    Json(serde_json::json!({
        "status": if database == "ok" { "ok" } else { "degraded" },
        "service": state.config.service_name,
        "usingMock": state.using_mock,
        "checks": {
            "database": database,
        }
    }))
}

//! 看板统计 API 处理器

use axum::{Json, extract::State};
use tracing::warn;

use crate::{
    dto::{ApiResponse, StatsResponse},
    fallback::{self, DataSource, FallbackReason},
    models::StatsOverview,
    state::AppState,
};

/// 获取看板总览
///
/// GET /api/stats/overview
pub async fn get_overview(
    State(state): State<AppState>,
) -> Json<ApiResponse<StatsResponse<StatsOverview>>> {
    const ENDPOINT: &str = "stats_overview";

    let reason = match fallback::resolve(&state).await {
        DataSource::Live(repos) => match repos.admin.overview_stats().await {
            Ok(stats) => {
                return Json(ApiResponse::success(StatsResponse {
                    using_mock: false,
                    fallback_reason: None,
                    stats,
                }));
            }
            Err(e) => {
                warn!(error = %e, "Overview stats query failed");
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
            stats: fallback::mock_overview(),
        },
        "数据库不可用，返回模拟数据",
    ))
}

//! Mock 降级判定
//!
//! 每次请求重新判定：Mock 模式，或数据库未配置，或探测失败时，
//! 统计接口返回固定快照而不是报错。

use backoffice_shared::observability::metrics;
use serde::Serialize;
use tracing::warn;

use crate::models::{DatabaseStats, StatsOverview};
use crate::repository::Repositories;
use crate::state::AppState;

/// 使用 Mock 数据的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FallbackReason {
    /// 服务运行在 Mock 模式
    MockMode,
    /// 未配置 DATABASE_URL
    NotConfigured,
    /// 连接探测失败
    ProbeFailed,
    /// 探测成功但统计查询失败
    QueryFailed,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MockMode => "mock_mode",
            Self::NotConfigured => "not_configured",
            Self::ProbeFailed => "probe_failed",
            Self::QueryFailed => "query_failed",
        }
    }
}

/// 本次请求的数据来源
pub enum DataSource<'a> {
    Live(&'a Repositories),
    Mock(FallbackReason),
}

/// 判定数据来源
pub async fn resolve(state: &AppState) -> DataSource<'_> {
    if state.using_mock {
        return DataSource::Mock(FallbackReason::MockMode);
    }

    let Some(repos) = state.repositories() else {
        return DataSource::Mock(FallbackReason::NotConfigured);
    };

    match repos.admin.probe().await {
        Ok(_) => DataSource::Live(repos),
        Err(e) => {
            warn!(error = %e, "Database probe failed, serving mock statistics");
            DataSource::Mock(FallbackReason::ProbeFailed)
        }
    }
}

/// 记录一次降级
pub fn record(endpoint: &str, reason: FallbackReason) {
    metrics::record_mock_fallback(endpoint, reason.as_str());
}

/// 固定的数据库统计快照
pub fn mock_database_stats() -> DatabaseStats {
    DatabaseStats {
        users: 3,
        posts: 5,
        products: 8,
        members: 128,
        active_members: 117,
        transactions: 1024,
        total_buy_in: 256_000.0,
        total_cash_out: 231_500.0,
        redemption_rules: 4,
        settlements: 36,
    }
}

/// 固定的看板总览快照
pub fn mock_overview() -> StatsOverview {
    StatsOverview {
        total_members: 128,
        active_members: 117,
        today_transactions: 42,
        today_buy_in: 12_800.0,
        today_cash_out: 11_350.0,
        outstanding_points: 56_400,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshots_are_constant() {
        assert_eq!(mock_database_stats(), mock_database_stats());
        assert_eq!(mock_overview(), mock_overview());
        assert!(mock_database_stats().active_members <= mock_database_stats().members);
    }

    #[test]
    fn test_reason_serialization() {
        assert_eq!(
            serde_json::to_string(&FallbackReason::ProbeFailed).unwrap(),
            "\"PROBE_FAILED\""
        );
        assert_eq!(FallbackReason::MockMode.as_str(), "mock_mode");
    }
}

//! 统计数据结构

use serde::Serialize;

/// 数据库全量统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStats {
    pub users: i64,
    pub posts: i64,
    pub products: i64,
    pub members: i64,
    pub active_members: i64,
    pub transactions: i64,
    pub total_buy_in: f64,
    pub total_cash_out: f64,
    pub redemption_rules: i64,
    pub settlements: i64,
}

/// 看板总览
#[derive(Debug, Clone, Default, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StatsOverview {
    pub total_members: i64,
    pub active_members: i64,
    pub today_transactions: i64,
    pub today_buy_in: f64,
    pub today_cash_out: f64,
    /// 全体会员未使用积分合计
    pub outstanding_points: i64,
}

/// 种子数据写入结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    /// 已有数据时跳过
    pub skipped: bool,
    pub users: i64,
    pub products: i64,
    pub members: i64,
    pub transactions: i64,
    pub redemption_rules: i64,
    pub point_transactions: i64,
}

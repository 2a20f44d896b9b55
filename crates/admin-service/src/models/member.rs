//! 会员、交易记录与结算实体
//!
//! 交易记录即会员的买码/兑码流水，结算记录是对某一时间段流水的汇总快照。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{MemberStatus, TransactionType};

/// 会员
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: i64,
    /// 会员编号（唯一）
    pub member_no: String,
    pub name: String,
    #[sqlx(default)]
    pub phone: Option<String>,
    pub status: MemberStatus,
    #[sqlx(default)]
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMember {
    pub member_no: String,
    pub name: String,
    pub phone: Option<String>,
    pub remark: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub status: Option<MemberStatus>,
    pub remark: Option<String>,
}

/// 会员查询过滤
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberFilter {
    /// 匹配会员编号或姓名
    pub keyword: Option<String>,
    pub status: Option<MemberStatus>,
}

/// 交易记录（买码/兑码）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub member_id: i64,
    pub transaction_type: TransactionType,
    /// 金额
    pub amount: f64,
    /// 筹码数量
    pub chips: i64,
    #[sqlx(default)]
    pub remark: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub member_id: i64,
    pub transaction_type: TransactionType,
    pub amount: f64,
    pub chips: i64,
    pub remark: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// 交易查询过滤
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    pub member_id: Option<i64>,
    pub transaction_type: Option<TransactionType>,
}

/// 某会员在时间段内的交易汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, sqlx::FromRow)]
pub struct TransactionSummary {
    pub total_buy_in: f64,
    pub total_cash_out: f64,
    pub transaction_count: i64,
}

impl TransactionSummary {
    /// 净额 = 兑码 - 买码（会员视角的盈亏）
    pub fn net_amount(&self) -> f64 {
        self.total_cash_out - self.total_buy_in
    }
}

/// 结算记录
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub id: i64,
    pub member_id: i64,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub total_buy_in: f64,
    pub total_cash_out: f64,
    pub net_amount: f64,
    pub transaction_count: i64,
    #[sqlx(default)]
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSettlement {
    pub member_id: i64,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub summary: TransactionSummary,
    pub remark: Option<String>,
}

//! 积分兑换规则与积分流水
//!
//! 会员积分余额不单独存储，始终由积分流水求和得出。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::PointChangeType;

/// 积分兑换规则
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionRule {
    pub id: i64,
    pub name: String,
    #[sqlx(default)]
    pub description: Option<String>,
    /// 兑换所需积分
    pub points_required: i64,
    /// 兑换奖励描述
    pub reward: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRedemptionRule {
    pub name: String,
    pub description: Option<String>,
    pub points_required: i64,
    pub reward: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RedemptionRuleChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub points_required: Option<i64>,
    pub reward: Option<String>,
    pub enabled: Option<bool>,
}

/// 积分流水
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PointTransaction {
    pub id: i64,
    pub member_id: i64,
    #[sqlx(default)]
    pub rule_id: Option<i64>,
    pub change_type: PointChangeType,
    /// 变动积分，消耗为负数
    pub points: i64,
    #[sqlx(default)]
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPointTransaction {
    pub member_id: i64,
    pub rule_id: Option<i64>,
    pub change_type: PointChangeType,
    pub points: i64,
    pub remark: Option<String>,
}

/// 兑换结果
#[derive(Debug, Clone)]
pub enum RedeemOutcome {
    /// 兑换成功，附带扣减流水、扣减后余额以及事务内读取的规则
    Redeemed {
        record: PointTransaction,
        balance_after: i64,
        rule: RedemptionRule,
    },
    /// 余额不足
    InsufficientPoints { balance: i64, required: i64 },
    RuleNotFound,
    RuleDisabled,
}

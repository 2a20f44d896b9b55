//! Web Push 订阅

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 浏览器推送订阅
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    pub id: i64,
    /// 推送服务端点（唯一）
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPushSubscription {
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
}

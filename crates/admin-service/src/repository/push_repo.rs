//! 推送订阅仓储（PostgreSQL）

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::PushSubscriptionRepositoryTrait;
use crate::error::Result;
use crate::models::{NewPushSubscription, PushSubscription};

/// 推送订阅仓储
pub struct PushSubscriptionRepository {
    pool: PgPool,
}

impl PushSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PushSubscriptionRepositoryTrait for PushSubscriptionRepository {
    async fn list_subscriptions(&self) -> Result<Vec<PushSubscription>> {
        let subs = sqlx::query_as::<_, PushSubscription>(
            "SELECT id, endpoint, p256dh, auth, created_at FROM push_subscriptions ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(subs)
    }

    async fn upsert_subscription(&self, sub: &NewPushSubscription) -> Result<PushSubscription> {
        let saved = sqlx::query_as::<_, PushSubscription>(
            r#"
            INSERT INTO push_subscriptions (endpoint, p256dh, auth)
            VALUES ($1, $2, $3)
            ON CONFLICT (endpoint) DO UPDATE
            SET p256dh = EXCLUDED.p256dh,
                auth = EXCLUDED.auth
            RETURNING id, endpoint, p256dh, auth, created_at
            "#,
        )
        .bind(&sub.endpoint)
        .bind(&sub.p256dh)
        .bind(&sub.auth)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }

    async fn remove_subscription(&self, endpoint: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM push_subscriptions WHERE endpoint = $1")
            .bind(endpoint)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

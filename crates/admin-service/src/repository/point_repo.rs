//! 积分规则与积分流水仓储（PostgreSQL）

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{info, instrument};

use super::traits::PointRepositoryTrait;
use crate::error::Result;
use crate::models::{
    NewPointTransaction, NewRedemptionRule, PointChangeType, PointTransaction, RedeemOutcome,
    RedemptionRule, RedemptionRuleChanges,
};

const RULE_COLUMNS: &str =
    "id, name, description, points_required, reward, enabled, created_at, updated_at";
const POINT_COLUMNS: &str = "id, member_id, rule_id, change_type, points, remark, created_at";

/// 积分仓储
pub struct PointRepository {
    pool: PgPool,
}

impl PointRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn change_type_str(change_type: PointChangeType) -> &'static str {
    match change_type {
        PointChangeType::Earn => "earn",
        PointChangeType::Redeem => "redeem",
        PointChangeType::Adjust => "adjust",
    }
}

#[async_trait]
impl PointRepositoryTrait for PointRepository {
    async fn list_rules(&self) -> Result<Vec<RedemptionRule>> {
        let rules = sqlx::query_as::<_, RedemptionRule>(&format!(
            "SELECT {} FROM redemption_rules ORDER BY points_required, id",
            RULE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rules)
    }

    async fn create_rule(&self, rule: &NewRedemptionRule) -> Result<RedemptionRule> {
        let created = sqlx::query_as::<_, RedemptionRule>(&format!(
            r#"
            INSERT INTO redemption_rules (name, description, points_required, reward, enabled)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            RULE_COLUMNS
        ))
        .bind(&rule.name)
        .bind(&rule.description)
        .bind(rule.points_required)
        .bind(&rule.reward)
        .bind(rule.enabled)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update_rule(
        &self,
        id: i64,
        changes: &RedemptionRuleChanges,
    ) -> Result<Option<RedemptionRule>> {
        let updated = sqlx::query_as::<_, RedemptionRule>(&format!(
            r#"
            UPDATE redemption_rules
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                points_required = COALESCE($4, points_required),
                reward = COALESCE($5, reward),
                enabled = COALESCE($6, enabled),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            RULE_COLUMNS
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(changes.points_required)
        .bind(&changes.reward)
        .bind(changes.enabled)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn list_point_transactions(
        &self,
        member_id: Option<i64>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<PointTransaction>, i64)> {
        let total: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM point_transactions WHERE ($1::bigint IS NULL OR member_id = $1)",
        )
        .bind(member_id)
        .fetch_one(&self.pool)
        .await?;

        let records = sqlx::query_as::<_, PointTransaction>(&format!(
            r#"
            SELECT {}
            FROM point_transactions
            WHERE ($1::bigint IS NULL OR member_id = $1)
            ORDER BY id DESC
            LIMIT $2 OFFSET $3
            "#,
            POINT_COLUMNS
        ))
        .bind(member_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((records, total.0))
    }

    async fn create_point_transaction(
        &self,
        record: &NewPointTransaction,
    ) -> Result<PointTransaction> {
        let created = sqlx::query_as::<_, PointTransaction>(&format!(
            r#"
            INSERT INTO point_transactions (member_id, rule_id, change_type, points, remark)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            POINT_COLUMNS
        ))
        .bind(record.member_id)
        .bind(record.rule_id)
        .bind(change_type_str(record.change_type))
        .bind(record.points)
        .bind(&record.remark)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn balance(&self, member_id: i64) -> Result<i64> {
        let balance: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(points), 0)::bigint FROM point_transactions WHERE member_id = $1",
        )
        .bind(member_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(balance)
    }

    #[instrument(skip(self, remark))]
    async fn redeem(
        &self,
        member_id: i64,
        rule_id: i64,
        remark: Option<String>,
    ) -> Result<RedeemOutcome> {
        let mut tx = self.pool.begin().await?;

        // 锁定会员行，串行化同一会员的并发兑换
        sqlx::query("SELECT id FROM members WHERE id = $1 FOR UPDATE")
            .bind(member_id)
            .execute(&mut *tx)
            .await?;

        // 规则加共享锁，事务提交前不会被停用或改价
        let rule = sqlx::query_as::<_, RedemptionRule>(&format!(
            "SELECT {} FROM redemption_rules WHERE id = $1 FOR SHARE",
            RULE_COLUMNS
        ))
        .bind(rule_id)
        .fetch_optional(&mut *tx)
        .await?;

        let rule = match rule {
            Some(rule) if rule.enabled => rule,
            Some(_) => {
                tx.rollback().await?;
                return Ok(RedeemOutcome::RuleDisabled);
            }
            None => {
                tx.rollback().await?;
                return Ok(RedeemOutcome::RuleNotFound);
            }
        };

        let balance: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(points), 0)::bigint FROM point_transactions WHERE member_id = $1",
        )
        .bind(member_id)
        .fetch_one(&mut *tx)
        .await?;

        if balance < rule.points_required {
            tx.rollback().await?;
            return Ok(RedeemOutcome::InsufficientPoints {
                balance,
                required: rule.points_required,
            });
        }

        let record = sqlx::query_as::<_, PointTransaction>(&format!(
            r#"
            INSERT INTO point_transactions (member_id, rule_id, change_type, points, remark)
            VALUES ($1, $2, 'redeem', $3, $4)
            RETURNING {}
            "#,
            POINT_COLUMNS
        ))
        .bind(member_id)
        .bind(rule.id)
        .bind(-rule.points_required)
        .bind(&remark)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let balance_after = balance - rule.points_required;
        info!(member_id, balance_after, "Points redeemed");

        Ok(RedeemOutcome::Redeemed {
            record,
            balance_after,
            rule,
        })
    }
}

//! 会员、交易记录与结算仓储（PostgreSQL）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::traits::{MemberRepositoryTrait, SettlementRepositoryTrait, TransactionRepositoryTrait};
use super::user_repo::map_unique_violation;
use crate::error::{AdminError, Result};
use crate::models::{
    Member, MemberChanges, MemberFilter, NewMember, NewSettlement, NewTransaction, Settlement,
    Transaction, TransactionFilter, TransactionSummary,
};

const MEMBER_COLUMNS: &str = "id, member_no, name, phone, status, remark, created_at, updated_at";
const TRANSACTION_COLUMNS: &str =
    "id, member_id, transaction_type, amount, chips, remark, occurred_at, created_at";
const SETTLEMENT_COLUMNS: &str = "id, member_id, period_start, period_end, total_buy_in, \
     total_cash_out, net_amount, transaction_count, remark, created_at";

/// 会员仓储
pub struct MemberRepository {
    pool: PgPool,
}

/// 构造 ILIKE 包含匹配模式，关键字中的通配符按字面匹配
fn contains_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl MemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberRepositoryTrait for MemberRepository {
    async fn list_members(
        &self,
        filter: &MemberFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Member>, i64)> {
        let keyword = filter
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(contains_pattern);
        let status = filter.status.map(|s| s.as_str());

        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM members
            WHERE ($1::text IS NULL OR member_no ILIKE $1 ESCAPE '\' OR name ILIKE $1 ESCAPE '\')
              AND ($2::text IS NULL OR status = $2)
            "#,
        )
        .bind(&keyword)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let members = sqlx::query_as::<_, Member>(&format!(
            r#"
            SELECT {}
            FROM members
            WHERE ($1::text IS NULL OR member_no ILIKE $1 ESCAPE '\' OR name ILIKE $1 ESCAPE '\')
              AND ($2::text IS NULL OR status = $2)
            ORDER BY id DESC
            LIMIT $3 OFFSET $4
            "#,
            MEMBER_COLUMNS
        ))
        .bind(&keyword)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((members, total.0))
    }

    async fn get_member(&self, id: i64) -> Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {} FROM members WHERE id = $1",
            MEMBER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    async fn find_member_by_no(&self, member_no: &str) -> Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {} FROM members WHERE member_no = $1",
            MEMBER_COLUMNS
        ))
        .bind(member_no)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    async fn create_member(&self, member: &NewMember) -> Result<Member> {
        sqlx::query_as::<_, Member>(&format!(
            r#"
            INSERT INTO members (member_no, name, phone, remark)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            MEMBER_COLUMNS
        ))
        .bind(&member.member_no)
        .bind(&member.name)
        .bind(&member.phone)
        .bind(&member.remark)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, AdminError::MemberNoTaken(member.member_no.clone())))
    }

    async fn update_member(&self, id: i64, changes: &MemberChanges) -> Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(&format!(
            r#"
            UPDATE members
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                status = COALESCE($4, status),
                remark = COALESCE($5, remark),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            MEMBER_COLUMNS
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.phone)
        .bind(changes.status.map(|s| s.as_str()))
        .bind(&changes.remark)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }
}

/// 交易记录仓储
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepositoryTrait for TransactionRepository {
    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Transaction>, i64)> {
        let transaction_type = filter.transaction_type.map(|t| t.as_str());

        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM transactions
            WHERE ($1::bigint IS NULL OR member_id = $1)
              AND ($2::text IS NULL OR transaction_type = $2)
            "#,
        )
        .bind(filter.member_id)
        .bind(transaction_type)
        .fetch_one(&self.pool)
        .await?;

        let transactions = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            SELECT {}
            FROM transactions
            WHERE ($1::bigint IS NULL OR member_id = $1)
              AND ($2::text IS NULL OR transaction_type = $2)
            ORDER BY occurred_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(filter.member_id)
        .bind(transaction_type)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((transactions, total.0))
    }

    async fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {} FROM transactions WHERE id = $1",
            TRANSACTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    async fn create_transaction(&self, tx: &NewTransaction) -> Result<Transaction> {
        let created = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            INSERT INTO transactions (member_id, transaction_type, amount, chips, remark, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(tx.member_id)
        .bind(tx.transaction_type.as_str())
        .bind(tx.amount)
        .bind(tx.chips)
        .bind(&tx.remark)
        .bind(tx.occurred_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn summarize(
        &self,
        member_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<TransactionSummary> {
        let summary = sqlx::query_as::<_, TransactionSummary>(
            r#"
            SELECT
                COALESCE(SUM(amount) FILTER (WHERE transaction_type = 'buy_in'), 0)::float8 AS total_buy_in,
                COALESCE(SUM(amount) FILTER (WHERE transaction_type = 'cash_out'), 0)::float8 AS total_cash_out,
                COUNT(*) AS transaction_count
            FROM transactions
            WHERE member_id = $1
              AND occurred_at >= $2
              AND occurred_at <= $3
            "#,
        )
        .bind(member_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }
}

/// 结算记录仓储
pub struct SettlementRepository {
    pool: PgPool,
}

impl SettlementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettlementRepositoryTrait for SettlementRepository {
    async fn list_settlements(
        &self,
        member_id: Option<i64>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Settlement>, i64)> {
        let total: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM settlements WHERE ($1::bigint IS NULL OR member_id = $1)",
        )
        .bind(member_id)
        .fetch_one(&self.pool)
        .await?;

        let settlements = sqlx::query_as::<_, Settlement>(&format!(
            r#"
            SELECT {}
            FROM settlements
            WHERE ($1::bigint IS NULL OR member_id = $1)
            ORDER BY id DESC
            LIMIT $2 OFFSET $3
            "#,
            SETTLEMENT_COLUMNS
        ))
        .bind(member_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((settlements, total.0))
    }

    async fn get_settlement(&self, id: i64) -> Result<Option<Settlement>> {
        let settlement = sqlx::query_as::<_, Settlement>(&format!(
            "SELECT {} FROM settlements WHERE id = $1",
            SETTLEMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(settlement)
    }

    async fn create_settlement(&self, settlement: &NewSettlement) -> Result<Settlement> {
        let summary = &settlement.summary;

        let created = sqlx::query_as::<_, Settlement>(&format!(
            r#"
            INSERT INTO settlements (
                member_id, period_start, period_end,
                total_buy_in, total_cash_out, net_amount, transaction_count, remark
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            SETTLEMENT_COLUMNS
        ))
        .bind(settlement.member_id)
        .bind(settlement.period_start)
        .bind(settlement.period_end)
        .bind(summary.total_buy_in)
        .bind(summary.total_cash_out)
        .bind(summary.net_amount())
        .bind(summary.transaction_count)
        .bind(&settlement.remark)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("vip"), "%vip%");
        assert_eq!(contains_pattern("_"), "%\\_%");
        assert_eq!(contains_pattern("50%"), "%50\\%%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }
}

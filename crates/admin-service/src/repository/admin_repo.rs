//! 数据库管理仓储：探测、迁移、种子数据、结构自省与统计

use async_trait::async_trait;
use backoffice_shared::database::{AppliedMigration, ConnectionReport, Database, ProbeReport};
use tracing::instrument;

use super::seed::seed_postgres;
use super::traits::DatabaseAdminTrait;
use crate::error::{AdminError, Result};
use crate::models::{ColumnInfo, DatabaseStats, SeedReport, StatsOverview, TableInfo};

pub struct DatabaseAdmin {
    db: Database,
}

impl DatabaseAdmin {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

/// 为标识符加双引号，内部引号转义
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[async_trait]
impl DatabaseAdminTrait for DatabaseAdmin {
    async fn probe(&self) -> Result<ProbeReport> {
        self.db
            .probe()
            .await
            .map_err(|e| AdminError::ConnectionFailed(e.to_string()))
    }

    async fn test_connection(&self) -> Result<ConnectionReport> {
        self.db
            .test_connection()
            .await
            .map_err(|e| AdminError::ConnectionFailed(e.to_string()))
    }

    async fn run_migrations(&self) -> Result<Vec<AppliedMigration>> {
        Ok(self.db.run_migrations().await?)
    }

    #[instrument(skip(self))]
    async fn seed(&self) -> Result<SeedReport> {
        seed_postgres(self.db.pool()).await
    }

    async fn list_tables(&self) -> Result<Vec<TableInfo>> {
        let tables = sqlx::query_as::<_, TableInfo>(
            r#"
            SELECT c.relname::text AS table_name,
                   GREATEST(c.reltuples, 0)::bigint AS estimated_rows
            FROM pg_class c
            JOIN pg_namespace n ON n.oid = c.relnamespace
            WHERE n.nspname = 'public' AND c.relkind = 'r'
            ORDER BY c.relname
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(tables)
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let columns = sqlx::query_as::<_, ColumnInfo>(
            r#"
            SELECT column_name::text AS column_name,
                   data_type::text AS data_type,
                   (is_nullable = 'YES') AS is_nullable,
                   column_default::text AS column_default,
                   ordinal_position::int AS ordinal_position
            FROM information_schema.columns
            WHERE table_schema = 'public' AND table_name = $1
            ORDER BY ordinal_position
            "#,
        )
        .bind(table)
        .fetch_all(self.db.pool())
        .await?;

        Ok(columns)
    }

    async fn count_rows(&self, table: &str) -> Result<Option<i64>> {
        // 只对系统目录中存在的表拼接 SQL
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public'
                  AND table_type = 'BASE TABLE'
                  AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(self.db.pool())
        .await?;

        if !exists {
            return Ok(None);
        }

        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM public.{}",
            quote_ident(table)
        ))
        .fetch_one(self.db.pool())
        .await?;

        Ok(Some(count))
    }

    async fn database_stats(&self) -> Result<DatabaseStats> {
        let stats = sqlx::query_as::<_, DatabaseStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS users,
                (SELECT COUNT(*) FROM posts) AS posts,
                (SELECT COUNT(*) FROM products) AS products,
                (SELECT COUNT(*) FROM members) AS members,
                (SELECT COUNT(*) FROM members WHERE status = 'active') AS active_members,
                (SELECT COUNT(*) FROM transactions) AS transactions,
                (SELECT COALESCE(SUM(amount), 0)::float8 FROM transactions
                    WHERE transaction_type = 'buy_in') AS total_buy_in,
                (SELECT COALESCE(SUM(amount), 0)::float8 FROM transactions
                    WHERE transaction_type = 'cash_out') AS total_cash_out,
                (SELECT COUNT(*) FROM redemption_rules) AS redemption_rules,
                (SELECT COUNT(*) FROM settlements) AS settlements
            "#,
        )
        .fetch_one(self.db.pool())
        .await?;

        Ok(stats)
    }

    async fn overview_stats(&self) -> Result<StatsOverview> {
        let overview = sqlx::query_as::<_, StatsOverview>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM members) AS total_members,
                (SELECT COUNT(*) FROM members WHERE status = 'active') AS active_members,
                (SELECT COUNT(*) FROM transactions
                    WHERE occurred_at >= date_trunc('day', NOW())) AS today_transactions,
                (SELECT COALESCE(SUM(amount), 0)::float8 FROM transactions
                    WHERE transaction_type = 'buy_in'
                      AND occurred_at >= date_trunc('day', NOW())) AS today_buy_in,
                (SELECT COALESCE(SUM(amount), 0)::float8 FROM transactions
                    WHERE transaction_type = 'cash_out'
                      AND occurred_at >= date_trunc('day', NOW())) AS today_cash_out,
                (SELECT COALESCE(SUM(points), 0)::bigint FROM point_transactions) AS outstanding_points
            "#,
        )
        .fetch_one(self.db.pool())
        .await?;

        Ok(overview)
    }
}

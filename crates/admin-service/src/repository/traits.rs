//! 仓储 Trait 定义
//!
//! handler 依赖抽象而非具体实现：生产环境使用 PostgreSQL 实现，
//! Mock 模式与测试使用内存实现，失败路径测试使用 mockall 生成的 Mock。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use backoffice_shared::database::{AppliedMigration, ConnectionReport, ProbeReport};

use crate::error::Result;
use crate::models::{
    ColumnInfo, DatabaseStats, Member, MemberChanges, MemberFilter, NewMember,
    NewPointTransaction, NewPost, NewProduct, NewPushSubscription, NewRedemptionRule,
    NewSettlement, NewTransaction, NewUser, PointTransaction, Post, PostFilter, Product,
    ProductChanges, PushSubscription, RedeemOutcome, RedemptionRule, RedemptionRuleChanges,
    SeedReport, Settlement, StatsOverview, TableInfo, Transaction, TransactionFilter,
    TransactionSummary, User, UserChanges,
};

/// 用户仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    async fn list_users(&self, offset: i64, limit: i64) -> Result<(Vec<User>, i64)>;
    async fn get_user(&self, id: i64) -> Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn create_user(&self, user: &NewUser) -> Result<User>;
    async fn update_user(&self, id: i64, changes: &UserChanges) -> Result<Option<User>>;
}

/// 文章仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepositoryTrait: Send + Sync {
    async fn list_posts(
        &self,
        filter: &PostFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Post>, i64)>;
    async fn get_post(&self, id: i64) -> Result<Option<Post>>;
    async fn create_post(&self, post: &NewPost) -> Result<Post>;
}

/// 商品仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepositoryTrait: Send + Sync {
    async fn list_products(&self, offset: i64, limit: i64) -> Result<(Vec<Product>, i64)>;
    async fn get_product(&self, id: i64) -> Result<Option<Product>>;
    async fn create_product(&self, product: &NewProduct) -> Result<Product>;
    async fn update_product(&self, id: i64, changes: &ProductChanges) -> Result<Option<Product>>;
}

/// 会员仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemberRepositoryTrait: Send + Sync {
    async fn list_members(
        &self,
        filter: &MemberFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Member>, i64)>;
    async fn get_member(&self, id: i64) -> Result<Option<Member>>;
    async fn find_member_by_no(&self, member_no: &str) -> Result<Option<Member>>;
    async fn create_member(&self, member: &NewMember) -> Result<Member>;
    async fn update_member(&self, id: i64, changes: &MemberChanges) -> Result<Option<Member>>;
}

/// 交易记录仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Transaction>, i64)>;
    async fn get_transaction(&self, id: i64) -> Result<Option<Transaction>>;
    async fn create_transaction(&self, tx: &NewTransaction) -> Result<Transaction>;
    /// 汇总会员在 [start, end] 内的交易
    async fn summarize(
        &self,
        member_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<TransactionSummary>;
}

/// 结算记录仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettlementRepositoryTrait: Send + Sync {
    async fn list_settlements(
        &self,
        member_id: Option<i64>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Settlement>, i64)>;
    async fn get_settlement(&self, id: i64) -> Result<Option<Settlement>>;
    async fn create_settlement(&self, settlement: &NewSettlement) -> Result<Settlement>;
}

/// 积分仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PointRepositoryTrait: Send + Sync {
    // 兑换规则
    async fn list_rules(&self) -> Result<Vec<RedemptionRule>>;
    async fn create_rule(&self, rule: &NewRedemptionRule) -> Result<RedemptionRule>;
    async fn update_rule(
        &self,
        id: i64,
        changes: &RedemptionRuleChanges,
    ) -> Result<Option<RedemptionRule>>;

    // 积分流水
    async fn list_point_transactions(
        &self,
        member_id: Option<i64>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<PointTransaction>, i64)>;
    async fn create_point_transaction(&self, record: &NewPointTransaction)
    -> Result<PointTransaction>;
    async fn balance(&self, member_id: i64) -> Result<i64>;

    /// 读取规则、检查余额并扣减，全部在同一事务内完成
    async fn redeem(
        &self,
        member_id: i64,
        rule_id: i64,
        remark: Option<String>,
    ) -> Result<RedeemOutcome>;
}

/// 推送订阅仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushSubscriptionRepositoryTrait: Send + Sync {
    async fn list_subscriptions(&self) -> Result<Vec<PushSubscription>>;
    /// 按 endpoint 插入或更新密钥
    async fn upsert_subscription(&self, sub: &NewPushSubscription) -> Result<PushSubscription>;
    /// 返回是否删除了记录
    async fn remove_subscription(&self, endpoint: &str) -> Result<bool>;
}

/// 数据库管理接口：探测、迁移、种子数据、结构自省与统计
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatabaseAdminTrait: Send + Sync {
    async fn probe(&self) -> Result<ProbeReport>;
    async fn test_connection(&self) -> Result<ConnectionReport>;
    async fn run_migrations(&self) -> Result<Vec<AppliedMigration>>;
    async fn seed(&self) -> Result<SeedReport>;
    async fn list_tables(&self) -> Result<Vec<TableInfo>>;
    async fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>>;
    /// 表不存在时返回 None
    async fn count_rows(&self, table: &str) -> Result<Option<i64>>;
    async fn database_stats(&self) -> Result<DatabaseStats>;
    async fn overview_stats(&self) -> Result<StatsOverview>;
}

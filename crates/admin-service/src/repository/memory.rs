//! 内存存储
//!
//! Mock 模式（`database.use_mock = true`）下替代 PostgreSQL，同时供测试使用。
//! 所有数据放在一把读写锁后面，锁内不跨越 await。

use std::time::Instant;

use async_trait::async_trait;
use backoffice_shared::database::{AppliedMigration, ConnectionReport, ProbeReport};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

use super::seed::SeedDataset;
use super::traits::{
    DatabaseAdminTrait, MemberRepositoryTrait, PointRepositoryTrait, PostRepositoryTrait,
    ProductRepositoryTrait, PushSubscriptionRepositoryTrait, SettlementRepositoryTrait,
    TransactionRepositoryTrait, UserRepositoryTrait,
};
use crate::error::{AdminError, Result};
use crate::models::{
    ColumnInfo, DatabaseStats, Member, MemberChanges, MemberFilter, MemberStatus, NewMember,
    NewPointTransaction, NewPost, NewProduct, NewPushSubscription, NewRedemptionRule,
    NewSettlement, NewTransaction, NewUser, PointChangeType, PointTransaction, Post, PostFilter,
    Product, ProductChanges, PushSubscription, RedeemOutcome, RedemptionRule,
    RedemptionRuleChanges, SeedReport, Settlement, StatsOverview, TableInfo, Transaction,
    TransactionFilter, TransactionSummary, TransactionType, User, UserChanges,
};

/// 内存表结构（列名、类型、可空），与迁移脚本保持一致
const TABLE_SCHEMAS: &[(&str, &[(&str, &str, bool)])] = &[
    (
        "members",
        &[
            ("id", "bigint", false),
            ("member_no", "character varying", false),
            ("name", "character varying", false),
            ("phone", "character varying", true),
            ("status", "character varying", false),
            ("remark", "text", true),
            ("created_at", "timestamp with time zone", false),
            ("updated_at", "timestamp with time zone", false),
        ],
    ),
    (
        "point_transactions",
        &[
            ("id", "bigint", false),
            ("member_id", "bigint", false),
            ("rule_id", "bigint", true),
            ("change_type", "character varying", false),
            ("points", "bigint", false),
            ("remark", "text", true),
            ("created_at", "timestamp with time zone", false),
        ],
    ),
    (
        "posts",
        &[
            ("id", "bigint", false),
            ("title", "character varying", false),
            ("content", "text", true),
            ("published", "boolean", false),
            ("author_id", "bigint", false),
            ("created_at", "timestamp with time zone", false),
            ("updated_at", "timestamp with time zone", false),
        ],
    ),
    (
        "products",
        &[
            ("id", "bigint", false),
            ("name", "character varying", false),
            ("description", "text", true),
            ("price", "double precision", false),
            ("stock", "integer", false),
            ("created_at", "timestamp with time zone", false),
            ("updated_at", "timestamp with time zone", false),
        ],
    ),
    (
        "push_subscriptions",
        &[
            ("id", "bigint", false),
            ("endpoint", "text", false),
            ("p256dh", "text", false),
            ("auth", "text", false),
            ("created_at", "timestamp with time zone", false),
        ],
    ),
    (
        "redemption_rules",
        &[
            ("id", "bigint", false),
            ("name", "character varying", false),
            ("description", "text", true),
            ("points_required", "bigint", false),
            ("reward", "character varying", false),
            ("enabled", "boolean", false),
            ("created_at", "timestamp with time zone", false),
            ("updated_at", "timestamp with time zone", false),
        ],
    ),
    (
        "settlements",
        &[
            ("id", "bigint", false),
            ("member_id", "bigint", false),
            ("period_start", "timestamp with time zone", false),
            ("period_end", "timestamp with time zone", false),
            ("total_buy_in", "double precision", false),
            ("total_cash_out", "double precision", false),
            ("net_amount", "double precision", false),
            ("transaction_count", "bigint", false),
            ("remark", "text", true),
            ("created_at", "timestamp with time zone", false),
        ],
    ),
    (
        "transactions",
        &[
            ("id", "bigint", false),
            ("member_id", "bigint", false),
            ("transaction_type", "character varying", false),
            ("amount", "double precision", false),
            ("chips", "bigint", false),
            ("remark", "text", true),
            ("occurred_at", "timestamp with time zone", false),
            ("created_at", "timestamp with time zone", false),
        ],
    ),
    (
        "users",
        &[
            ("id", "bigint", false),
            ("email", "character varying", false),
            ("name", "character varying", false),
            ("created_at", "timestamp with time zone", false),
            ("updated_at", "timestamp with time zone", false),
        ],
    ),
];

#[derive(Default)]
struct MemoryData {
    next_id: i64,
    users: Vec<User>,
    posts: Vec<Post>,
    products: Vec<Product>,
    members: Vec<Member>,
    transactions: Vec<Transaction>,
    rules: Vec<RedemptionRule>,
    point_transactions: Vec<PointTransaction>,
    settlements: Vec<Settlement>,
    subscriptions: Vec<PushSubscription>,
}

impl MemoryData {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn row_count(&self, table: &str) -> Option<i64> {
        let count = match table {
            "users" => self.users.len(),
            "posts" => self.posts.len(),
            "products" => self.products.len(),
            "members" => self.members.len(),
            "transactions" => self.transactions.len(),
            "redemption_rules" => self.rules.len(),
            "point_transactions" => self.point_transactions.len(),
            "settlements" => self.settlements.len(),
            "push_subscriptions" => self.subscriptions.len(),
            _ => return None,
        };
        Some(count as i64)
    }

    fn balance(&self, member_id: i64) -> i64 {
        saturating_total(
            self.point_transactions
                .iter()
                .filter(|p| p.member_id == member_id)
                .map(|p| p.points),
        )
    }

    fn insert_user(&mut self, user: &NewUser) -> Result<User> {
        if self.users.iter().any(|u| u.email == user.email) {
            return Err(AdminError::EmailTaken(user.email.clone()));
        }
        let now = Utc::now();
        let created = User {
            id: self.next_id(),
            email: user.email.clone(),
            name: user.name.clone(),
            created_at: now,
            updated_at: now,
        };
        self.users.push(created.clone());
        Ok(created)
    }

    fn insert_product(&mut self, product: &NewProduct) -> Product {
        let now = Utc::now();
        let created = Product {
            id: self.next_id(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            stock: product.stock,
            created_at: now,
            updated_at: now,
        };
        self.products.push(created.clone());
        created
    }

    fn insert_member(&mut self, member: &NewMember) -> Result<Member> {
        if self.members.iter().any(|m| m.member_no == member.member_no) {
            return Err(AdminError::MemberNoTaken(member.member_no.clone()));
        }
        let now = Utc::now();
        let created = Member {
            id: self.next_id(),
            member_no: member.member_no.clone(),
            name: member.name.clone(),
            phone: member.phone.clone(),
            status: MemberStatus::Active,
            remark: member.remark.clone(),
            created_at: now,
            updated_at: now,
        };
        self.members.push(created.clone());
        Ok(created)
    }

    fn insert_transaction(&mut self, tx: &NewTransaction) -> Transaction {
        let created = Transaction {
            id: self.next_id(),
            member_id: tx.member_id,
            transaction_type: tx.transaction_type,
            amount: tx.amount,
            chips: tx.chips,
            remark: tx.remark.clone(),
            occurred_at: tx.occurred_at,
            created_at: Utc::now(),
        };
        self.transactions.push(created.clone());
        created
    }

    fn insert_rule(&mut self, rule: &NewRedemptionRule) -> RedemptionRule {
        let now = Utc::now();
        let created = RedemptionRule {
            id: self.next_id(),
            name: rule.name.clone(),
            description: rule.description.clone(),
            points_required: rule.points_required,
            reward: rule.reward.clone(),
            enabled: rule.enabled,
            created_at: now,
            updated_at: now,
        };
        self.rules.push(created.clone());
        created
    }

    fn insert_point_transaction(&mut self, record: &NewPointTransaction) -> PointTransaction {
        let created = PointTransaction {
            id: self.next_id(),
            member_id: record.member_id,
            rule_id: record.rule_id,
            change_type: record.change_type,
            points: record.points,
            remark: record.remark.clone(),
            created_at: Utc::now(),
        };
        self.point_transactions.push(created.clone());
        created
    }
}

/// 积分求和，以 i128 累加后收敛到 i64 范围
fn saturating_total(points: impl Iterator<Item = i64>) -> i64 {
    let total: i128 = points.map(i128::from).sum();
    i64::try_from(total).unwrap_or(if total < 0 { i64::MIN } else { i64::MAX })
}

/// 按 id 倒序分页
fn paginate<T: Clone>(
    items: impl Iterator<Item = T>,
    id_of: impl Fn(&T) -> i64,
    offset: i64,
    limit: i64,
) -> (Vec<T>, i64) {
    let mut items: Vec<T> = items.collect();
    items.sort_by_key(|item| std::cmp::Reverse(id_of(item)));
    let total = items.len() as i64;
    let page = items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect();
    (page, total)
}

/// 内存存储，实现全部仓储接口
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<MemoryData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepositoryTrait for MemoryStore {
    async fn list_users(&self, offset: i64, limit: i64) -> Result<(Vec<User>, i64)> {
        let data = self.data.read();
        Ok(paginate(data.users.iter().cloned(), |u| u.id, offset, limit))
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        Ok(self.data.read().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .data
            .read()
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User> {
        self.data.write().insert_user(user)
    }

    async fn update_user(&self, id: i64, changes: &UserChanges) -> Result<Option<User>> {
        let mut data = self.data.write();

        if let Some(email) = &changes.email {
            if data.users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(AdminError::EmailTaken(email.clone()));
            }
        }

        let Some(user) = data.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if let Some(name) = &changes.name {
            user.name = name.clone();
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl PostRepositoryTrait for MemoryStore {
    async fn list_posts(
        &self,
        filter: &PostFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Post>, i64)> {
        let data = self.data.read();
        let matching = data.posts.iter().filter(|p| {
            filter.author_id.is_none_or(|a| p.author_id == a)
                && filter.published.is_none_or(|v| p.published == v)
        });
        Ok(paginate(matching.cloned(), |p| p.id, offset, limit))
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>> {
        Ok(self.data.read().posts.iter().find(|p| p.id == id).cloned())
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post> {
        let mut data = self.data.write();
        let now = Utc::now();
        let created = Post {
            id: data.next_id(),
            title: post.title.clone(),
            content: post.content.clone(),
            published: post.published,
            author_id: post.author_id,
            created_at: now,
            updated_at: now,
        };
        data.posts.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl ProductRepositoryTrait for MemoryStore {
    async fn list_products(&self, offset: i64, limit: i64) -> Result<(Vec<Product>, i64)> {
        let data = self.data.read();
        Ok(paginate(data.products.iter().cloned(), |p| p.id, offset, limit))
    }

    async fn get_product(&self, id: i64) -> Result<Option<Product>> {
        Ok(self.data.read().products.iter().find(|p| p.id == id).cloned())
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product> {
        Ok(self.data.write().insert_product(product))
    }

    async fn update_product(&self, id: i64, changes: &ProductChanges) -> Result<Option<Product>> {
        let mut data = self.data.write();
        let Some(product) = data.products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            product.name = name.clone();
        }
        if let Some(description) = &changes.description {
            product.description = Some(description.clone());
        }
        if let Some(price) = changes.price {
            product.price = price;
        }
        if let Some(stock) = changes.stock {
            product.stock = stock;
        }
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }
}

#[async_trait]
impl MemberRepositoryTrait for MemoryStore {
    async fn list_members(
        &self,
        filter: &MemberFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Member>, i64)> {
        let keyword = filter
            .keyword
            .as_deref()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty());

        let data = self.data.read();
        let matching = data.members.iter().filter(|m| {
            let keyword_match = keyword.as_ref().is_none_or(|k| {
                m.member_no.to_lowercase().contains(k) || m.name.to_lowercase().contains(k)
            });
            keyword_match && filter.status.is_none_or(|s| m.status == s)
        });
        Ok(paginate(matching.cloned(), |m| m.id, offset, limit))
    }

    async fn get_member(&self, id: i64) -> Result<Option<Member>> {
        Ok(self.data.read().members.iter().find(|m| m.id == id).cloned())
    }

    async fn find_member_by_no(&self, member_no: &str) -> Result<Option<Member>> {
        Ok(self
            .data
            .read()
            .members
            .iter()
            .find(|m| m.member_no == member_no)
            .cloned())
    }

    async fn create_member(&self, member: &NewMember) -> Result<Member> {
        self.data.write().insert_member(member)
    }

    async fn update_member(&self, id: i64, changes: &MemberChanges) -> Result<Option<Member>> {
        let mut data = self.data.write();
        let Some(member) = data.members.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            member.name = name.clone();
        }
        if let Some(phone) = &changes.phone {
            member.phone = Some(phone.clone());
        }
        if let Some(status) = changes.status {
            member.status = status;
        }
        if let Some(remark) = &changes.remark {
            member.remark = Some(remark.clone());
        }
        member.updated_at = Utc::now();
        Ok(Some(member.clone()))
    }
}

#[async_trait]
impl TransactionRepositoryTrait for MemoryStore {
    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Transaction>, i64)> {
        let data = self.data.read();
        let matching = data.transactions.iter().filter(|t| {
            filter.member_id.is_none_or(|m| t.member_id == m)
                && filter.transaction_type.is_none_or(|ty| t.transaction_type == ty)
        });
        Ok(paginate(matching.cloned(), |t| t.id, offset, limit))
    }

    async fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        Ok(self
            .data
            .read()
            .transactions
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn create_transaction(&self, tx: &NewTransaction) -> Result<Transaction> {
        Ok(self.data.write().insert_transaction(tx))
    }

    async fn summarize(
        &self,
        member_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<TransactionSummary> {
        let data = self.data.read();
        let summary = data
            .transactions
            .iter()
            .filter(|t| t.member_id == member_id && t.occurred_at >= start && t.occurred_at <= end)
            .fold(TransactionSummary::default(), |mut acc, t| {
                match t.transaction_type {
                    TransactionType::BuyIn => acc.total_buy_in += t.amount,
                    TransactionType::CashOut => acc.total_cash_out += t.amount,
                }
                acc.transaction_count += 1;
                acc
            });
        Ok(summary)
    }
}

#[async_trait]
impl SettlementRepositoryTrait for MemoryStore {
    async fn list_settlements(
        &self,
        member_id: Option<i64>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Settlement>, i64)> {
        let data = self.data.read();
        let matching = data
            .settlements
            .iter()
            .filter(|s| member_id.is_none_or(|m| s.member_id == m));
        Ok(paginate(matching.cloned(), |s| s.id, offset, limit))
    }

    async fn get_settlement(&self, id: i64) -> Result<Option<Settlement>> {
        Ok(self
            .data
            .read()
            .settlements
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn create_settlement(&self, settlement: &NewSettlement) -> Result<Settlement> {
        let mut data = self.data.write();
        let summary = settlement.summary;
        let created = Settlement {
            id: data.next_id(),
            member_id: settlement.member_id,
            period_start: settlement.period_start,
            period_end: settlement.period_end,
            total_buy_in: summary.total_buy_in,
            total_cash_out: summary.total_cash_out,
            net_amount: summary.net_amount(),
            transaction_count: summary.transaction_count,
            remark: settlement.remark.clone(),
            created_at: Utc::now(),
        };
        data.settlements.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl PointRepositoryTrait for MemoryStore {
    async fn list_rules(&self) -> Result<Vec<RedemptionRule>> {
        let mut rules = self.data.read().rules.clone();
        rules.sort_by_key(|r| (r.points_required, r.id));
        Ok(rules)
    }

    async fn create_rule(&self, rule: &NewRedemptionRule) -> Result<RedemptionRule> {
        Ok(self.data.write().insert_rule(rule))
    }

    async fn update_rule(
        &self,
        id: i64,
        changes: &RedemptionRuleChanges,
    ) -> Result<Option<RedemptionRule>> {
        let mut data = self.data.write();
        let Some(rule) = data.rules.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            rule.name = name.clone();
        }
        if let Some(description) = &changes.description {
            rule.description = Some(description.clone());
        }
        if let Some(points_required) = changes.points_required {
            rule.points_required = points_required;
        }
        if let Some(reward) = &changes.reward {
            rule.reward = reward.clone();
        }
        if let Some(enabled) = changes.enabled {
            rule.enabled = enabled;
        }
        rule.updated_at = Utc::now();
        Ok(Some(rule.clone()))
    }

    async fn list_point_transactions(
        &self,
        member_id: Option<i64>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<PointTransaction>, i64)> {
        let data = self.data.read();
        let matching = data
            .point_transactions
            .iter()
            .filter(|p| member_id.is_none_or(|m| p.member_id == m));
        Ok(paginate(matching.cloned(), |p| p.id, offset, limit))
    }

    async fn create_point_transaction(
        &self,
        record: &NewPointTransaction,
    ) -> Result<PointTransaction> {
        Ok(self.data.write().insert_point_transaction(record))
    }

    async fn balance(&self, member_id: i64) -> Result<i64> {
        Ok(self.data.read().balance(member_id))
    }

    async fn redeem(
        &self,
        member_id: i64,
        rule_id: i64,
        remark: Option<String>,
    ) -> Result<RedeemOutcome> {
        // 写锁内完成规则读取、余额检查与扣减
        let mut data = self.data.write();
        let rule = match data.rules.iter().find(|r| r.id == rule_id) {
            Some(rule) if rule.enabled => rule.clone(),
            Some(_) => return Ok(RedeemOutcome::RuleDisabled),
            None => return Ok(RedeemOutcome::RuleNotFound),
        };

        let balance = data.balance(member_id);
        if balance < rule.points_required {
            return Ok(RedeemOutcome::InsufficientPoints {
                balance,
                required: rule.points_required,
            });
        }

        let record = data.insert_point_transaction(&NewPointTransaction {
            member_id,
            rule_id: Some(rule.id),
            change_type: PointChangeType::Redeem,
            points: -rule.points_required,
            remark,
        });
        let balance_after = balance - rule.points_required;
        Ok(RedeemOutcome::Redeemed {
            record,
            balance_after,
            rule,
        })
    }
}

#[async_trait]
impl PushSubscriptionRepositoryTrait for MemoryStore {
    async fn list_subscriptions(&self) -> Result<Vec<PushSubscription>> {
        Ok(self.data.read().subscriptions.clone())
    }

    async fn upsert_subscription(&self, sub: &NewPushSubscription) -> Result<PushSubscription> {
        let mut data = self.data.write();
        if let Some(existing) = data
            .subscriptions
            .iter_mut()
            .find(|s| s.endpoint == sub.endpoint)
        {
            existing.p256dh = sub.p256dh.clone();
            existing.auth = sub.auth.clone();
            return Ok(existing.clone());
        }

        let created = PushSubscription {
            id: data.next_id(),
            endpoint: sub.endpoint.clone(),
            p256dh: sub.p256dh.clone(),
            auth: sub.auth.clone(),
            created_at: Utc::now(),
        };
        data.subscriptions.push(created.clone());
        Ok(created)
    }

    async fn remove_subscription(&self, endpoint: &str) -> Result<bool> {
        let mut data = self.data.write();
        let before = data.subscriptions.len();
        data.subscriptions.retain(|s| s.endpoint != endpoint);
        Ok(data.subscriptions.len() < before)
    }
}

#[async_trait]
impl DatabaseAdminTrait for MemoryStore {
    async fn probe(&self) -> Result<ProbeReport> {
        let start = Instant::now();
        let _guard = self.data.read();
        Ok(ProbeReport {
            server_time: Utc::now(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn test_connection(&self) -> Result<ConnectionReport> {
        Ok(ConnectionReport {
            server_time: Utc::now(),
            version: "in-memory".to_string(),
            latency_ms: 0,
        })
    }

    async fn run_migrations(&self) -> Result<Vec<AppliedMigration>> {
        // 内存表结构固定，无迁移可执行
        Ok(Vec::new())
    }

    async fn seed(&self) -> Result<SeedReport> {
        let mut data = self.data.write();
        if !data.members.is_empty() {
            return Ok(SeedReport {
                skipped: true,
                ..Default::default()
            });
        }

        let dataset = SeedDataset::demo();
        let mut report = SeedReport::default();

        for user in &dataset.users {
            if data.insert_user(user).is_ok() {
                report.users += 1;
            }
        }
        for product in &dataset.products {
            data.insert_product(product);
            report.products += 1;
        }

        let mut member_ids = Vec::with_capacity(dataset.members.len());
        for member in &dataset.members {
            member_ids.push(data.insert_member(member)?.id);
        }
        report.members = member_ids.len() as i64;

        let now = Utc::now();
        for item in &dataset.transactions {
            data.insert_transaction(&NewTransaction {
                member_id: member_ids[item.member],
                transaction_type: item.transaction_type,
                amount: item.amount,
                chips: item.chips,
                remark: None,
                occurred_at: now - Duration::days(item.days_ago),
            });
            report.transactions += 1;
        }
        for rule in &dataset.rules {
            data.insert_rule(rule);
            report.redemption_rules += 1;
        }
        for grant in &dataset.grants {
            data.insert_point_transaction(&NewPointTransaction {
                member_id: member_ids[grant.member],
                rule_id: None,
                change_type: PointChangeType::Earn,
                points: grant.points,
                remark: Some("初始积分".to_string()),
            });
            report.point_transactions += 1;
        }

        Ok(report)
    }

    async fn list_tables(&self) -> Result<Vec<TableInfo>> {
        let data = self.data.read();
        Ok(TABLE_SCHEMAS
            .iter()
            .map(|(name, _)| TableInfo {
                table_name: (*name).to_string(),
                estimated_rows: data.row_count(name).unwrap_or_default(),
            })
            .collect())
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let columns = TABLE_SCHEMAS
            .iter()
            .find(|(name, _)| *name == table)
            .map(|(_, columns)| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(idx, (column, data_type, nullable))| ColumnInfo {
                        column_name: (*column).to_string(),
                        data_type: (*data_type).to_string(),
                        is_nullable: *nullable,
                        column_default: None,
                        ordinal_position: idx as i32 + 1,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(columns)
    }

    async fn count_rows(&self, table: &str) -> Result<Option<i64>> {
        Ok(self.data.read().row_count(table))
    }

    async fn database_stats(&self) -> Result<DatabaseStats> {
        let data = self.data.read();
        let sum_of = |ty: TransactionType| -> f64 {
            data.transactions
                .iter()
                .filter(|t| t.transaction_type == ty)
                .map(|t| t.amount)
                .sum()
        };

        Ok(DatabaseStats {
            users: data.users.len() as i64,
            posts: data.posts.len() as i64,
            products: data.products.len() as i64,
            members: data.members.len() as i64,
            active_members: data
                .members
                .iter()
                .filter(|m| m.status == MemberStatus::Active)
                .count() as i64,
            transactions: data.transactions.len() as i64,
            total_buy_in: sum_of(TransactionType::BuyIn),
            total_cash_out: sum_of(TransactionType::CashOut),
            redemption_rules: data.rules.len() as i64,
            settlements: data.settlements.len() as i64,
        })
    }

    async fn overview_stats(&self) -> Result<StatsOverview> {
        let data = self.data.read();
        let today = Utc::now().date_naive();
        let today_txs: Vec<&Transaction> = data
            .transactions
            .iter()
            .filter(|t| t.occurred_at.date_naive() == today)
            .collect();
        let today_sum = |ty: TransactionType| -> f64 {
            today_txs
                .iter()
                .filter(|t| t.transaction_type == ty)
                .map(|t| t.amount)
                .sum()
        };

        Ok(StatsOverview {
            total_members: data.members.len() as i64,
            active_members: data
                .members
                .iter()
                .filter(|m| m.status == MemberStatus::Active)
                .count() as i64,
            today_transactions: today_txs.len() as i64,
            today_buy_in: today_sum(TransactionType::BuyIn),
            today_cash_out: today_sum(TransactionType::CashOut),
            outstanding_points: saturating_total(data.point_transactions.iter().map(|p| p.points)),
        })
    }
}

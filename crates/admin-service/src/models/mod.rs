//! 后台实体模型
//!
//! - `enums`: 状态与类型枚举
//! - `user` / `product`: 后台用户、文章、商品
//! - `member`: 会员、交易记录、结算
//! - `points`: 兑换规则与积分流水
//! - `push`: 推送订阅
//! - `schema` / `stats`: 数据库自省与统计

pub mod enums;
pub mod member;
pub mod points;
pub mod product;
pub mod push;
pub mod schema;
pub mod stats;
pub mod user;

pub use enums::{MemberStatus, PointChangeType, TransactionType};
pub use member::{
    Member, MemberChanges, MemberFilter, NewMember, NewSettlement, NewTransaction, Settlement,
    Transaction, TransactionFilter, TransactionSummary,
};
pub use points::{
    NewPointTransaction, NewRedemptionRule, PointTransaction, RedeemOutcome, RedemptionRule,
    RedemptionRuleChanges,
};
pub use product::{NewProduct, Product, ProductChanges};
pub use push::{NewPushSubscription, PushSubscription};
pub use schema::{ColumnInfo, TableInfo};
pub use stats::{DatabaseStats, SeedReport, StatsOverview};
pub use user::{NewPost, NewUser, Post, PostFilter, User, UserChanges};

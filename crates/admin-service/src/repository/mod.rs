//! 数据访问层
//!
//! 每个资源一个仓储 trait，PostgreSQL 与内存两套实现。
//! `Repositories` 将全部仓储打包，供 `AppState` 持有。

pub mod admin_repo;
pub mod member_repo;
pub mod memory;
pub mod point_repo;
pub mod product_repo;
pub mod push_repo;
pub mod seed;
pub mod traits;
pub mod user_repo;

use std::sync::Arc;

use backoffice_shared::database::Database;

pub use admin_repo::DatabaseAdmin;
pub use member_repo::{MemberRepository, SettlementRepository, TransactionRepository};
pub use memory::MemoryStore;
pub use point_repo::PointRepository;
pub use product_repo::ProductRepository;
pub use push_repo::PushSubscriptionRepository;
pub use traits::*;
pub use user_repo::{PostRepository, UserRepository};

/// 仓储集合
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepositoryTrait>,
    pub posts: Arc<dyn PostRepositoryTrait>,
    pub products: Arc<dyn ProductRepositoryTrait>,
    pub members: Arc<dyn MemberRepositoryTrait>,
    pub transactions: Arc<dyn TransactionRepositoryTrait>,
    pub settlements: Arc<dyn SettlementRepositoryTrait>,
    pub points: Arc<dyn PointRepositoryTrait>,
    pub push: Arc<dyn PushSubscriptionRepositoryTrait>,
    pub admin: Arc<dyn DatabaseAdminTrait>,
}

impl Repositories {
    /// PostgreSQL 实现
    pub fn postgres(db: Database) -> Self {
        let pool = db.pool().clone();
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            posts: Arc::new(PostRepository::new(pool.clone())),
            products: Arc::new(ProductRepository::new(pool.clone())),
            members: Arc::new(MemberRepository::new(pool.clone())),
            transactions: Arc::new(TransactionRepository::new(pool.clone())),
            settlements: Arc::new(SettlementRepository::new(pool.clone())),
            points: Arc::new(PointRepository::new(pool.clone())),
            push: Arc::new(PushSubscriptionRepository::new(pool)),
            admin: Arc::new(DatabaseAdmin::new(db)),
        }
    }

    /// 内存实现，所有仓储共享同一份数据
    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            posts: store.clone(),
            products: store.clone(),
            members: store.clone(),
            transactions: store.clone(),
            settlements: store.clone(),
            points: store.clone(),
            push: store.clone(),
            admin: store,
        }
    }

    /// 替换数据库管理实现（测试用）
    pub fn with_admin(mut self, admin: Arc<dyn DatabaseAdminTrait>) -> Self {
        self.admin = admin;
        self
    }
}

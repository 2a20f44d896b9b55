//! 演示数据
//!
//! PostgreSQL 与内存存储共用同一份数据集，会员表非空时跳过写入。

use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::info;

use crate::error::Result;
use crate::models::{
    NewMember, NewProduct, NewRedemptionRule, NewUser, SeedReport, TransactionType,
};

/// 演示交易：会员下标、类型、金额、筹码、距今天数
pub struct SeedTransaction {
    pub member: usize,
    pub transaction_type: TransactionType,
    pub amount: f64,
    pub chips: i64,
    pub days_ago: i64,
}

/// 演示积分发放：会员下标、积分
pub struct SeedGrant {
    pub member: usize,
    pub points: i64,
}

pub struct SeedDataset {
    pub users: Vec<NewUser>,
    pub products: Vec<NewProduct>,
    pub members: Vec<NewMember>,
    pub transactions: Vec<SeedTransaction>,
    pub rules: Vec<NewRedemptionRule>,
    pub grants: Vec<SeedGrant>,
}

impl SeedDataset {
    pub fn demo() -> Self {
        Self {
            users: vec![NewUser {
                email: "admin@backoffice.local".to_string(),
                name: "管理员".to_string(),
            }],
            products: vec![NewProduct {
                name: "会员月卡".to_string(),
                description: Some("30 天会员权益".to_string()),
                price: 199.0,
                stock: 100,
            }],
            members: vec![
                NewMember {
                    member_no: "M0001".to_string(),
                    name: "张三".to_string(),
                    phone: Some("13800000001".to_string()),
                    remark: None,
                },
                NewMember {
                    member_no: "M0002".to_string(),
                    name: "李四".to_string(),
                    phone: Some("13800000002".to_string()),
                    remark: Some("演示会员".to_string()),
                },
            ],
            transactions: vec![
                SeedTransaction {
                    member: 0,
                    transaction_type: TransactionType::BuyIn,
                    amount: 1000.0,
                    chips: 1000,
                    days_ago: 2,
                },
                SeedTransaction {
                    member: 0,
                    transaction_type: TransactionType::CashOut,
                    amount: 1500.0,
                    chips: 1500,
                    days_ago: 1,
                },
                SeedTransaction {
                    member: 1,
                    transaction_type: TransactionType::BuyIn,
                    amount: 500.0,
                    chips: 500,
                    days_ago: 0,
                },
            ],
            rules: vec![NewRedemptionRule {
                name: "饮品兑换".to_string(),
                description: Some("任意饮品一杯".to_string()),
                points_required: 100,
                reward: "饮品一杯".to_string(),
                enabled: true,
            }],
            grants: vec![
                SeedGrant {
                    member: 0,
                    points: 300,
                },
                SeedGrant {
                    member: 1,
                    points: 80,
                },
            ],
        }
    }
}

/// 在单个事务内写入演示数据
pub async fn seed_postgres(pool: &PgPool) -> Result<SeedReport> {
    let data = SeedDataset::demo();
    let mut tx = pool.begin().await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
        .fetch_one(&mut *tx)
        .await?;
    if existing > 0 {
        info!(existing, "Members already present, seed skipped");
        return Ok(SeedReport {
            skipped: true,
            ..Default::default()
        });
    }

    let mut report = SeedReport::default();

    for user in &data.users {
        let result = sqlx::query(
            "INSERT INTO users (email, name) VALUES ($1, $2) ON CONFLICT (email) DO NOTHING",
        )
        .bind(&user.email)
        .bind(&user.name)
        .execute(&mut *tx)
        .await?;
        report.users += result.rows_affected() as i64;
    }

    for product in &data.products {
        sqlx::query("INSERT INTO products (name, description, price, stock) VALUES ($1, $2, $3, $4)")
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price)
            .bind(product.stock)
            .execute(&mut *tx)
            .await?;
        report.products += 1;
    }

    let mut member_ids = Vec::with_capacity(data.members.len());
    for member in &data.members {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO members (member_no, name, phone, remark) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&member.member_no)
        .bind(&member.name)
        .bind(&member.phone)
        .bind(&member.remark)
        .fetch_one(&mut *tx)
        .await?;
        member_ids.push(id);
    }
    report.members = member_ids.len() as i64;

    let now = Utc::now();
    for item in &data.transactions {
        sqlx::query(
            r#"
            INSERT INTO transactions (member_id, transaction_type, amount, chips, occurred_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(member_ids[item.member])
        .bind(item.transaction_type.as_str())
        .bind(item.amount)
        .bind(item.chips)
        .bind(now - Duration::days(item.days_ago))
        .execute(&mut *tx)
        .await?;
        report.transactions += 1;
    }

    for rule in &data.rules {
        sqlx::query(
            r#"
            INSERT INTO redemption_rules (name, description, points_required, reward, enabled)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&rule.name)
        .bind(&rule.description)
        .bind(rule.points_required)
        .bind(&rule.reward)
        .bind(rule.enabled)
        .execute(&mut *tx)
        .await?;
        report.redemption_rules += 1;
    }

    for grant in &data.grants {
        sqlx::query(
            r#"
            INSERT INTO point_transactions (member_id, change_type, points, remark)
            VALUES ($1, 'earn', $2, '初始积分')
            "#,
        )
        .bind(member_ids[grant.member])
        .bind(grant.points)
        .execute(&mut *tx)
        .await?;
        report.point_transactions += 1;
    }

    tx.commit().await?;

    info!(
        members = report.members,
        transactions = report.transactions,
        "Demo data seeded"
    );
    Ok(report)
}

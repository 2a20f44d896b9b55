//! 后台服务请求 DTO 定义
//!
//! 必填字段统一声明为 `Option`，由 `into_*` 转换时做存在性检查，
//! 缺失时返回带字段名的 400 错误；格式与范围约束交给 validator。

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::error::{AdminError, Result, required, required_text};
use crate::models::{
    MemberChanges, MemberStatus, NewMember, NewPointTransaction, NewPost, NewProduct,
    NewPushSubscription, NewRedemptionRule, NewTransaction, NewUser, PointChangeType,
    ProductChanges, RedemptionRuleChanges, TransactionType, UserChanges,
};

/// 页码上限，超出后按最后可寻址页处理
pub const MAX_PAGE: i64 = 1_000_000;

/// 分页参数
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl PaginationParams {
    /// 计算数据库查询的 offset
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }

    /// 获取限制条数（1-100）
    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, 100)
    }

    /// 规范化后的页码（1-MAX_PAGE）
    pub fn page(&self) -> i64 {
        self.page.clamp(1, MAX_PAGE)
    }
}

// ==================== 用户 / 文章 / 商品 ====================

/// 创建用户请求
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(email(message = "邮箱格式不正确"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100, message = "name 长度必须在1-100个字符之间"))]
    pub name: Option<String>,
}

impl CreateUserRequest {
    pub fn into_new_user(self) -> Result<NewUser> {
        Ok(NewUser {
            email: required_text(self.email, "email")?.to_lowercase(),
            name: required_text(self.name, "name")?,
        })
    }
}

/// 更新用户请求
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(email(message = "邮箱格式不正确"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100, message = "name 长度必须在1-100个字符之间"))]
    pub name: Option<String>,
}

impl From<UpdateUserRequest> for UserChanges {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            email: req.email.map(|e| e.trim().to_lowercase()),
            name: req.name,
        }
    }
}

/// 创建文章请求
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 200, message = "title 长度必须在1-200个字符之间"))]
    pub title: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
    pub author_id: Option<i64>,
}

impl CreatePostRequest {
    pub fn into_new_post(self) -> Result<NewPost> {
        Ok(NewPost {
            title: required_text(self.title, "title")?,
            content: self.content,
            published: self.published.unwrap_or(false),
            author_id: required(self.author_id, "authorId")?,
        })
    }
}

/// 创建商品请求
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 100, message = "name 长度必须在1-100个字符之间"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "price 不能为负数"))]
    pub price: Option<f64>,
    #[validate(range(min = 0, message = "stock 不能为负数"))]
    pub stock: Option<i32>,
}

impl CreateProductRequest {
    pub fn into_new_product(self) -> Result<NewProduct> {
        Ok(NewProduct {
            name: required_text(self.name, "name")?,
            description: self.description,
            price: required(self.price, "price")?,
            stock: self.stock.unwrap_or(0),
        })
    }
}

/// 更新商品请求
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 100, message = "name 长度必须在1-100个字符之间"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "price 不能为负数"))]
    pub price: Option<f64>,
    #[validate(range(min = 0, message = "stock 不能为负数"))]
    pub stock: Option<i32>,
}

impl From<UpdateProductRequest> for ProductChanges {
    fn from(req: UpdateProductRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            price: req.price,
            stock: req.stock,
        }
    }
}

// ==================== 会员 / 交易 / 结算 ====================

/// 创建会员请求
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberRequest {
    #[validate(length(min = 1, max = 32, message = "memberNo 长度必须在1-32个字符之间"))]
    pub member_no: Option<String>,
    #[validate(length(min = 1, max = 100, message = "name 长度必须在1-100个字符之间"))]
    pub name: Option<String>,
    #[validate(length(max = 32, message = "phone 不能超过32个字符"))]
    pub phone: Option<String>,
    pub remark: Option<String>,
}

impl CreateMemberRequest {
    pub fn into_new_member(self) -> Result<NewMember> {
        Ok(NewMember {
            member_no: required_text(self.member_no, "memberNo")?,
            name: required_text(self.name, "name")?,
            phone: self.phone,
            remark: self.remark,
        })
    }
}

/// 更新会员请求
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberRequest {
    #[validate(length(min = 1, max = 100, message = "name 长度必须在1-100个字符之间"))]
    pub name: Option<String>,
    #[validate(length(max = 32, message = "phone 不能超过32个字符"))]
    pub phone: Option<String>,
    pub status: Option<MemberStatus>,
    pub remark: Option<String>,
}

impl From<UpdateMemberRequest> for MemberChanges {
    fn from(req: UpdateMemberRequest) -> Self {
        Self {
            name: req.name,
            phone: req.phone,
            status: req.status,
            remark: req.remark,
        }
    }
}

/// 创建交易记录请求
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub member_id: Option<i64>,
    pub transaction_type: Option<TransactionType>,
    #[validate(range(exclusive_min = 0.0, message = "amount 必须大于0"))]
    pub amount: Option<f64>,
    #[validate(range(min = 0, message = "chips 不能为负数"))]
    pub chips: Option<i64>,
    pub remark: Option<String>,
    /// 发生时间，缺省为当前时间
    pub occurred_at: Option<DateTime<Utc>>,
}

impl CreateTransactionRequest {
    pub fn into_new_transaction(self) -> Result<NewTransaction> {
        Ok(NewTransaction {
            member_id: required(self.member_id, "memberId")?,
            transaction_type: required(self.transaction_type, "transactionType")?,
            amount: required(self.amount, "amount")?,
            chips: self.chips.unwrap_or(0),
            remark: self.remark,
            occurred_at: self.occurred_at.unwrap_or_else(Utc::now),
        })
    }
}

/// 创建结算请求
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSettlementRequest {
    pub member_id: Option<i64>,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    #[validate(length(max = 500, message = "remark 不能超过500个字符"))]
    pub remark: Option<String>,
}

/// 已校验的结算周期
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementPeriod {
    pub member_id: i64,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub remark: Option<String>,
}

impl CreateSettlementRequest {
    pub fn into_period(self) -> Result<SettlementPeriod> {
        let member_id = required(self.member_id, "memberId")?;
        let period_start = required(self.period_start, "periodStart")?;
        let period_end = required(self.period_end, "periodEnd")?;

        if period_end < period_start {
            return Err(AdminError::Validation(
                "periodEnd 不能早于 periodStart".to_string(),
            ));
        }

        Ok(SettlementPeriod {
            member_id,
            period_start,
            period_end,
            remark: self.remark,
        })
    }
}

// ==================== 积分 ====================

/// 创建兑换规则请求
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRedemptionRuleRequest {
    #[validate(length(min = 1, max = 100, message = "name 长度必须在1-100个字符之间"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(
        min = 1,
        max = 100_000_000,
        message = "pointsRequired 必须在1-100000000之间"
    ))]
    pub points_required: Option<i64>,
    #[validate(length(min = 1, max = 200, message = "reward 长度必须在1-200个字符之间"))]
    pub reward: Option<String>,
    pub enabled: Option<bool>,
}

impl CreateRedemptionRuleRequest {
    pub fn into_new_rule(self) -> Result<NewRedemptionRule> {
        Ok(NewRedemptionRule {
            name: required_text(self.name, "name")?,
            description: self.description,
            points_required: required(self.points_required, "pointsRequired")?,
            reward: required_text(self.reward, "reward")?,
            enabled: self.enabled.unwrap_or(true),
        })
    }
}

/// 更新兑换规则请求
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRedemptionRuleRequest {
    #[validate(length(min = 1, max = 100, message = "name 长度必须在1-100个字符之间"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(
        min = 1,
        max = 100_000_000,
        message = "pointsRequired 必须在1-100000000之间"
    ))]
    pub points_required: Option<i64>,
    #[validate(length(min = 1, max = 200, message = "reward 长度必须在1-200个字符之间"))]
    pub reward: Option<String>,
    pub enabled: Option<bool>,
}

impl From<UpdateRedemptionRuleRequest> for RedemptionRuleChanges {
    fn from(req: UpdateRedemptionRuleRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            points_required: req.points_required,
            reward: req.reward,
            enabled: req.enabled,
        }
    }
}

/// 人工发放/调整积分请求
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePointTransactionRequest {
    pub member_id: Option<i64>,
    #[validate(range(
        min = -100_000_000,
        max = 100_000_000,
        message = "points 绝对值不能超过 100000000"
    ))]
    pub points: Option<i64>,
    /// 缺省时正数记为 EARN，负数记为 ADJUST
    pub change_type: Option<PointChangeType>,
    #[validate(length(max = 500, message = "remark 不能超过500个字符"))]
    pub remark: Option<String>,
}

impl CreatePointTransactionRequest {
    pub fn into_new_point_transaction(self) -> Result<NewPointTransaction> {
        let member_id = required(self.member_id, "memberId")?;
        let points = required(self.points, "points")?;

        if points == 0 {
            return Err(AdminError::Validation("points 不能为0".to_string()));
        }

        let change_type = match self.change_type {
            // 兑换消耗只能经由兑换接口产生
            Some(PointChangeType::Redeem) => {
                return Err(AdminError::Validation(
                    "changeType 不能为 REDEEM，请使用兑换接口".to_string(),
                ));
            }
            Some(PointChangeType::Earn) if points < 0 => {
                return Err(AdminError::Validation(
                    "EARN 类型的 points 必须为正数".to_string(),
                ));
            }
            Some(other) => other,
            None if points > 0 => PointChangeType::Earn,
            None => PointChangeType::Adjust,
        };

        Ok(NewPointTransaction {
            member_id,
            rule_id: None,
            change_type,
            points,
            remark: self.remark,
        })
    }
}

/// 积分兑换请求
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RedeemPointsRequest {
    pub member_id: Option<i64>,
    pub rule_id: Option<i64>,
    #[validate(length(max = 500, message = "remark 不能超过500个字符"))]
    pub remark: Option<String>,
}

// ==================== 推送订阅 ====================

/// 浏览器 PushSubscription.toJSON() 中的密钥部分
#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: Option<String>,
    pub auth: Option<String>,
}

/// 订阅请求
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    #[validate(url(message = "endpoint 必须是合法的 URL"))]
    pub endpoint: Option<String>,
    pub keys: Option<SubscriptionKeys>,
}

impl SubscribeRequest {
    pub fn into_new_subscription(self) -> Result<NewPushSubscription> {
        let endpoint = required_text(self.endpoint, "endpoint")?;
        let keys = required(self.keys, "keys")?;

        Ok(NewPushSubscription {
            endpoint,
            p256dh: required_text(keys.p256dh, "keys.p256dh")?,
            auth: required_text(keys.auth, "keys.auth")?,
        })
    }
}

/// 取消订阅请求
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UnsubscribeRequest {
    #[validate(length(min = 1, message = "endpoint 不能为空"))]
    pub endpoint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_bounds() {
        let params = PaginationParams {
            page: 0,
            page_size: 500,
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 100);
        assert_eq!(params.offset(), 0);

        let params = PaginationParams {
            page: 3,
            page_size: 10,
        };
        assert_eq!(params.offset(), 20);
    }

    #[test]
    fn test_pagination_huge_page_is_clamped() {
        let params = PaginationParams {
            page: i64::MAX,
            page_size: 100,
        };
        assert_eq!(params.page(), MAX_PAGE);
        assert_eq!(params.offset(), (MAX_PAGE - 1) * 100);
    }

    #[test]
    fn test_create_user_request() {
        let req = CreateUserRequest {
            email: Some("not-an-email".to_string()),
            name: Some("管理员".to_string()),
        };
        assert!(req.validate().is_err());

        let req = CreateUserRequest {
            email: Some("Admin@Example.com".to_string()),
            name: Some("管理员".to_string()),
        };
        assert!(req.validate().is_ok());
        assert_eq!(req.into_new_user().unwrap().email, "admin@example.com");

        let missing = CreateUserRequest {
            email: Some("a@example.com".to_string()),
            name: None,
        };
        assert!(missing.validate().is_ok());
        let err = missing.into_new_user().unwrap_err();
        assert!(matches!(err, AdminError::MissingField("name")));
    }

    #[test]
    fn test_empty_name_fails_validation() {
        let req = CreateMemberRequest {
            member_no: Some("M001".to_string()),
            name: Some(String::new()),
            ..Default::default()
        };
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_transaction_amount_must_be_positive() {
        let req = CreateTransactionRequest {
            member_id: Some(1),
            transaction_type: Some(TransactionType::BuyIn),
            amount: Some(0.0),
            ..Default::default()
        };
        assert!(req.validate().is_err());

        let req = CreateTransactionRequest {
            member_id: Some(1),
            transaction_type: Some(TransactionType::BuyIn),
            amount: Some(100.0),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
        let tx = req.into_new_transaction().unwrap();
        assert_eq!(tx.chips, 0);
    }

    #[test]
    fn test_settlement_period_order() {
        let now = Utc::now();
        let req = CreateSettlementRequest {
            member_id: Some(1),
            period_start: Some(now),
            period_end: Some(now - chrono::Duration::days(1)),
            remark: None,
        };
        assert!(matches!(req.into_period(), Err(AdminError::Validation(_))));

        let req = CreateSettlementRequest {
            member_id: Some(1),
            period_start: None,
            period_end: Some(now),
            remark: None,
        };
        assert!(matches!(
            req.into_period(),
            Err(AdminError::MissingField("periodStart"))
        ));
    }

    #[test]
    fn test_point_change_type_inference() {
        let earn = CreatePointTransactionRequest {
            member_id: Some(1),
            points: Some(50),
            ..Default::default()
        }
        .into_new_point_transaction()
        .unwrap();
        assert_eq!(earn.change_type, PointChangeType::Earn);

        let adjust = CreatePointTransactionRequest {
            member_id: Some(1),
            points: Some(-20),
            ..Default::default()
        }
        .into_new_point_transaction()
        .unwrap();
        assert_eq!(adjust.change_type, PointChangeType::Adjust);

        let redeem = CreatePointTransactionRequest {
            member_id: Some(1),
            points: Some(-20),
            change_type: Some(PointChangeType::Redeem),
            ..Default::default()
        };
        assert!(redeem.into_new_point_transaction().is_err());

        let zero = CreatePointTransactionRequest {
            member_id: Some(1),
            points: Some(0),
            ..Default::default()
        };
        assert!(zero.into_new_point_transaction().is_err());
    }

    #[test]
    fn test_subscribe_request_requires_keys() {
        let req: SubscribeRequest = serde_json::from_value(serde_json::json!({
            "endpoint": "https://push.example.com/abc",
            "keys": { "p256dh": "key" }
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert!(matches!(
            req.into_new_subscription(),
            Err(AdminError::MissingField("keys.auth"))
        ));
    }

    #[test]
    fn test_blank_required_text_is_missing() {
        let req: SubscribeRequest = serde_json::from_value(serde_json::json!({
            "endpoint": "https://push.example.com/abc",
            "keys": { "p256dh": "", "auth": "" }
        }))
        .unwrap();
        assert!(matches!(
            req.into_new_subscription(),
            Err(AdminError::MissingField("keys.p256dh"))
        ));

        let req = CreateMemberRequest {
            member_no: Some("   ".to_string()),
            name: Some("张三".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
        assert!(matches!(
            req.into_new_member(),
            Err(AdminError::MissingField("memberNo"))
        ));
    }

    #[test]
    fn test_points_out_of_range_fails_validation() {
        let req = CreatePointTransactionRequest {
            member_id: Some(1),
            points: Some(i64::MAX),
            ..Default::default()
        };
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("points"));

        let req = CreatePointTransactionRequest {
            member_id: Some(1),
            points: Some(100_000_000),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
    }
}

//! 后台服务错误类型定义
//!
//! 所有 handler 的错误最终都转换为统一的 JSON 失败响应，不会越过 handler 边界。

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use backoffice_shared::error::SharedError;
use serde_json::json;

/// 后台服务错误类型
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    // 请求/配置错误
    #[error("参数验证失败: {0}")]
    Validation(String),
    #[error("缺少必填字段: {0}")]
    MissingField(&'static str),
    #[error("缺少配置: {0}")]
    NotConfigured(&'static str),

    // 资源不存在
    #[error("用户不存在: {0}")]
    UserNotFound(i64),
    #[error("文章不存在: {0}")]
    PostNotFound(i64),
    #[error("商品不存在: {0}")]
    ProductNotFound(i64),
    #[error("会员不存在: {0}")]
    MemberNotFound(i64),
    #[error("交易记录不存在: {0}")]
    TransactionNotFound(i64),
    #[error("兑换规则不存在: {0}")]
    RuleNotFound(i64),
    #[error("结算记录不存在: {0}")]
    SettlementNotFound(i64),
    #[error("推送订阅不存在: {0}")]
    SubscriptionNotFound(String),
    #[error("数据表不存在: {0}")]
    TableNotFound(String),
    #[error("资源不存在: {0}")]
    NotFound(String),

    // 业务冲突
    #[error("邮箱已被使用: {0}")]
    EmailTaken(String),
    #[error("会员编号已存在: {0}")]
    MemberNoTaken(String),
    #[error("会员已冻结: {0}")]
    MemberFrozen(i64),
    #[error("兑换规则未启用: {0}")]
    RuleDisabled(i64),
    #[error("积分不足: 需要 {required}, 可用 {available}")]
    InsufficientPoints { required: i64, available: i64 },
    #[error("积分余额超出范围: 会员 {0}")]
    BalanceOutOfRange(i64),

    // 系统错误
    #[error("数据库连接失败: {0}")]
    ConnectionFailed(String),
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
    #[error("内部错误: {0}")]
    Internal(String),
}

impl AdminError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::MissingField(_) | Self::NotConfigured(_) => {
                StatusCode::BAD_REQUEST
            }

            Self::UserNotFound(_)
            | Self::PostNotFound(_)
            | Self::ProductNotFound(_)
            | Self::MemberNotFound(_)
            | Self::TransactionNotFound(_)
            | Self::RuleNotFound(_)
            | Self::SettlementNotFound(_)
            | Self::SubscriptionNotFound(_)
            | Self::TableNotFound(_)
            | Self::NotFound(_) => StatusCode::NOT_FOUND,

            Self::EmailTaken(_)
            | Self::MemberNoTaken(_)
            | Self::MemberFrozen(_)
            | Self::RuleDisabled(_)
            | Self::InsufficientPoints { .. }
            | Self::BalanceOutOfRange(_) => StatusCode::CONFLICT,

            Self::ConnectionFailed(_) | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::NotConfigured(_) => "NOT_CONFIGURED",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::PostNotFound(_) => "POST_NOT_FOUND",
            Self::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            Self::MemberNotFound(_) => "MEMBER_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::RuleNotFound(_) => "RULE_NOT_FOUND",
            Self::SettlementNotFound(_) => "SETTLEMENT_NOT_FOUND",
            Self::SubscriptionNotFound(_) => "SUBSCRIPTION_NOT_FOUND",
            Self::TableNotFound(_) => "TABLE_NOT_FOUND",
            Self::NotFound(_) => "NOT_FOUND",
            Self::EmailTaken(_) => "EMAIL_TAKEN",
            Self::MemberNoTaken(_) => "MEMBER_NO_TAKEN",
            Self::MemberFrozen(_) => "MEMBER_FROZEN",
            Self::RuleDisabled(_) => "RULE_DISABLED",
            Self::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            Self::BalanceOutOfRange(_) => "BALANCE_OUT_OF_RANGE",
            Self::ConnectionFailed(_) => "CONNECTION_FAILED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志，防止信息泄露。
        // 连接失败例外：健康检查接口本身就是为了暴露该信息。
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "数据库操作失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::ConnectionFailed(e) => {
                tracing::error!(error = %e, "数据库连接失败");
                self.to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "error": message,
            "timestamp": chrono::Utc::now(),
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for AdminError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// 请求体无法解析时同样返回统一的 JSON 失败响应
impl From<JsonRejection> for AdminError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// 从基础设施错误转换
impl From<SharedError> for AdminError {
    fn from(err: SharedError) -> Self {
        match err {
            SharedError::NotConfigured(key) => Self::NotConfigured(key),
            SharedError::Database(e) => Self::Database(e),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// 服务层 Result 类型别名
pub type Result<T> = std::result::Result<T, AdminError>;

/// 取出必填字段，缺失时返回带字段名的 400 错误
pub fn required<T>(value: Option<T>, field: &'static str) -> Result<T> {
    value.ok_or(AdminError::MissingField(field))
}

/// 取出必填文本字段，去除首尾空白后为空同样视为缺失
pub fn required_text(value: Option<String>, field: &'static str) -> Result<String> {
    let value = required(value, field)?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AdminError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

//! 积分与兑换规则 API 处理器
//!
//! 积分余额由流水求和得出；兑换在仓储层的单个事务内完成检查与扣减。

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use backoffice_shared::observability::metrics;
use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use crate::{
    dto::{
        ApiResponse, CreatePointTransactionRequest, CreateRedemptionRuleRequest, PageResponse,
        PaginationParams, RedeemPointsRequest, RedeemResultDto, UpdateRedemptionRuleRequest,
    },
    error::{AdminError, required},
    models::{PointTransaction, RedeemOutcome, RedemptionRule, RedemptionRuleChanges},
    state::AppState,
};

/// 积分流水查询过滤
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointQueryFilter {
    pub member_id: Option<i64>,
}

/// 获取兑换规则列表
///
/// GET /api/points/rules
pub async fn list_rules(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<RedemptionRule>>>, AdminError> {
    let repos = state.repos()?;
    let rules = repos.points.list_rules().await?;
    Ok(Json(ApiResponse::success(rules)))
}

/// POST /api/points/rules
pub async fn create_rule(
    State(state): State<AppState>,
    payload: Result<Json<CreateRedemptionRuleRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<RedemptionRule>>, AdminError> {
    let Json(req) = payload?;
    req.validate()?;
    let new_rule = req.into_new_rule()?;

    let repos = state.repos()?;
    let rule = repos.points.create_rule(&new_rule).await?;

    info!(rule_id = rule.id, points_required = rule.points_required, "Redemption rule created");
    Ok(Json(ApiResponse::success(rule)))
}

/// PUT /api/points/rules/{id}
pub async fn update_rule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateRedemptionRuleRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<RedemptionRule>>, AdminError> {
    let Json(req) = payload?;
    req.validate()?;

    let repos = state.repos()?;
    let rule = repos
        .points
        .update_rule(id, &RedemptionRuleChanges::from(req))
        .await?
        .ok_or(AdminError::RuleNotFound(id))?;

    info!(rule_id = id, enabled = rule.enabled, "Redemption rule updated");
    Ok(Json(ApiResponse::success(rule)))
}

/// 获取积分流水（分页，可按会员过滤）
///
/// GET /api/points
pub async fn list_point_transactions(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<PointQueryFilter>,
) -> Result<Json<ApiResponse<PageResponse<PointTransaction>>>, AdminError> {
    let repos = state.repos()?;
    let (items, total) = repos
        .points
        .list_point_transactions(filter.member_id, pagination.offset(), pagination.limit())
        .await?;

    Ok(Json(ApiResponse::success(PageResponse::new(
        items,
        total,
        pagination.page(),
        pagination.limit(),
    ))))
}

/// 人工发放或调整积分
///
/// POST /api/points
pub async fn create_point_transaction(
    State(state): State<AppState>,
    payload: Result<Json<CreatePointTransactionRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<PointTransaction>>, AdminError> {
    let Json(req) = payload?;
    req.validate()?;
    let record = req.into_new_point_transaction()?;

    let repos = state.repos()?;
    if repos.members.get_member(record.member_id).await?.is_none() {
        return Err(AdminError::MemberNotFound(record.member_id));
    }

    let balance = repos.points.balance(record.member_id).await?;
    if balance.checked_add(record.points).is_none() {
        return Err(AdminError::BalanceOutOfRange(record.member_id));
    }

    let created = repos.points.create_point_transaction(&record).await?;

    info!(
        member_id = created.member_id,
        points = created.points,
        "Points granted"
    );
    Ok(Json(ApiResponse::success(created)))
}

/// 兑换积分
///
/// POST /api/points/redeem
pub async fn redeem_points(
    State(state): State<AppState>,
    payload: Result<Json<RedeemPointsRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<RedeemResultDto>>, AdminError> {
    let Json(req) = payload?;
    req.validate()?;
    let member_id = required(req.member_id, "memberId")?;
    let rule_id = required(req.rule_id, "ruleId")?;

    let repos = state.repos()?;
    if repos.members.get_member(member_id).await?.is_none() {
        return Err(AdminError::MemberNotFound(member_id));
    }

    match repos.points.redeem(member_id, rule_id, req.remark).await? {
        RedeemOutcome::Redeemed {
            record,
            balance_after,
            rule,
        } => {
            metrics::record_point_redemption(rule_id, "success");
            info!(member_id, rule_id, balance_after, "Redemption completed");
            Ok(Json(ApiResponse::success(RedeemResultDto {
                record,
                balance_after,
                reward: rule.reward,
            })))
        }
        RedeemOutcome::InsufficientPoints { balance, required } => {
            metrics::record_point_redemption(rule_id, "insufficient_points");
            warn!(
                member_id,
                rule_id,
                balance,
                required,
                "Redemption rejected: insufficient points"
            );
            Err(AdminError::InsufficientPoints {
                required,
                available: balance,
            })
        }
        RedeemOutcome::RuleDisabled => {
            metrics::record_point_redemption(rule_id, "rule_disabled");
            Err(AdminError::RuleDisabled(rule_id))
        }
        RedeemOutcome::RuleNotFound => Err(AdminError::RuleNotFound(rule_id)),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use backoffice_shared::config::AppConfig;
    use chrono::Utc;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::models::{Member, MemberStatus};
    use crate::repository::{
        MemoryStore, MockMemberRepositoryTrait, MockPointRepositoryTrait, Repositories,
    };
    use crate::routes;
    use crate::state::AppState;

    fn member(id: i64) -> Member {
        Member {
            id,
            member_no: format!("M{}", id),
            name: "测试会员".to_string(),
            phone: None,
            status: MemberStatus::Active,
            remark: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn rule(id: i64) -> RedemptionRule {
        RedemptionRule {
            id,
            name: "饮品兑换".to_string(),
            description: None,
            points_required: 100,
            reward: "饮品一杯".to_string(),
            enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn app(members: MockMemberRepositoryTrait, points: MockPointRepositoryTrait) -> axum::Router {
        let mut repos = Repositories::in_memory(Arc::new(MemoryStore::new()));
        repos.members = Arc::new(members);
        repos.points = Arc::new(points);
        routes::app(AppState::new(AppConfig::default(), Some(repos)))
    }

    async fn post_redeem(app: axum::Router, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/points/redeem")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_redeem_disabled_rule_is_conflict() {
        let mut members = MockMemberRepositoryTrait::new();
        members
            .expect_get_member()
            .returning(|id| Ok(Some(member(id))));

        let mut points = MockPointRepositoryTrait::new();
        points
            .expect_redeem()
            .times(1)
            .returning(|_, _, _| Ok(RedeemOutcome::RuleDisabled));

        let (status, body) =
            post_redeem(app(members, points), json!({"memberId": 1, "ruleId": 9})).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "RULE_DISABLED");
    }

    #[tokio::test]
    async fn test_redeem_insufficient_points_is_conflict() {
        let mut members = MockMemberRepositoryTrait::new();
        members
            .expect_get_member()
            .returning(|id| Ok(Some(member(id))));

        let mut points = MockPointRepositoryTrait::new();
        points.expect_redeem().times(1).returning(|_, _, _| {
            Ok(RedeemOutcome::InsufficientPoints {
                balance: 40,
                required: 100,
            })
        });

        let (status, body) =
            post_redeem(app(members, points), json!({"memberId": 1, "ruleId": 2})).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "INSUFFICIENT_POINTS");
        assert!(body["error"].as_str().unwrap().contains("40"));
    }

    #[tokio::test]
    async fn test_redeem_requires_rule_id() {
        let members = MockMemberRepositoryTrait::new();
        let points = MockPointRepositoryTrait::new();

        let (status, body) = post_redeem(app(members, points), json!({"memberId": 1})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("ruleId"));
    }

    #[tokio::test]
    async fn test_redeem_reports_reward_of_locked_rule() {
        let mut members = MockMemberRepositoryTrait::new();
        members
            .expect_get_member()
            .returning(|id| Ok(Some(member(id))));

        let mut points = MockPointRepositoryTrait::new();
        points
            .expect_redeem()
            .withf(|member_id, rule_id, _| *member_id == 1 && *rule_id == 2)
            .times(1)
            .returning(|member_id, rule_id, _| {
                let mut current = rule(rule_id);
                current.reward = "调价后的奖励".to_string();
                Ok(RedeemOutcome::Redeemed {
                    record: PointTransaction {
                        id: 10,
                        member_id,
                        rule_id: Some(rule_id),
                        change_type: crate::models::PointChangeType::Redeem,
                        points: -current.points_required,
                        remark: None,
                        created_at: Utc::now(),
                    },
                    balance_after: 20,
                    rule: current,
                })
            });

        let (status, body) =
            post_redeem(app(members, points), json!({"memberId": 1, "ruleId": 2})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["reward"], "调价后的奖励");
        assert_eq!(body["data"]["balanceAfter"], 20);
    }

    #[tokio::test]
    async fn test_grant_that_overflows_balance_is_rejected() {
        let mut members = MockMemberRepositoryTrait::new();
        members
            .expect_get_member()
            .returning(|id| Ok(Some(member(id))));

        let mut points = MockPointRepositoryTrait::new();
        points.expect_balance().returning(|_| Ok(i64::MAX - 10));
        points.expect_create_point_transaction().times(0);

        let response = app(members, points)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/points")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({"memberId": 1, "points": 100}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "BALANCE_OUT_OF_RANGE");
    }
}

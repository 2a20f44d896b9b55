//! 结算 API 处理器
//!
//! 结算是对会员某一时间段（闭区间）交易的汇总快照，生成后不随交易变化。

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::{
    dto::{ApiResponse, CreateSettlementRequest, PageResponse, PaginationParams},
    error::AdminError,
    models::{NewSettlement, Settlement},
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementQueryFilter {
    pub member_id: Option<i64>,
}

/// GET /api/settlements
pub async fn list_settlements(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<SettlementQueryFilter>,
) -> Result<Json<ApiResponse<PageResponse<Settlement>>>, AdminError> {
    let repos = state.repos()?;
    let (items, total) = repos
        .settlements
        .list_settlements(filter.member_id, pagination.offset(), pagination.limit())
        .await?;

    Ok(Json(ApiResponse::success(PageResponse::new(
        items,
        total,
        pagination.page(),
        pagination.limit(),
    ))))
}

/// GET /api/settlements/{id}
pub async fn get_settlement(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Settlement>>, AdminError> {
    let repos = state.repos()?;
    let settlement = repos
        .settlements
        .get_settlement(id)
        .await?
        .ok_or(AdminError::SettlementNotFound(id))?;

    Ok(Json(ApiResponse::success(settlement)))
}

/// 生成结算
///
/// POST /api/settlements
pub async fn create_settlement(
    State(state): State<AppState>,
    payload: Result<Json<CreateSettlementRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Settlement>>, AdminError> {
    let Json(req) = payload?;
    req.validate()?;
    let period = req.into_period()?;

    let repos = state.repos()?;
    if repos.members.get_member(period.member_id).await?.is_none() {
        return Err(AdminError::MemberNotFound(period.member_id));
    }

    let summary = repos
        .transactions
        .summarize(period.member_id, period.period_start, period.period_end)
        .await?;

    let settlement = repos
        .settlements
        .create_settlement(&NewSettlement {
            member_id: period.member_id,
            period_start: period.period_start,
            period_end: period.period_end,
            summary,
            remark: period.remark,
        })
        .await?;

    info!(
        settlement_id = settlement.id,
        member_id = settlement.member_id,
        transaction_count = settlement.transaction_count,
        net_amount = settlement.net_amount,
        "Settlement created"
    );
    Ok(Json(ApiResponse::success(settlement)))
}

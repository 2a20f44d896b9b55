//! 会员 API 处理器
//!
//! 会员编号唯一，冻结会员不能新增交易。

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use tracing::info;
use validator::Validate;

use crate::{
    dto::{
        ApiResponse, CreateMemberRequest, PageResponse, PaginationParams, PointBalanceDto,
        UpdateMemberRequest,
    },
    error::AdminError,
    models::{Member, MemberChanges, MemberFilter},
    state::AppState,
};

/// 获取会员列表（分页，支持关键字与状态过滤）
///
/// GET /api/members
pub async fn list_members(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<MemberFilter>,
) -> Result<Json<ApiResponse<PageResponse<Member>>>, AdminError> {
    let repos = state.repos()?;
    let (items, total) = repos
        .members
        .list_members(&filter, pagination.offset(), pagination.limit())
        .await?;

    Ok(Json(ApiResponse::success(PageResponse::new(
        items,
        total,
        pagination.page(),
        pagination.limit(),
    ))))
}

/// GET /api/members/{id}
pub async fn get_member(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Member>>, AdminError> {
    let repos = state.repos()?;
    let member = repos
        .members
        .get_member(id)
        .await?
        .ok_or(AdminError::MemberNotFound(id))?;

    Ok(Json(ApiResponse::success(member)))
}

/// 创建会员
///
/// POST /api/members
pub async fn create_member(
    State(state): State<AppState>,
    payload: Result<Json<CreateMemberRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Member>>, AdminError> {
    let Json(req) = payload?;
    req.validate()?;
    let new_member = req.into_new_member()?;

    let repos = state.repos()?;
    if repos
        .members
        .find_member_by_no(&new_member.member_no)
        .await?
        .is_some()
    {
        return Err(AdminError::MemberNoTaken(new_member.member_no));
    }

    let member = repos.members.create_member(&new_member).await?;

    info!(member_id = member.id, member_no = %member.member_no, "Member created");
    Ok(Json(ApiResponse::success(member)))
}

/// 更新会员（含冻结/解冻）
///
/// PUT /api/members/{id}
pub async fn update_member(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateMemberRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Member>>, AdminError> {
    let Json(req) = payload?;
    req.validate()?;

    let repos = state.repos()?;
    let member = repos
        .members
        .update_member(id, &MemberChanges::from(req))
        .await?
        .ok_or(AdminError::MemberNotFound(id))?;

    info!(member_id = id, status = member.status.as_str(), "Member updated");
    Ok(Json(ApiResponse::success(member)))
}

/// 查询会员积分余额
///
/// GET /api/members/{id}/points
pub async fn get_member_points(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PointBalanceDto>>, AdminError> {
    let repos = state.repos()?;
    if repos.members.get_member(id).await?.is_none() {
        return Err(AdminError::MemberNotFound(id));
    }

    let balance = repos.points.balance(id).await?;
    Ok(Json(ApiResponse::success(PointBalanceDto {
        member_id: id,
        balance,
    })))
}

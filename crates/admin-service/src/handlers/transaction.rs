//! 买码/兑码交易记录 API 处理器

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use tracing::info;
use validator::Validate;

use crate::{
    dto::{ApiResponse, CreateTransactionRequest, PageResponse, PaginationParams},
    error::AdminError,
    models::{MemberStatus, Transaction, TransactionFilter},
    state::AppState,
};

/// 获取交易记录（分页，可按会员和类型过滤）
///
/// GET /api/transactions
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<TransactionFilter>,
) -> Result<Json<ApiResponse<PageResponse<Transaction>>>, AdminError> {
    let repos = state.repos()?;
    let (items, total) = repos
        .transactions
        .list_transactions(&filter, pagination.offset(), pagination.limit())
        .await?;

    Ok(Json(ApiResponse::success(PageResponse::new(
        items,
        total,
        pagination.page(),
        pagination.limit(),
    ))))
}

/// GET /api/transactions/{id}
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Transaction>>, AdminError> {
    let repos = state.repos()?;
    let transaction = repos
        .transactions
        .get_transaction(id)
        .await?
        .ok_or(AdminError::TransactionNotFound(id))?;

    Ok(Json(ApiResponse::success(transaction)))
}

/// 登记交易
///
/// POST /api/transactions
pub async fn create_transaction(
    State(state): State<AppState>,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Transaction>>, AdminError> {
    let Json(req) = payload?;
    req.validate()?;
    let new_tx = req.into_new_transaction()?;

    let repos = state.repos()?;
    let member = repos
        .members
        .get_member(new_tx.member_id)
        .await?
        .ok_or(AdminError::MemberNotFound(new_tx.member_id))?;

    if member.status == MemberStatus::Frozen {
        return Err(AdminError::MemberFrozen(member.id));
    }

    let transaction = repos.transactions.create_transaction(&new_tx).await?;

    info!(
        transaction_id = transaction.id,
        member_id = transaction.member_id,
        transaction_type = transaction.transaction_type.as_str(),
        amount = transaction.amount,
        "Transaction recorded"
    );
    Ok(Json(ApiResponse::success(transaction)))
}

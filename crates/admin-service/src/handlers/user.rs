//! 后台用户 API 处理器

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use tracing::info;
use validator::Validate;

use crate::{
    dto::{ApiResponse, CreateUserRequest, PageResponse, PaginationParams, UpdateUserRequest},
    error::AdminError,
    models::{User, UserChanges},
    state::AppState,
};

/// 获取用户列表（分页）
///
/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<User>>>, AdminError> {
    let repos = state.repos()?;
    let (items, total) = repos
        .users
        .list_users(pagination.offset(), pagination.limit())
        .await?;

    Ok(Json(ApiResponse::success(PageResponse::new(
        items,
        total,
        pagination.page(),
        pagination.limit(),
    ))))
}

/// 获取单个用户
///
/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<User>>, AdminError> {
    let repos = state.repos()?;
    let user = repos
        .users
        .get_user(id)
        .await?
        .ok_or(AdminError::UserNotFound(id))?;

    Ok(Json(ApiResponse::success(user)))
}

/// 创建用户
///
/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<User>>, AdminError> {
    let Json(req) = payload?;
    req.validate()?;
    let new_user = req.into_new_user()?;

    let repos = state.repos()?;
    if repos
        .users
        .find_user_by_email(&new_user.email)
        .await?
        .is_some()
    {
        return Err(AdminError::EmailTaken(new_user.email));
    }

    let user = repos.users.create_user(&new_user).await?;

    info!(user_id = user.id, email = %user.email, "User created");
    Ok(Json(ApiResponse::success(user)))
}

/// 更新用户
///
/// PUT /api/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<User>>, AdminError> {
    let Json(req) = payload?;
    req.validate()?;
    let changes = UserChanges::from(req);

    let repos = state.repos()?;
    if let Some(email) = &changes.email {
        let owner = repos.users.find_user_by_email(email).await?;
        if owner.is_some_and(|u| u.id != id) {
            return Err(AdminError::EmailTaken(email.clone()));
        }
    }

    let user = repos
        .users
        .update_user(id, &changes)
        .await?
        .ok_or(AdminError::UserNotFound(id))?;

    info!(user_id = id, "User updated");
    Ok(Json(ApiResponse::success(user)))
}

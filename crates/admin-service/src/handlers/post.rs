//! 文章 API 处理器

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use tracing::info;
use validator::Validate;

use crate::{
    dto::{ApiResponse, CreatePostRequest, PageResponse, PaginationParams},
    error::AdminError,
    models::{Post, PostFilter},
    state::AppState,
};

/// 获取文章列表（分页，可按作者和发布状态过滤）
///
/// GET /api/posts
pub async fn list_posts(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<PostFilter>,
) -> Result<Json<ApiResponse<PageResponse<Post>>>, AdminError> {
    let repos = state.repos()?;
    let (items, total) = repos
        .posts
        .list_posts(&filter, pagination.offset(), pagination.limit())
        .await?;

    Ok(Json(ApiResponse::success(PageResponse::new(
        items,
        total,
        pagination.page(),
        pagination.limit(),
    ))))
}

/// GET /api/posts/{id}
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Post>>, AdminError> {
    let repos = state.repos()?;
    let post = repos
        .posts
        .get_post(id)
        .await?
        .ok_or(AdminError::PostNotFound(id))?;

    Ok(Json(ApiResponse::success(post)))
}

/// 创建文章，作者必须存在
///
/// POST /api/posts
pub async fn create_post(
    State(state): State<AppState>,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Post>>, AdminError> {
    let Json(req) = payload?;
    req.validate()?;
    let new_post = req.into_new_post()?;

    let repos = state.repos()?;
    if repos.users.get_user(new_post.author_id).await?.is_none() {
        return Err(AdminError::UserNotFound(new_post.author_id));
    }

    let post = repos.posts.create_post(&new_post).await?;

    info!(post_id = post.id, author_id = post.author_id, "Post created");
    Ok(Json(ApiResponse::success(post)))
}

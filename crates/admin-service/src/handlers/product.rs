//! 商品 API 处理器

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use tracing::info;
use validator::Validate;

use crate::{
    dto::{
        ApiResponse, CreateProductRequest, PageResponse, PaginationParams, UpdateProductRequest,
    },
    error::AdminError,
    models::{Product, ProductChanges},
    state::AppState,
};

/// GET /api/products
pub async fn list_products(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<Product>>>, AdminError> {
    let repos = state.repos()?;
    let (items, total) = repos
        .products
        .list_products(pagination.offset(), pagination.limit())
        .await?;

    Ok(Json(ApiResponse::success(PageResponse::new(
        items,
        total,
        pagination.page(),
        pagination.limit(),
    ))))
}

/// GET /api/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Product>>, AdminError> {
    let repos = state.repos()?;
    let product = repos
        .products
        .get_product(id)
        .await?
        .ok_or(AdminError::ProductNotFound(id))?;

    Ok(Json(ApiResponse::success(product)))
}

/// POST /api/products
pub async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Product>>, AdminError> {
    let Json(req) = payload?;
    req.validate()?;
    let new_product = req.into_new_product()?;

    let repos = state.repos()?;
    let product = repos.products.create_product(&new_product).await?;

    info!(product_id = product.id, name = %product.name, "Product created");
    Ok(Json(ApiResponse::success(product)))
}

/// PUT /api/products/{id}
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Product>>, AdminError> {
    let Json(req) = payload?;
    req.validate()?;

    let repos = state.repos()?;
    let product = repos
        .products
        .update_product(id, &ProductChanges::from(req))
        .await?
        .ok_or(AdminError::ProductNotFound(id))?;

    info!(product_id = id, "Product updated");
    Ok(Json(ApiResponse::success(product)))
}

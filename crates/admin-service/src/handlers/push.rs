//! Web Push 设置 API 处理器

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::info;
use validator::Validate;

use crate::{
    dto::{ApiResponse, SubscribeRequest, UnsubscribeRequest, VapidPublicKeyDto},
    error::{AdminError, required_text},
    models::PushSubscription,
    state::AppState,
};

/// 获取 VAPID 公钥，未配置时返回 404
///
/// GET /api/push/vapid-public-key
pub async fn vapid_public_key(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<VapidPublicKeyDto>>, AdminError> {
    let public_key = state
        .config
        .push
        .vapid_public_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| AdminError::NotFound("VAPID_PUBLIC_KEY".to_string()))?;

    Ok(Json(ApiResponse::success(VapidPublicKeyDto { public_key })))
}

/// GET /api/push/subscriptions
pub async fn list_subscriptions(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<PushSubscription>>>, AdminError> {
    let repos = state.repos()?;
    let subs = repos.push.list_subscriptions().await?;
    Ok(Json(ApiResponse::success(subs)))
}

/// 订阅（按 endpoint 插入或更新）
///
/// POST /api/push/subscribe
pub async fn subscribe(
    State(state): State<AppState>,
    payload: Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<PushSubscription>>, AdminError> {
    let Json(req) = payload?;
    req.validate()?;
    let sub = req.into_new_subscription()?;

    let repos = state.repos()?;
    let saved = repos.push.upsert_subscription(&sub).await?;

    info!(subscription_id = saved.id, "Push subscription saved");
    Ok(Json(ApiResponse::success(saved)))
}

/// 取消订阅
///
/// POST /api/push/unsubscribe
pub async fn unsubscribe(
    State(state): State<AppState>,
    payload: Result<Json<UnsubscribeRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>, AdminError> {
    let Json(req) = payload?;
    req.validate()?;
    let endpoint = required_text(req.endpoint, "endpoint")?;

    let repos = state.repos()?;
    if !repos.push.remove_subscription(&endpoint).await? {
        return Err(AdminError::SubscriptionNotFound(endpoint));
    }

    info!("Push subscription removed");
    Ok(Json(ApiResponse::<()>::success_empty()))
}

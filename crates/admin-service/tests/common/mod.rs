//! 集成测试公共辅助

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use backoffice_admin::{AppState, MemoryStore, Repositories, routes};
use backoffice_shared::config::{AppConfig, DatabaseConfig};
use serde_json::Value;
use tower::ServiceExt;

/// Mock 模式（内存存储）应用
pub fn mock_app() -> Router {
    mock_app_with_config(AppConfig::default())
}

pub fn mock_app_with_config(mut config: AppConfig) -> Router {
    config.database.use_mock = true;
    let repos = Repositories::in_memory(Arc::new(MemoryStore::new()));
    routes::app(AppState::new(config, Some(repos)))
}

/// 未配置数据库的应用
pub fn unconfigured_app() -> Router {
    let state = AppState::from_config(AppConfig::default()).unwrap();
    routes::app(state)
}

/// 指向指定数据库的应用（惰性连接，需在 tokio 运行时内调用）
pub fn postgres_app(database: DatabaseConfig) -> Router {
    let config = AppConfig {
        database,
        ..Default::default()
    };
    routes::app(AppState::from_config(config).unwrap())
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(
        app,
        Request::builder().uri(uri).body(Body::empty()).unwrap(),
    )
    .await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send_json(app, "POST", uri, body).await
}

pub async fn put_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send_json(app, "PUT", uri, body).await
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

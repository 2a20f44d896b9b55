//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射

use axum::{
    Router,
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use backoffice_shared::observability::middleware as obs_middleware;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::{handlers, state::AppState};

/// 连接检查与数据库管理路由
fn database_routes() -> Router<AppState> {
    Router::new()
        .route("/db-status", get(handlers::health::db_status))
        .route("/database/test", get(handlers::health::test_connection))
        .route("/database/init", post(handlers::database::init_database))
        .route("/database/seed", post(handlers::database::seed_database))
        .route("/database/stats", get(handlers::database::database_stats))
        .route("/database/tables", get(handlers::database::list_tables))
        .route(
            "/database/tables/{name}/columns",
            get(handlers::database::table_columns),
        )
        .route(
            "/database/tables/{name}/count",
            get(handlers::database::table_count),
        )
        .route("/stats/overview", get(handlers::stats::get_overview))
}

/// 用户、文章、商品路由
fn content_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            get(handlers::user::list_users).post(handlers::user::create_user),
        )
        .route(
            "/users/{id}",
            get(handlers::user::get_user).put(handlers::user::update_user),
        )
        .route(
            "/posts",
            get(handlers::post::list_posts).post(handlers::post::create_post),
        )
        .route("/posts/{id}", get(handlers::post::get_post))
        .route(
            "/products",
            get(handlers::product::list_products).post(handlers::product::create_product),
        )
        .route(
            "/products/{id}",
            get(handlers::product::get_product).put(handlers::product::update_product),
        )
}

/// 会员、交易、积分、结算路由
fn member_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/members",
            get(handlers::member::list_members).post(handlers::member::create_member),
        )
        .route(
            "/members/{id}",
            get(handlers::member::get_member).put(handlers::member::update_member),
        )
        .route(
            "/members/{id}/points",
            get(handlers::member::get_member_points),
        )
        .route(
            "/transactions",
            get(handlers::transaction::list_transactions)
                .post(handlers::transaction::create_transaction),
        )
        .route(
            "/transactions/{id}",
            get(handlers::transaction::get_transaction),
        )
        .route(
            "/points",
            get(handlers::points::list_point_transactions)
                .post(handlers::points::create_point_transaction),
        )
        .route(
            "/points/rules",
            get(handlers::points::list_rules).post(handlers::points::create_rule),
        )
        .route("/points/rules/{id}", put(handlers::points::update_rule))
        .route("/points/redeem", post(handlers::points::redeem_points))
        .route(
            "/settlements",
            get(handlers::settlement::list_settlements)
                .post(handlers::settlement::create_settlement),
        )
        .route(
            "/settlements/{id}",
            get(handlers::settlement::get_settlement),
        )
}

/// 推送设置路由
fn push_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/push/vapid-public-key",
            get(handlers::push::vapid_public_key),
        )
        .route(
            "/push/subscriptions",
            get(handlers::push::list_subscriptions),
        )
        .route("/push/subscribe", post(handlers::push::subscribe))
        .route("/push/unsubscribe", post(handlers::push::unsubscribe))
}

/// 构建所有 API 路由（挂载在 /api 下）
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(database_routes())
        .merge(content_routes())
        .merge(member_routes())
        .merge(push_routes())
}

/// 构建完整应用：API 路由、探针与中间件
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins, state.config.is_production());

    Router::new()
        .nest("/api", api_routes())
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .layer(middleware::from_fn(security_headers))
        .layer(cors)
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state)
}

/// CORS 配置：逗号分隔的来源列表，`*` 表示允许全部
fn cors_layer(allowed_origins: &str, production: bool) -> CorsLayer {
    if allowed_origins.trim() == "*" {
        if production {
            warn!("CORS 允许全部来源在生产环境中不安全，请设置为具体域名");
        }
        info!("CORS allowed_origins: * (all origins)");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    info!("CORS allowed_origins: {}", allowed_origins);
    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// 为所有响应注入 HTTP 安全头
async fn security_headers(request: Request, next: Next) -> Response {
    const HEADERS: [(&str, &str); 3] = [
        ("x-content-type-options", "nosniff"),
        ("x-frame-options", "DENY"),
        ("x-xss-protection", "0"),
    ];

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    for (name, value) in HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    response
}

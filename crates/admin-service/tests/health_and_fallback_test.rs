//! 连接检查与 Mock 降级集成测试
//!
//! 覆盖三种数据源状态：未配置、不可达、Mock 模式。
//! 不可达场景使用指向 127.0.0.1:1 的惰性连接池，无需真实数据库。

mod common;

use axum::http::StatusCode;
use backoffice_shared::test_utils::{TestAssertions, unreachable_database_config};
use common::{get, mock_app, post_json, postgres_app, unconfigured_app};
use serde_json::json;

#[tokio::test]
async fn test_db_status_without_database_url() {
    let app = unconfigured_app();

    for uri in ["/api/db-status", "/api/database/test"] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "NOT_CONFIGURED");
        TestAssertions::assert_error_mentions(&body, "DATABASE_URL");
    }
}

#[tokio::test]
async fn test_crud_without_database_url_is_bad_request() {
    let app = unconfigured_app();

    let (status, body) = get(&app, "/api/members").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    TestAssertions::assert_error_mentions(&body, "DATABASE_URL");

    let (status, _) = post_json(&app, "/api/database/init", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats_without_database_url_uses_snapshot() {
    let app = unconfigured_app();

    let (status, body) = get(&app, "/api/database/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["usingMock"], true);
    assert_eq!(body["data"]["fallbackReason"], "NOT_CONFIGURED");

    let (status, body) = get(&app, "/api/stats/overview").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["usingMock"], true);
}

#[tokio::test]
async fn test_unreachable_database() {
    let app = postgres_app(unreachable_database_config());

    let (status, body) = get(&app, "/api/db-status").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "CONNECTION_FAILED");

    let (status, body) = get(&app, "/api/database/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["usingMock"], true);
    assert_eq!(body["data"]["fallbackReason"], "PROBE_FAILED");

    let (_, ready) = get(&app, "/ready").await;
    assert_eq!(ready["status"], "degraded");
    assert_eq!(ready["checks"]["database"], "fail");
}

#[tokio::test]
async fn test_mock_snapshot_is_stable() {
    let app = mock_app();

    let (_, first) = get(&app, "/api/database/stats").await;
    let (_, second) = get(&app, "/api/database/stats").await;
    assert_eq!(first["data"], second["data"]);
    assert_eq!(first["data"]["fallbackReason"], "MOCK_MODE");

    // Mock 模式下写入数据不影响统计快照
    let (status, _) = post_json(
        &app,
        "/api/members",
        json!({"memberNo": "S001", "name": "快照"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, third) = get(&app, "/api/database/stats").await;
    assert_eq!(first["data"]["stats"], third["data"]["stats"]);
}

#[tokio::test]
async fn test_db_status_in_mock_mode() {
    let app = mock_app();

    let (status, body) = get(&app, "/api/db-status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "SUCCESS");
    assert_eq!(body["data"]["status"], "mock");
    assert_eq!(body["data"]["usingMock"], true);

    let (status, body) = get(&app, "/api/database/test").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["version"], "in-memory");
}

#[tokio::test]
async fn test_liveness_and_readiness() {
    let app = unconfigured_app();

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (_, ready) = get(&app, "/ready").await;
    assert_eq!(ready["checks"]["database"], "not_configured");
}

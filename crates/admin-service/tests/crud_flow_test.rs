//! 业务资源 CRUD 集成测试
//!
//! 在 Mock 模式（内存存储）下走完整的 HTTP 路由与中间件。

mod common;

use axum::http::StatusCode;
use backoffice_shared::config::AppConfig;
use backoffice_shared::test_utils::TestAssertions;
use common::{get, mock_app, mock_app_with_config, post_json, put_json};
use fake::Fake;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::zh_cn::Name;
use serde_json::{Value, json};

async fn create_member(app: &axum::Router, member_no: &str) -> i64 {
    let (status, body) = post_json(
        app,
        "/api/members",
        json!({"memberNo": member_no, "name": Name().fake::<String>()}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_user_lifecycle() {
    let app = mock_app();

    let (status, body) = post_json(
        &app,
        "/api/users",
        json!({"email": "Ops@Example.com", "name": "运营"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "SUCCESS");
    assert_eq!(body["data"]["email"], "ops@example.com");
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = post_json(
        &app,
        "/api/users",
        json!({"email": "ops@example.com", "name": "重复"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "EMAIL_TAKEN");

    let (status, body) = put_json(&app, &format!("/api/users/{}", id), json!({"name": "运营主管"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "运营主管");
    assert_eq!(body["data"]["email"], "ops@example.com");

    let (status, body) = get(&app, "/api/users/9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "USER_NOT_FOUND");
}

#[tokio::test]
async fn test_missing_required_field_names_the_field() {
    let app = mock_app();

    let cases: [(&str, Value, &str); 5] = [
        ("/api/users", json!({"email": "a@b.com"}), "name"),
        ("/api/products", json!({"name": "月卡"}), "price"),
        ("/api/members", json!({"name": "无编号"}), "memberNo"),
        (
            "/api/transactions",
            json!({"transactionType": "BUY_IN", "amount": 10.0}),
            "memberId",
        ),
        ("/api/points/rules", json!({"name": "规则", "reward": "奖励"}), "pointsRequired"),
    ];

    for (uri, payload, field) in cases {
        let (status, body) = post_json(&app, uri, payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["code"], "MISSING_FIELD");
        TestAssertions::assert_error_mentions(&body, field);
    }
}

#[tokio::test]
async fn test_malformed_body_is_json_error() {
    let app = mock_app();

    let (status, body) = post_json(&app, "/api/members", json!("not an object")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_posts_require_existing_author() {
    let app = mock_app();

    let (status, _) = post_json(&app, "/api/posts", json!({"title": "公告", "authorId": 42})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let email: String = SafeEmail().fake();
    let (_, user) = post_json(&app, "/api/users", json!({"email": email, "name": "作者"})).await;
    let author_id = user["data"]["id"].as_i64().unwrap();

    for (title, published) in [("草稿", false), ("公告", true)] {
        let (status, _) = post_json(
            &app,
            "/api/posts",
            json!({"title": title, "authorId": author_id, "published": published}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = get(&app, &format!("/api/posts?authorId={}&published=true", author_id)).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["title"], "公告");
}

#[tokio::test]
async fn test_product_update() {
    let app = mock_app();

    let (_, body) = post_json(&app, "/api/products", json!({"name": "月卡", "price": 199.0, "stock": 10})).await;
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = put_json(&app, &format!("/api/products/{}", id), json!({"stock": 8})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stock"], 8);
    assert_eq!(body["data"]["price"], 199.0);

    let (status, _) = put_json(&app, "/api/products/404", json!({"stock": 1})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_member_search_and_pagination() {
    let app = mock_app();
    for no in ["VIP001", "VIP002", "REG001"] {
        create_member(&app, no).await;
    }

    let (status, body) = post_json(&app, "/api/members", json!({"memberNo": "VIP001", "name": "重复"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "MEMBER_NO_TAKEN");

    let (_, body) = get(&app, "/api/members?keyword=vip&page=1&pageSize=1").await;
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["pageSize"], 1);
    assert_eq!(body["data"]["totalPages"], 2);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);

    // 无写入时重复查询结果一致
    let (_, again) = get(&app, "/api/members?keyword=vip&page=1&pageSize=1").await;
    assert_eq!(body["data"]["items"], again["data"]["items"]);
}

#[tokio::test]
async fn test_huge_page_number_returns_empty_page() {
    let app = mock_app();
    create_member(&app, "PG001").await;

    let (status, body) = get(&app, "/api/members?page=9223372036854775807").await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["page"], 1_000_000);
    assert_eq!(body["data"]["total"], 1);
    assert!(body["data"]["items"].as_array().unwrap().is_empty());

    let (status, _) = get(&app, "/api/points?page=9223372036854775807&pageSize=100").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_keyword_wildcards_match_literally() {
    let app = mock_app();
    for no in ["W_01", "W001"] {
        create_member(&app, no).await;
    }

    let (_, body) = get(&app, "/api/members?keyword=_").await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["memberNo"], "W_01");

    let (_, body) = get(&app, "/api/members?keyword=%25").await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn test_blank_required_text_is_rejected() {
    let app = mock_app();

    let (status, body) = post_json(&app, "/api/members", json!({"memberNo": "   ", "name": "x"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_FIELD");
    TestAssertions::assert_error_mentions(&body, "memberNo");

    let (status, body) = post_json(
        &app,
        "/api/push/subscribe",
        json!({"endpoint": "https://push.example.com/sub/9", "keys": {"p256dh": "", "auth": ""}}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    TestAssertions::assert_error_mentions(&body, "keys.p256dh");

    let (_, members) = get(&app, "/api/members").await;
    assert_eq!(members["data"]["total"], 0);
    let (_, subs) = get(&app, "/api/push/subscriptions").await;
    assert!(subs["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_oversized_point_grant_is_rejected() {
    let app = mock_app();
    let member_id = create_member(&app, "OV001").await;

    let (status, body) = post_json(
        &app,
        "/api/points",
        json!({"memberId": member_id, "points": i64::MAX}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = post_json(&app, "/api/points", json!({"memberId": member_id, "points": 1})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(&app, &format!("/api/members/{}/points", member_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["balance"], 1);
}

#[tokio::test]
async fn test_transactions_validate_member_and_amount() {
    let app = mock_app();
    let member_id = create_member(&app, "T001").await;

    let (status, _) = post_json(
        &app,
        "/api/transactions",
        json!({"memberId": member_id, "transactionType": "BUY_IN", "amount": 0}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post_json(
        &app,
        "/api/transactions",
        json!({"memberId": 777, "transactionType": "BUY_IN", "amount": 100}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "MEMBER_NOT_FOUND");

    let (status, body) = post_json(
        &app,
        "/api/transactions",
        json!({"memberId": member_id, "transactionType": "CASH_OUT", "amount": 250.5, "chips": 250}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["transactionType"], "CASH_OUT");

    let (status, _) = put_json(&app, &format!("/api/members/{}", member_id), json!({"status": "FROZEN"})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_json(
        &app,
        "/api/transactions",
        json!({"memberId": member_id, "transactionType": "BUY_IN", "amount": 100}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "MEMBER_FROZEN");

    let (_, body) = get(&app, &format!("/api/transactions?memberId={}&transactionType=CASH_OUT", member_id)).await;
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn test_points_grant_and_redeem() {
    let app = mock_app();
    let member_id = create_member(&app, "P001").await;

    let (status, _) = post_json(&app, "/api/points", json!({"memberId": member_id, "points": 0})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post_json(&app, "/api/points", json!({"memberId": member_id, "points": 150})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["changeType"], "EARN");

    let (_, rule) = post_json(
        &app,
        "/api/points/rules",
        json!({"name": "饮品兑换", "pointsRequired": 100, "reward": "饮品一杯"}),
    )
    .await;
    let rule_id = rule["data"]["id"].as_i64().unwrap();

    let (status, body) = post_json(&app, "/api/points/redeem", json!({"memberId": member_id, "ruleId": rule_id})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["balanceAfter"], 50);
    assert_eq!(body["data"]["record"]["points"], -100);
    assert_eq!(body["data"]["record"]["changeType"], "REDEEM");
    assert_eq!(body["data"]["reward"], "饮品一杯");

    let (status, body) = post_json(&app, "/api/points/redeem", json!({"memberId": member_id, "ruleId": rule_id})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INSUFFICIENT_POINTS");

    let (_, body) = get(&app, &format!("/api/members/{}/points", member_id)).await;
    assert_eq!(body["data"]["balance"], 50);

    let (status, _) = put_json(&app, &format!("/api/points/rules/{}", rule_id), json!({"enabled": false})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = post_json(&app, "/api/points/redeem", json!({"memberId": member_id, "ruleId": rule_id})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "RULE_DISABLED");

    let (_, body) = get(&app, &format!("/api/points?memberId={}", member_id)).await;
    assert_eq!(body["data"]["total"], 2);
}

#[tokio::test]
async fn test_settlement_aggregates_period() {
    let app = mock_app();
    let member_id = create_member(&app, "S001").await;

    for (ty, amount, at) in [
        ("BUY_IN", 1000.0, "2026-03-01T10:00:00Z"),
        ("CASH_OUT", 1300.0, "2026-03-02T22:00:00Z"),
        ("BUY_IN", 500.0, "2026-04-01T10:00:00Z"),
    ] {
        let (status, _) = post_json(
            &app,
            "/api/transactions",
            json!({"memberId": member_id, "transactionType": ty, "amount": amount, "occurredAt": at}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = post_json(
        &app,
        "/api/settlements",
        json!({
            "memberId": member_id,
            "periodStart": "2026-03-31T00:00:00Z",
            "periodEnd": "2026-03-01T00:00:00Z"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    TestAssertions::assert_error_mentions(&body, "periodEnd");

    let (status, body) = post_json(
        &app,
        "/api/settlements",
        json!({
            "memberId": member_id,
            "periodStart": "2026-03-01T10:00:00Z",
            "periodEnd": "2026-03-31T23:59:59Z"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["transactionCount"], 2);
    assert_eq!(body["data"]["totalBuyIn"], 1000.0);
    assert_eq!(body["data"]["totalCashOut"], 1300.0);
    assert_eq!(body["data"]["netAmount"], 300.0);

    let id = body["data"]["id"].as_i64().unwrap();
    let (status, _) = get(&app, &format!("/api/settlements/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_push_settings() {
    let app = mock_app();

    let (status, _) = get(&app, "/api/push/vapid-public-key").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let subscription = json!({
        "endpoint": "https://push.example.com/sub/1",
        "keys": {"p256dh": "BNcR", "auth": "tBHI"}
    });
    let (status, first) = post_json(&app, "/api/push/subscribe", subscription.clone()).await;
    assert_eq!(status, StatusCode::OK);

    let mut updated = subscription.clone();
    updated["keys"]["auth"] = json!("rotated");
    let (_, second) = post_json(&app, "/api/push/subscribe", updated).await;
    assert_eq!(first["data"]["id"], second["data"]["id"]);
    assert_eq!(second["data"]["auth"], "rotated");

    let (status, body) = post_json(
        &app,
        "/api/push/subscribe",
        json!({"endpoint": "https://push.example.com/sub/2", "keys": {"p256dh": "x"}}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    TestAssertions::assert_error_mentions(&body, "keys.auth");

    let (_, list) = get(&app, "/api/push/subscriptions").await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);

    let endpoint = json!({"endpoint": "https://push.example.com/sub/1"});
    let (status, _) = post_json(&app, "/api/push/unsubscribe", endpoint.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = post_json(&app, "/api/push/unsubscribe", endpoint).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "SUBSCRIPTION_NOT_FOUND");
}

#[tokio::test]
async fn test_vapid_public_key_from_config() {
    let mut config = AppConfig::default();
    config.push.vapid_public_key = Some("BEl62iUYgUivxIkv69yViEuiBIa".to_string());
    let app = mock_app_with_config(config);

    let (status, body) = get(&app, "/api/push/vapid-public-key").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["publicKey"], "BEl62iUYgUivxIkv69yViEuiBIa");
}

#[tokio::test]
async fn test_seed_and_introspection() {
    let app = mock_app();

    let (status, body) = post_json(&app, "/api/database/seed", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["skipped"], false);
    assert_eq!(body["data"]["members"], 2);

    let (_, body) = post_json(&app, "/api/database/seed", json!({})).await;
    assert_eq!(body["data"]["skipped"], true);

    let (_, body) = get(&app, "/api/database/tables").await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["tableName"].as_str())
        .collect();
    assert!(names.contains(&"members"));
    assert!(names.contains(&"push_subscriptions"));

    let (_, body) = get(&app, "/api/database/tables/members/count").await;
    assert_eq!(body["data"]["rowCount"], 2);

    let (_, body) = get(&app, "/api/database/tables/members/columns").await;
    assert_eq!(body["data"][0]["columnName"], "id");
    assert_eq!(body["data"][0]["ordinalPosition"], 1);

    let (status, _) = get(&app, "/api/database/tables/pg_authid/count").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = post_json(&app, "/api/database/init", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["applied"].as_array().unwrap().is_empty());
}

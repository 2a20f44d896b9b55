//! 数据库探测集成测试
//!
//! 不可达地址的用例无需真实数据库；真实库用例需设置 TEST_DATABASE_URL 并以 --ignored 运行。

use backoffice_shared::database::Database;
use backoffice_shared::error::SharedError;
use backoffice_shared::test_utils::{test_database_config, unreachable_database_config};

#[tokio::test]
async fn test_probe_reports_unreachable_database() {
    let db = Database::connect_lazy(&unreachable_database_config()).unwrap();

    let err = db.probe().await.unwrap_err();
    assert!(matches!(err, SharedError::Database(_)));
    assert!(db.test_connection().await.is_err());
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_migrations_are_idempotent() {
    let db = Database::connect_lazy(&test_database_config()).unwrap();

    let first = db.run_migrations().await.unwrap();
    let second = db.run_migrations().await.unwrap();
    assert_eq!(first.len(), second.len());
    assert!(!first.is_empty());
}

//! Audit storage integration tests (append-only + retention purge).

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use desk_server::audit::{AuditAction, AuditQuery, AuditStorage};

async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:").expect("memory options");
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to apply migrations");
    pool
}

#[tokio::test]
async fn append_assigns_monotonic_ids() {
    let storage = AuditStorage::new(test_pool().await);
    let far_future = shared::util::now_millis() + 1_000_000;

    let first = storage
        .append(
            AuditAction::CaseCreated,
            "case".into(),
            "1".into(),
            Some(7),
            Some("Alice".into()),
            serde_json::json!({"title": "a"}),
            far_future,
        )
        .await
        .expect("append failed");
    let second = storage
        .append(
            AuditAction::CaseStatusChanged,
            "case".into(),
            "1".into(),
            Some(7),
            Some("Alice".into()),
            serde_json::json!({"from": "NEW", "to": "IN_PROGRESS"}),
            far_future,
        )
        .await
        .expect("append failed");

    assert!(second.id > first.id);
}

#[tokio::test]
async fn query_filters_by_resource_type_and_action() {
    let storage = AuditStorage::new(test_pool().await);
    let far_future = shared::util::now_millis() + 1_000_000;

    for (action, resource) in [
        (AuditAction::CaseCreated, "case"),
        (AuditAction::RoleCreated, "role"),
        (AuditAction::CaseStatusChanged, "case"),
    ] {
        storage
            .append(
                action,
                resource.into(),
                "1".into(),
                None,
                None,
                serde_json::json!({}),
                far_future,
            )
            .await
            .expect("append failed");
    }

    let (items, total) = storage
        .query(&AuditQuery {
            resource_type: Some("case".into()),
            ..Default::default()
        })
        .await
        .expect("query failed");
    assert_eq!(total, 2);
    assert_eq!(items.len(), 2);
    // Newest first
    assert_eq!(items[0].action, AuditAction::CaseStatusChanged);

    let (items, total) = storage
        .query(&AuditQuery {
            action: Some(AuditAction::RoleCreated),
            ..Default::default()
        })
        .await
        .expect("query failed");
    assert_eq!(total, 1);
    assert_eq!(items[0].resource_type, "role");
}

#[tokio::test]
async fn purge_removes_only_entries_past_retention() {
    let storage = AuditStorage::new(test_pool().await);
    let now = shared::util::now_millis();

    storage
        .append(
            AuditAction::LoginSuccess,
            "auth".into(),
            "user:1".into(),
            None,
            None,
            serde_json::json!({}),
            now - 1, // already expired
        )
        .await
        .expect("append failed");
    storage
        .append(
            AuditAction::LoginSuccess,
            "auth".into(),
            "user:2".into(),
            None,
            None,
            serde_json::json!({}),
            now + 1_000_000,
        )
        .await
        .expect("append failed");

    let deleted = storage.purge_expired(now).await.expect("purge failed");
    assert_eq!(deleted, 1);

    let (items, total) = storage
        .query(&AuditQuery::default())
        .await
        .expect("query failed");
    assert_eq!(total, 1);
    assert_eq!(items[0].resource_id, "user:2");
}

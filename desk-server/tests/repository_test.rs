//! Repository integration tests over an in-memory SQLite database.
//!
//! One connection (max_connections = 1) so every query sees the same
//! in-memory database; migrations run once per test pool.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use desk_server::auth::engine;
use desk_server::db::repository::support_case::CaseFilter;
use desk_server::db::repository::{
    RepoError, customer as customer_repo, dashboard as dashboard_repo, role as role_repo,
    sla as sla_repo, support_case as case_repo, user as user_repo,
};
use shared::models::{
    CaseCreate, CasePriority, CaseStatus, CoverageScope, CustomerCreate, PagePermission,
    PermissionLevel, RoleCreate, SlaThresholdCreate, SlaThresholdUpdate, UserCreate,
};

async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("memory options")
        .pragma("foreign_keys", "ON");
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

async fn seed_customer(pool: &SqlitePool, name: &str) -> i64 {
    customer_repo::create(
        pool,
        &CustomerCreate {
            name: name.to_string(),
            email: None,
            phone: None,
        },
    )
    .await
    .expect("Failed to create customer")
    .id
}

fn role_payload(name: &str, permissions: Vec<PagePermission>) -> (RoleCreate, Vec<PagePermission>) {
    (
        RoleCreate {
            name: name.to_string(),
            description: None,
            permissions: permissions.clone(),
            permission_string: None,
        },
        permissions,
    )
}

#[tokio::test]
async fn role_permissions_round_trip_through_json_column() {
    let pool = test_pool().await;

    let grants = vec![
        PagePermission::new("Cases", PermissionLevel::ReadOnly),
        PagePermission::new("Admin", PermissionLevel::FullControl),
    ];
    let (payload, permissions) = role_payload("support-lead", grants.clone());
    let role = role_repo::create(&pool, &payload, &permissions)
        .await
        .expect("Failed to create role");

    let loaded = role_repo::find_by_id(&pool, role.id)
        .await
        .expect("Failed to load role")
        .expect("Role missing");
    assert_eq!(loaded.permissions, grants);

    // Duplicate names are rejected
    let (dup, dup_perms) = role_payload("support-lead", vec![]);
    let err = role_repo::create(&pool, &dup, &dup_perms).await.unwrap_err();
    assert!(matches!(err, RepoError::Duplicate(_)));
}

#[tokio::test]
async fn resolve_grants_reflects_assignments_and_active_flag() {
    let pool = test_pool().await;

    let (payload, permissions) = role_payload(
        "agent",
        vec![PagePermission::new("Cases", PermissionLevel::ReadOnly)],
    );
    let role = role_repo::create(&pool, &payload, &permissions)
        .await
        .expect("Failed to create role");

    let user = user_repo::create(
        &pool,
        &UserCreate {
            username: "alice".into(),
            password: "unused".into(),
            display_name: "Alice".into(),
            preferred_language: "en".into(),
        },
        "argon2-hash-placeholder",
    )
    .await
    .expect("Failed to create user");

    // No roles yet: resolvable, but denied everything
    let grants = engine::resolve_grants(&pool, "alice")
        .await
        .expect("resolve failed")
        .expect("user missing");
    assert!(!grants.can_access("Cases", &[PermissionLevel::ReadOnly, PermissionLevel::FullControl]));

    user_repo::replace_roles(&pool, user.id, &[role.id])
        .await
        .expect("Failed to assign role");

    let grants = engine::resolve_grants(&pool, "alice")
        .await
        .expect("resolve failed")
        .expect("user missing");
    assert!(grants.can_access("Cases", &[PermissionLevel::ReadOnly, PermissionLevel::FullControl]));
    assert!(!grants.can_access("Cases", &[PermissionLevel::FullControl]));

    // Deactivation denies everything, grants or not
    user_repo::update(
        &pool,
        user.id,
        &shared::models::UserUpdate {
            display_name: None,
            password: None,
            preferred_language: None,
            is_active: Some(false),
        },
        None,
    )
    .await
    .expect("Failed to deactivate");

    let grants = engine::resolve_grants(&pool, "alice")
        .await
        .expect("resolve failed")
        .expect("user missing");
    assert!(!grants.is_active);
    assert!(!grants.can_access("Cases", &[PermissionLevel::ReadOnly, PermissionLevel::FullControl]));

    // Unknown usernames resolve to None
    assert!(
        engine::resolve_grants(&pool, "nobody")
            .await
            .expect("resolve failed")
            .is_none()
    );
}

#[tokio::test]
async fn activating_a_threshold_displaces_the_previous_active_row() {
    let pool = test_pool().await;

    let first = sla_repo::create(
        &pool,
        &SlaThresholdCreate {
            priority: CasePriority::High,
            response_hours: 4,
            resolution_hours: 24,
            is_active: true,
        },
    )
    .await
    .expect("Failed to create threshold");

    let second = sla_repo::create(
        &pool,
        &SlaThresholdCreate {
            priority: CasePriority::High,
            response_hours: 2,
            resolution_hours: 8,
            is_active: true,
        },
    )
    .await
    .expect("Failed to create threshold");

    let active = sla_repo::find_active_for_priority(&pool, CasePriority::High)
        .await
        .expect("Failed to query active")
        .expect("No active threshold");
    assert_eq!(active.id, second.id);

    let first_reloaded = sla_repo::find_by_id(&pool, first.id)
        .await
        .expect("Failed to reload")
        .expect("Row missing");
    assert!(!first_reloaded.is_active);

    // Re-activating the first displaces the second again
    sla_repo::update(
        &pool,
        first.id,
        &SlaThresholdUpdate {
            response_hours: None,
            resolution_hours: None,
            is_active: Some(true),
        },
    )
    .await
    .expect("Failed to update");
    let active = sla_repo::find_active_for_priority(&pool, CasePriority::High)
        .await
        .expect("Failed to query active")
        .expect("No active threshold");
    assert_eq!(active.id, first.id);
}

fn case_payload(customer_id: i64, priority: CasePriority) -> CaseCreate {
    CaseCreate {
        title: "VPN tunnel flapping".into(),
        description: None,
        priority,
        customer_id,
        order_id: None,
        assigned_user_id: None,
        system_id: None,
        component_id: None,
        site_id: None,
    }
}

#[tokio::test]
async fn case_status_machine_stamps_timestamps() {
    let pool = test_pool().await;
    let customer_id = seed_customer(&pool, "Acme").await;

    let case = case_repo::create(&pool, &case_payload(customer_id, CasePriority::High), None)
        .await
        .expect("Failed to create case");
    assert_eq!(case.status, CaseStatus::New);
    assert!(case.first_response_at.is_none());

    // Illegal shortcut is rejected
    let err = case_repo::update_status(&pool, case.id, CaseStatus::Closed)
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Business(_)));

    // Leaving NEW stamps the first response
    let case = case_repo::update_status(&pool, case.id, CaseStatus::InProgress)
        .await
        .expect("transition failed");
    assert!(case.first_response_at.is_some());
    assert!(case.resolved_at.is_none());

    // Resolution stamps resolved_at; reopening clears it
    let case = case_repo::update_status(&pool, case.id, CaseStatus::Resolved)
        .await
        .expect("transition failed");
    assert!(case.resolved_at.is_some());

    let case = case_repo::update_status(&pool, case.id, CaseStatus::InProgress)
        .await
        .expect("reopen failed");
    assert!(case.resolved_at.is_none());
    // The original first response survives the reopen
    assert!(case.first_response_at.is_some());
}

#[tokio::test]
async fn threshold_change_recomputes_open_cases_only() {
    let pool = test_pool().await;
    let customer_id = seed_customer(&pool, "Acme").await;

    let open = case_repo::create(&pool, &case_payload(customer_id, CasePriority::High), None)
        .await
        .expect("create failed");
    let resolved = case_repo::create(&pool, &case_payload(customer_id, CasePriority::High), None)
        .await
        .expect("create failed");
    case_repo::update_status(&pool, resolved.id, CaseStatus::InProgress)
        .await
        .expect("transition failed");
    case_repo::update_status(&pool, resolved.id, CaseStatus::Resolved)
        .await
        .expect("transition failed");

    let affected = case_repo::recompute_deadlines_for_priority(&pool, CasePriority::High, Some(24))
        .await
        .expect("recompute failed");
    assert_eq!(affected, 1);

    let open = case_repo::find_by_id(&pool, open.id)
        .await
        .expect("load failed")
        .expect("case missing");
    assert_eq!(
        open.sla_deadline,
        Some(open.created_at + 24 * 60 * 60 * 1000)
    );

    let resolved = case_repo::find_by_id(&pool, resolved.id)
        .await
        .expect("load failed")
        .expect("case missing");
    assert!(resolved.sla_deadline.is_none());

    // Clearing the threshold clears open deadlines again
    case_repo::recompute_deadlines_for_priority(&pool, CasePriority::High, None)
        .await
        .expect("recompute failed");
    let open = case_repo::find_by_id(&pool, open.id)
        .await
        .expect("load failed")
        .expect("case missing");
    assert!(open.sla_deadline.is_none());
}

#[tokio::test]
async fn dashboard_rates_are_zero_on_empty_data() {
    let pool = test_pool().await;

    let metrics = dashboard_repo::compute(
        &pool,
        &CoverageScope::AllCustomers,
        shared::util::now_millis(),
    )
    .await
    .expect("compute failed");

    assert_eq!(metrics.cases.total, 0);
    assert_eq!(metrics.cases.resolution_rate, 0.0);
    assert_eq!(metrics.cases.sla_compliance_rate, 0.0);
    assert_eq!(metrics.proposals.total, 0);
    assert_eq!(metrics.projects.total, 0);
}

#[tokio::test]
async fn dashboard_scope_filters_by_customer() {
    let pool = test_pool().await;
    let acme = seed_customer(&pool, "Acme").await;
    let globex = seed_customer(&pool, "Globex").await;

    case_repo::create(&pool, &case_payload(acme, CasePriority::High), None)
        .await
        .expect("create failed");
    case_repo::create(&pool, &case_payload(acme, CasePriority::Low), None)
        .await
        .expect("create failed");
    case_repo::create(&pool, &case_payload(globex, CasePriority::High), None)
        .await
        .expect("create failed");

    let now = shared::util::now_millis();

    let all = dashboard_repo::compute(&pool, &CoverageScope::AllCustomers, now)
        .await
        .expect("compute failed");
    assert_eq!(all.cases.total, 3);

    let acme_only = dashboard_repo::compute(&pool, &CoverageScope::Customers(vec![acme]), now)
        .await
        .expect("compute failed");
    assert_eq!(acme_only.cases.total, 2);

    // An empty coverage set resolves to AllCustomers before it ever reaches
    // the aggregation — the dashboard never sees an empty filter
    let via_empty = dashboard_repo::compute(
        &pool,
        &CoverageScope::from_customer_ids(vec![]),
        now,
    )
    .await
    .expect("compute failed");
    assert_eq!(via_empty.cases.total, 3);
}

#[tokio::test]
async fn case_filter_by_status_and_customer() {
    let pool = test_pool().await;
    let acme = seed_customer(&pool, "Acme").await;

    let a = case_repo::create(&pool, &case_payload(acme, CasePriority::High), None)
        .await
        .expect("create failed");
    case_repo::create(&pool, &case_payload(acme, CasePriority::Low), None)
        .await
        .expect("create failed");
    case_repo::update_status(&pool, a.id, CaseStatus::InProgress)
        .await
        .expect("transition failed");

    let in_progress = case_repo::find_all(
        &pool,
        &CaseFilter {
            status: Some(CaseStatus::InProgress),
            priority: None,
            customer_id: Some(acme),
            assigned_user_id: None,
        },
    )
    .await
    .expect("query failed");
    assert_eq!(in_progress.len(), 1);
    assert_eq!(in_progress[0].id, a.id);
}

#[tokio::test]
async fn role_coverage_replaces_and_cascades_on_delete() {
    let pool = test_pool().await;
    let acme = seed_customer(&pool, "Acme").await;
    let globex = seed_customer(&pool, "Globex").await;

    let (payload, permissions) = role_payload("regional", vec![]);
    let role = role_repo::create(&pool, &payload, &permissions)
        .await
        .expect("create failed");

    role_repo::replace_coverage(&pool, role.id, &[acme, globex])
        .await
        .expect("coverage failed");
    let ids = role_repo::coverage_for_role(&pool, role.id)
        .await
        .expect("query failed");
    assert_eq!(ids.len(), 2);

    role_repo::replace_coverage(&pool, role.id, &[globex])
        .await
        .expect("coverage failed");
    let ids = role_repo::coverage_for_role(&pool, role.id)
        .await
        .expect("query failed");
    assert_eq!(ids, vec![globex]);

    // Deleting the role removes its coverage rows (FK cascade)
    role_repo::delete(&pool, role.id).await.expect("delete failed");
    let orphans = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM role_coverage WHERE role_id = ?",
    )
    .bind(role.id)
    .fetch_one(&pool)
    .await
    .expect("count failed");
    assert_eq!(orphans, 0);
}

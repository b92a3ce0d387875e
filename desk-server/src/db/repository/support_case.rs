//! Support Case Repository
//!
//! Owns the status-machine side effects: first_response_at is stamped when a
//! case first leaves NEW, resolved_at is stamped on RESOLVED and cleared on
//! reopen. `sla_deadline` values are computed by the caller (handlers own the
//! threshold lookup) and passed in.

use super::{RepoError, RepoResult};
use serde::Deserialize;
use shared::models::{CaseCreate, CasePriority, CaseStatus, CaseUpdate, SupportCase};
use sqlx::SqlitePool;

const CASE_SELECT: &str = "SELECT id, title, description, priority, status, customer_id, order_id, assigned_user_id, system_id, component_id, site_id, created_at, updated_at, first_response_at, resolved_at, sla_deadline FROM support_case";

/// List filters (all optional, combined with AND)
#[derive(Debug, Default, Deserialize)]
pub struct CaseFilter {
    pub status: Option<CaseStatus>,
    pub priority: Option<CasePriority>,
    pub customer_id: Option<i64>,
    pub assigned_user_id: Option<i64>,
}

pub async fn find_all(pool: &SqlitePool, filter: &CaseFilter) -> RepoResult<Vec<SupportCase>> {
    let mut conditions = Vec::new();
    if filter.status.is_some() {
        conditions.push("status = ?");
    }
    if filter.priority.is_some() {
        conditions.push("priority = ?");
    }
    if filter.customer_id.is_some() {
        conditions.push("customer_id = ?");
    }
    if filter.assigned_user_id.is_some() {
        conditions.push("assigned_user_id = ?");
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    let sql = format!("{CASE_SELECT}{where_clause} ORDER BY created_at DESC");

    let mut query = sqlx::query_as::<_, SupportCase>(&sql);
    if let Some(status) = filter.status {
        query = query.bind(status);
    }
    if let Some(priority) = filter.priority {
        query = query.bind(priority);
    }
    if let Some(customer_id) = filter.customer_id {
        query = query.bind(customer_id);
    }
    if let Some(assigned) = filter.assigned_user_id {
        query = query.bind(assigned);
    }

    let rows = query.fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<SupportCase>> {
    let sql = format!("{CASE_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, SupportCase>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// `sla_deadline` is derived from the active threshold for the priority;
/// None = no SLA tracked.
pub async fn create(
    pool: &SqlitePool,
    data: &CaseCreate,
    sla_deadline: Option<i64>,
) -> RepoResult<SupportCase> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO support_case (id, title, description, priority, status, customer_id, order_id, assigned_user_id, system_id, component_id, site_id, created_at, updated_at, sla_deadline) VALUES (?, ?, ?, ?, 'NEW', ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(&data.title)
    .bind(&data.description)
    .bind(data.priority)
    .bind(data.customer_id)
    .bind(data.order_id)
    .bind(data.assigned_user_id)
    .bind(data.system_id)
    .bind(data.component_id)
    .bind(data.site_id)
    .bind(now)
    .bind(now)
    .bind(sla_deadline)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create case".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: &CaseUpdate) -> RepoResult<SupportCase> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE support_case SET title = COALESCE(?1, title), description = COALESCE(?2, description), priority = COALESCE(?3, priority), order_id = COALESCE(?4, order_id), system_id = COALESCE(?5, system_id), component_id = COALESCE(?6, component_id), site_id = COALESCE(?7, site_id), updated_at = ?8 WHERE id = ?9",
    )
    .bind(&data.title)
    .bind(&data.description)
    .bind(data.priority)
    .bind(data.order_id)
    .bind(data.system_id)
    .bind(data.component_id)
    .bind(data.site_id)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Case {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Case {id} not found")))
}

/// Apply a status transition, validating against the state machine.
pub async fn update_status(
    pool: &SqlitePool,
    id: i64,
    next: CaseStatus,
) -> RepoResult<SupportCase> {
    let existing = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Case {id} not found")))?;

    if !existing.status.can_transition_to(next) {
        return Err(RepoError::Business(format!(
            "Illegal status transition {} -> {}",
            existing.status.as_str(),
            next.as_str()
        )));
    }

    let now = shared::util::now_millis();

    // First departure from NEW counts as the first response
    let first_response_at = match existing.first_response_at {
        Some(ts) => Some(ts),
        None if existing.status == CaseStatus::New => Some(now),
        None => None,
    };

    // RESOLVED stamps resolved_at; reopening clears it
    let resolved_at = match next {
        CaseStatus::Resolved => Some(now),
        CaseStatus::Closed => existing.resolved_at,
        _ => None,
    };

    sqlx::query(
        "UPDATE support_case SET status = ?, first_response_at = ?, resolved_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(next)
    .bind(first_response_at)
    .bind(resolved_at)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Case {id} not found")))
}

pub async fn assign(pool: &SqlitePool, id: i64, user_id: Option<i64>) -> RepoResult<SupportCase> {
    let now = shared::util::now_millis();
    let rows =
        sqlx::query("UPDATE support_case SET assigned_user_id = ?, updated_at = ? WHERE id = ?")
            .bind(user_id)
            .bind(now)
            .bind(id)
            .execute(pool)
            .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Case {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Case {id} not found")))
}

/// Overwrite the derived deadline (after a priority change)
pub async fn set_sla_deadline(
    pool: &SqlitePool,
    id: i64,
    sla_deadline: Option<i64>,
) -> RepoResult<()> {
    sqlx::query("UPDATE support_case SET sla_deadline = ? WHERE id = ?")
        .bind(sla_deadline)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Recompute deadlines for all unresolved cases of a priority after the
/// active threshold changed. `resolution_hours = None` clears the deadline
/// (no SLA tracked any more).
pub async fn recompute_deadlines_for_priority(
    pool: &SqlitePool,
    priority: CasePriority,
    resolution_hours: Option<i64>,
) -> RepoResult<u64> {
    let rows = match resolution_hours {
        Some(hours) => {
            let offset = shared::util::hours_to_millis(hours);
            sqlx::query(
                "UPDATE support_case SET sla_deadline = created_at + ? WHERE priority = ? AND resolved_at IS NULL",
            )
            .bind(offset)
            .bind(priority)
            .execute(pool)
            .await?
        }
        None => {
            sqlx::query(
                "UPDATE support_case SET sla_deadline = NULL WHERE priority = ? AND resolved_at IS NULL",
            )
            .bind(priority)
            .execute(pool)
            .await?
        }
    };
    Ok(rows.rows_affected())
}

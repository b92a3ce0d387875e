//! SLA Threshold Repository
//!
//! Storage does not enforce "one active row per priority"; this module does,
//! by deactivating sibling rows inside the same transaction whenever a row
//! becomes active.

use super::{RepoError, RepoResult};
use shared::models::{CasePriority, SlaThreshold, SlaThresholdCreate, SlaThresholdUpdate};
use sqlx::SqlitePool;

const SLA_SELECT: &str =
    "SELECT id, priority, response_hours, resolution_hours, is_active FROM sla_threshold";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<SlaThreshold>> {
    let sql = format!("{SLA_SELECT} ORDER BY priority, id");
    let rows = sqlx::query_as::<_, SlaThreshold>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<SlaThreshold>> {
    let sql = format!("{SLA_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, SlaThreshold>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// All currently active rows (the SLA lookup table for deadline computation)
pub async fn find_active(pool: &SqlitePool) -> RepoResult<Vec<SlaThreshold>> {
    let sql = format!("{SLA_SELECT} WHERE is_active = 1 ORDER BY priority");
    let rows = sqlx::query_as::<_, SlaThreshold>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_active_for_priority(
    pool: &SqlitePool,
    priority: CasePriority,
) -> RepoResult<Option<SlaThreshold>> {
    let sql = format!("{SLA_SELECT} WHERE is_active = 1 AND priority = ? LIMIT 1");
    let row = sqlx::query_as::<_, SlaThreshold>(&sql)
        .bind(priority)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: &SlaThresholdCreate) -> RepoResult<SlaThreshold> {
    let id = shared::util::snowflake_id();
    let mut tx = pool.begin().await?;

    if data.is_active {
        sqlx::query("UPDATE sla_threshold SET is_active = 0 WHERE priority = ?")
            .bind(data.priority)
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query(
        "INSERT INTO sla_threshold (id, priority, response_hours, resolution_hours, is_active) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(data.priority)
    .bind(data.response_hours)
    .bind(data.resolution_hours)
    .bind(data.is_active)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create SLA threshold".into()))
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    data: &SlaThresholdUpdate,
) -> RepoResult<SlaThreshold> {
    let existing = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("SLA threshold {id} not found")))?;

    let mut tx = pool.begin().await?;

    // Becoming active displaces any other active row for the priority
    if data.is_active == Some(true) {
        sqlx::query("UPDATE sla_threshold SET is_active = 0 WHERE priority = ? AND id != ?")
            .bind(existing.priority)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query(
        "UPDATE sla_threshold SET response_hours = COALESCE(?1, response_hours), resolution_hours = COALESCE(?2, resolution_hours), is_active = COALESCE(?3, is_active) WHERE id = ?4",
    )
    .bind(data.response_hours)
    .bind(data.resolution_hours)
    .bind(data.is_active)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("SLA threshold {id} not found")))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM sla_threshold WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

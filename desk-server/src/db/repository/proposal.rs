//! Proposal Repository

use super::{RepoError, RepoResult};
use shared::models::{Proposal, ProposalCreate, ProposalStage, ProposalStatus, ProposalUpdate};
use sqlx::SqlitePool;

const PROPOSAL_SELECT: &str = "SELECT id, title, customer_id, amount, owner_user_id, status, stage, created_at, updated_at FROM proposal";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Proposal>> {
    let sql = format!("{PROPOSAL_SELECT} ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, Proposal>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Proposal>> {
    let sql = format!("{PROPOSAL_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Proposal>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: &ProposalCreate) -> RepoResult<Proposal> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO proposal (id, title, customer_id, amount, owner_user_id, status, stage, created_at, updated_at) VALUES (?, ?, ?, ?, ?, 'DRAFT', 'CONTACT', ?, ?)",
    )
    .bind(id)
    .bind(&data.title)
    .bind(data.customer_id)
    .bind(data.amount)
    .bind(data.owner_user_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create proposal".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: &ProposalUpdate) -> RepoResult<Proposal> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE proposal SET title = COALESCE(?1, title), amount = COALESCE(?2, amount), owner_user_id = COALESCE(?3, owner_user_id), status = COALESCE(?4, status), stage = COALESCE(?5, stage), updated_at = ?6 WHERE id = ?7",
    )
    .bind(&data.title)
    .bind(data.amount)
    .bind(data.owner_user_id)
    .bind(data.status)
    .bind(data.stage)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Proposal {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Proposal {id} not found")))
}

/// Status and stage are orthogonal; these move exactly one of them.
pub async fn set_status(
    pool: &SqlitePool,
    id: i64,
    status: ProposalStatus,
) -> RepoResult<Proposal> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE proposal SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Proposal {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Proposal {id} not found")))
}

pub async fn set_stage(pool: &SqlitePool, id: i64, stage: ProposalStage) -> RepoResult<Proposal> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE proposal SET stage = ?, updated_at = ? WHERE id = ?")
        .bind(stage)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Proposal {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Proposal {id} not found")))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM proposal WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

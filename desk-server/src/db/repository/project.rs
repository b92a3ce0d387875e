//! Project Repository

use super::{RepoError, RepoResult};
use shared::models::{Project, ProjectCreate, ProjectUpdate};
use sqlx::SqlitePool;

const PROJECT_SELECT: &str =
    "SELECT id, name, customer_id, status, start_at, end_at, created_at, updated_at FROM project";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Project>> {
    let sql = format!("{PROJECT_SELECT} ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, Project>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Project>> {
    let sql = format!("{PROJECT_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Project>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: &ProjectCreate) -> RepoResult<Project> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO project (id, name, customer_id, status, start_at, end_at, created_at, updated_at) VALUES (?, ?, ?, 'PLANNED', ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(data.customer_id)
    .bind(data.start_at)
    .bind(data.end_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create project".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: &ProjectUpdate) -> RepoResult<Project> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE project SET name = COALESCE(?1, name), status = COALESCE(?2, status), start_at = COALESCE(?3, start_at), end_at = COALESCE(?4, end_at), updated_at = ?5 WHERE id = ?6",
    )
    .bind(&data.name)
    .bind(data.status)
    .bind(data.start_at)
    .bind(data.end_at)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Project {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Project {id} not found")))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM project WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

//! Entity File Repository

use super::{RepoError, RepoResult};
use shared::models::EntityFile;
use sqlx::SqlitePool;

const FILE_SELECT: &str = "SELECT id, entity_type, entity_id, original_name, stored_name, content_type, size_bytes, compressed, has_thumbnail, uploaded_by, created_at FROM entity_file";

#[allow(clippy::too_many_arguments)]
pub async fn insert(
    pool: &SqlitePool,
    entity_type: &str,
    entity_id: i64,
    original_name: &str,
    stored_name: &str,
    content_type: &str,
    size_bytes: i64,
    compressed: bool,
    has_thumbnail: bool,
    uploaded_by: Option<i64>,
) -> RepoResult<EntityFile> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO entity_file (id, entity_type, entity_id, original_name, stored_name, content_type, size_bytes, compressed, has_thumbnail, uploaded_by, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(entity_type)
    .bind(entity_id)
    .bind(original_name)
    .bind(stored_name)
    .bind(content_type)
    .bind(size_bytes)
    .bind(compressed)
    .bind(has_thumbnail)
    .bind(uploaded_by)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to record file".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<EntityFile>> {
    let sql = format!("{FILE_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, EntityFile>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_entity(
    pool: &SqlitePool,
    entity_type: &str,
    entity_id: i64,
) -> RepoResult<Vec<EntityFile>> {
    let sql = format!("{FILE_SELECT} WHERE entity_type = ? AND entity_id = ? ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, EntityFile>(&sql)
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM entity_file WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

//! User Repository

use super::{RepoError, RepoResult};
use shared::models::{Role, User, UserCreate, UserRoleAssignment, UserUpdate};
use sqlx::SqlitePool;

const USER_SELECT: &str = "SELECT id, username, display_name, password_hash, preferred_language, is_system, is_active, created_at, updated_at FROM user";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<User>> {
    let sql = format!("{USER_SELECT} WHERE is_active = 1 ORDER BY username");
    let users = sqlx::query_as::<_, User>(&sql).fetch_all(pool).await?;
    Ok(users)
}

pub async fn find_all_with_inactive(pool: &SqlitePool) -> RepoResult<Vec<User>> {
    let sql = format!("{USER_SELECT} ORDER BY username");
    let users = sqlx::query_as::<_, User>(&sql).fetch_all(pool).await?;
    Ok(users)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let sql = format!("{USER_SELECT} WHERE id = ?");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> RepoResult<Option<User>> {
    let sql = format!("{USER_SELECT} WHERE username = ? LIMIT 1");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn create(pool: &SqlitePool, data: &UserCreate, password_hash: &str) -> RepoResult<User> {
    if find_by_username(pool, &data.username).await?.is_some() {
        return Err(RepoError::Duplicate(format!(
            "Username '{}' already exists",
            data.username
        )));
    }

    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO user (id, username, display_name, password_hash, preferred_language, is_system, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, 0, 1, ?, ?)",
    )
    .bind(id)
    .bind(&data.username)
    .bind(&data.display_name)
    .bind(password_hash)
    .bind(&data.preferred_language)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create user".into()))
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    data: &UserUpdate,
    password_hash: Option<&str>,
) -> RepoResult<User> {
    let existing = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))?;

    if existing.is_system && data.is_active == Some(false) {
        return Err(RepoError::Business(
            "Cannot deactivate the system user".into(),
        ));
    }

    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE user SET display_name = COALESCE(?1, display_name), password_hash = COALESCE(?2, password_hash), preferred_language = COALESCE(?3, preferred_language), is_active = COALESCE(?4, is_active), updated_at = ?5 WHERE id = ?6",
    )
    .bind(&data.display_name)
    .bind(password_hash)
    .bind(&data.preferred_language)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))
}

/// Soft delete: users are deactivated, never removed
pub async fn deactivate(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let existing = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))?;

    if existing.is_system {
        return Err(RepoError::Business(
            "Cannot deactivate the system user".into(),
        ));
    }

    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE user SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// All active roles assigned to a user
pub async fn roles_for_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<Role>> {
    let roles = sqlx::query_as::<_, Role>(
        "SELECT r.id, r.name, r.description, r.permissions, r.is_system, r.is_active FROM role r JOIN user_role ur ON ur.role_id = r.id WHERE ur.user_id = ? AND r.is_active = 1 ORDER BY r.name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(roles)
}

/// Assignment rows (role id/name + assigned_at) as seen from the user side
pub async fn assignments_for_user(
    pool: &SqlitePool,
    user_id: i64,
) -> RepoResult<Vec<UserRoleAssignment>> {
    let rows = sqlx::query_as::<_, UserRoleAssignment>(
        "SELECT ur.role_id, r.name AS role_name, ur.assigned_at FROM user_role ur JOIN role r ON r.id = ur.role_id WHERE ur.user_id = ? ORDER BY r.name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Replace a user's role assignments with the given set
pub async fn replace_roles(pool: &SqlitePool, user_id: i64, role_ids: &[i64]) -> RepoResult<()> {
    find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {user_id} not found")))?;

    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM user_role WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    for role_id in role_ids {
        sqlx::query("INSERT INTO user_role (user_id, role_id, assigned_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(role_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

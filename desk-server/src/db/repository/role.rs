//! Role Repository

use super::{RepoError, RepoResult};
use shared::models::{PagePermission, Role, RoleCreate, RoleUpdate, UserResponse};
use sqlx::SqlitePool;

const ROLE_SELECT: &str =
    "SELECT id, name, description, permissions, is_system, is_active FROM role";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Role>> {
    let sql = format!("{ROLE_SELECT} WHERE is_active = 1 ORDER BY name");
    let roles = sqlx::query_as::<_, Role>(&sql).fetch_all(pool).await?;
    Ok(roles)
}

pub async fn find_all_with_inactive(pool: &SqlitePool) -> RepoResult<Vec<Role>> {
    let sql = format!("{ROLE_SELECT} ORDER BY name");
    let roles = sqlx::query_as::<_, Role>(&sql).fetch_all(pool).await?;
    Ok(roles)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Role>> {
    let sql = format!("{ROLE_SELECT} WHERE id = ?");
    let role = sqlx::query_as::<_, Role>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(role)
}

pub async fn find_by_name(pool: &SqlitePool, name: &str) -> RepoResult<Option<Role>> {
    let sql = format!("{ROLE_SELECT} WHERE name = ? LIMIT 1");
    let role = sqlx::query_as::<_, Role>(&sql)
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(role)
}

fn permissions_json(permissions: &[PagePermission]) -> String {
    serde_json::to_string(permissions).unwrap_or_else(|_| "[]".to_string())
}

/// `data.permissions` must already be resolved by the handler (typed form,
/// or parsed from the legacy string).
pub async fn create(
    pool: &SqlitePool,
    data: &RoleCreate,
    permissions: &[PagePermission],
) -> RepoResult<Role> {
    if find_by_name(pool, &data.name).await?.is_some() {
        return Err(RepoError::Duplicate(format!(
            "Role '{}' already exists",
            data.name
        )));
    }

    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO role (id, name, description, permissions, is_system, is_active) VALUES (?, ?, ?, ?, 0, 1)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(permissions_json(permissions))
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create role".into()))
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    data: &RoleUpdate,
    permissions: Option<&[PagePermission]>,
) -> RepoResult<Role> {
    let existing = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Role {id} not found")))?;

    if existing.is_system {
        return Err(RepoError::Business("Cannot modify system role".into()));
    }

    let permissions_col = permissions.map(permissions_json);

    let rows = sqlx::query(
        "UPDATE role SET name = COALESCE(?1, name), description = COALESCE(?2, description), permissions = COALESCE(?3, permissions), is_active = COALESCE(?4, is_active) WHERE id = ?5",
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(permissions_col)
    .bind(data.is_active)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Role {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Role {id} not found")))
}

/// Hard delete. user_role / role_coverage rows go with it (FK cascade).
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let existing = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Role {id} not found")))?;

    if existing.is_system {
        return Err(RepoError::Business("Cannot delete system role".into()));
    }

    sqlx::query("DELETE FROM role WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(true)
}

/// Customer IDs in a role's coverage set. Empty means "all customers";
/// callers must go through `CoverageScope::from_customer_ids`.
pub async fn coverage_for_role(pool: &SqlitePool, role_id: i64) -> RepoResult<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT customer_id FROM role_coverage WHERE role_id = ? ORDER BY customer_id",
    )
    .bind(role_id)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

/// Replace a role's coverage set
pub async fn replace_coverage(
    pool: &SqlitePool,
    role_id: i64,
    customer_ids: &[i64],
) -> RepoResult<()> {
    find_by_id(pool, role_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Role {role_id} not found")))?;

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM role_coverage WHERE role_id = ?")
        .bind(role_id)
        .execute(&mut *tx)
        .await?;

    for customer_id in customer_ids {
        sqlx::query("INSERT INTO role_coverage (role_id, customer_id) VALUES (?, ?)")
            .bind(role_id)
            .bind(customer_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Users currently assigned to a role
pub async fn users_for_role(pool: &SqlitePool, role_id: i64) -> RepoResult<Vec<UserResponse>> {
    #[derive(sqlx::FromRow)]
    struct Row {
        id: i64,
        username: String,
        display_name: String,
        preferred_language: String,
        is_system: bool,
        is_active: bool,
        created_at: i64,
        updated_at: i64,
    }

    let rows = sqlx::query_as::<_, Row>(
        "SELECT u.id, u.username, u.display_name, u.preferred_language, u.is_system, u.is_active, u.created_at, u.updated_at FROM user u JOIN user_role ur ON ur.user_id = u.id WHERE ur.role_id = ? ORDER BY u.username",
    )
    .bind(role_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| UserResponse {
            id: r.id,
            username: r.username,
            display_name: r.display_name,
            preferred_language: r.preferred_language,
            is_system: r.is_system,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
        .collect())
}

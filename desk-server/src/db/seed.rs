//! First-run seeding
//!
//! Ensures the built-in roles and the system admin account exist. Idempotent:
//! existing rows are left untouched, so operator edits survive restarts.

use sqlx::SqlitePool;

use crate::auth::password;
use crate::auth::permissions::{
    default_admin_permissions, default_agent_permissions, default_viewer_permissions,
};
use crate::db::repository::{RepoResult, role as role_repo, user as user_repo};
use shared::models::PagePermission;

const ADMIN_USERNAME: &str = "admin";

async fn ensure_role(
    pool: &SqlitePool,
    name: &str,
    description: &str,
    permissions: &[PagePermission],
    is_system: bool,
) -> RepoResult<i64> {
    if let Some(existing) = role_repo::find_by_name(pool, name).await? {
        return Ok(existing.id);
    }

    let id = shared::util::snowflake_id();
    let permissions_json = serde_json::to_string(permissions).unwrap_or_else(|_| "[]".to_string());
    sqlx::query(
        "INSERT INTO role (id, name, description, permissions, is_system, is_active) VALUES (?, ?, ?, ?, ?, 1)",
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(permissions_json)
    .bind(is_system)
    .execute(pool)
    .await?;

    tracing::info!(role = %name, "Seeded built-in role");
    Ok(id)
}

/// Seed built-in roles and the admin account (idempotent)
pub async fn ensure_defaults(pool: &SqlitePool) -> RepoResult<()> {
    let admin_role_id = ensure_role(
        pool,
        "administrator",
        "Full access to every page",
        &default_admin_permissions(),
        true,
    )
    .await?;
    ensure_role(
        pool,
        "agent",
        "Day-to-day support and CRM work",
        &default_agent_permissions(),
        false,
    )
    .await?;
    ensure_role(
        pool,
        "viewer",
        "Read-only access",
        &default_viewer_permissions(),
        false,
    )
    .await?;

    if user_repo::find_by_username(pool, ADMIN_USERNAME)
        .await?
        .is_none()
    {
        let initial_password = std::env::var("ADMIN_INITIAL_PASSWORD").unwrap_or_else(|_| {
            tracing::warn!(
                "ADMIN_INITIAL_PASSWORD not set; seeding admin with the default password, change it immediately"
            );
            "admin123".to_string()
        });
        let password_hash = password::hash_password(&initial_password)
            .map_err(|e| crate::db::repository::RepoError::Database(e.to_string()))?;

        let now = shared::util::now_millis();
        let user_id = shared::util::snowflake_id();
        sqlx::query(
            "INSERT INTO user (id, username, display_name, password_hash, preferred_language, is_system, is_active, created_at, updated_at) VALUES (?, ?, 'Administrator', ?, 'en', 1, 1, ?, ?)",
        )
        .bind(user_id)
        .bind(ADMIN_USERNAME)
        .bind(&password_hash)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        sqlx::query("INSERT INTO user_role (user_id, role_id, assigned_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(admin_role_id)
            .bind(now)
            .execute(pool)
            .await?;

        tracing::info!(username = %ADMIN_USERNAME, "Seeded system admin account");
    }

    Ok(())
}

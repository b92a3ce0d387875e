//! Role API Handlers
//!
//! Roles hold typed (page, level) grants; the legacy comma-separated
//! permission string is accepted and emitted here, at the API boundary,
//! and nowhere else.

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use serde::Deserialize;

use crate::audit::{AuditAction, create_diff, create_snapshot};
use crate::audit_log;
use crate::auth::CurrentUser;
use crate::auth::permissions::{ALL_PAGES, PermissionSet, is_valid_page};
use crate::core::ServerState;
use crate::db::repository::role as role_repo;
use crate::utils::validation::{MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text};
use crate::utils::{AppError, AppResult};
use shared::models::{
    CoverageScope, CoverageUpdate, PagePermission, Role, RoleCreate, RoleResponse, RoleUpdate,
    UserResponse,
};

fn to_response(role: Role) -> RoleResponse {
    let permission_string = PermissionSet::new(role.permissions.clone()).to_permission_string();
    RoleResponse {
        id: role.id,
        name: role.name,
        description: role.description,
        permissions: role.permissions,
        permission_string,
        is_system: role.is_system,
        is_active: role.is_active,
    }
}

/// Grants must name known pages. Duplicate pages are accepted as-is
/// (first-wins on read; write-time resolution is an open product question).
fn validate_grants(permissions: &[PagePermission]) -> AppResult<()> {
    for grant in permissions {
        if !is_valid_page(&grant.page) {
            return Err(AppError::invalid_request(format!(
                "Unknown page: {}",
                grant.page
            )));
        }
    }
    Ok(())
}

/// Resolve the effective grants from a payload: typed form wins, legacy
/// string is parsed through the codec otherwise.
fn resolve_payload_permissions(
    typed: &[PagePermission],
    legacy: Option<&str>,
) -> AppResult<Vec<PagePermission>> {
    let permissions = if !typed.is_empty() {
        typed.to_vec()
    } else {
        PermissionSet::parse(legacy).entries().to_vec()
    };
    validate_grants(&permissions)?;
    Ok(permissions)
}

/// Query filter for role listing
#[derive(Debug, Deserialize)]
pub struct RoleQuery {
    /// If true, return all roles (including inactive)
    all: Option<bool>,
}

/// GET /api/roles
pub async fn list(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<RoleQuery>,
) -> AppResult<Json<Vec<RoleResponse>>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        "Fetching roles"
    );

    let roles = if query.all.unwrap_or(false) {
        role_repo::find_all_with_inactive(&state.pool).await
    } else {
        role_repo::find_all(&state.pool).await
    }?;

    Ok(Json(roles.into_iter().map(to_response).collect()))
}

/// GET /api/roles/pages - all known page names
pub async fn get_all_pages() -> Json<Vec<String>> {
    Json(ALL_PAGES.iter().map(|s| s.to_string()).collect())
}

/// GET /api/roles/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<RoleResponse>> {
    let role = role_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Role {} not found", id)))?;

    Ok(Json(to_response(role)))
}

/// POST /api/roles
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<RoleCreate>,
) -> AppResult<Json<RoleResponse>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        role_name = %payload.name,
        "Creating role"
    );

    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;

    let permissions = resolve_payload_permissions(
        &payload.permissions,
        payload.permission_string.as_deref(),
    )?;

    let role = role_repo::create(&state.pool, &payload, &permissions).await?;
    let response = to_response(role);

    let id = response.id.to_string();
    audit_log!(
        state.audit,
        AuditAction::RoleCreated,
        "role",
        &id,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = create_snapshot(&response, "role")
    );

    Ok(Json(response))
}

/// PUT /api/roles/{id}
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<RoleUpdate>,
) -> AppResult<Json<RoleResponse>> {
    validate_optional_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;

    // Typed permissions, or the legacy string through the codec; absent = unchanged
    let permissions = match (&payload.permissions, &payload.permission_string) {
        (Some(typed), _) => Some(resolve_payload_permissions(typed, None)?),
        (None, Some(legacy)) => Some(resolve_payload_permissions(&[], Some(legacy.as_str()))?),
        (None, None) => None,
    };

    let old_role = role_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Role {}", id)))?;

    let role = role_repo::update(&state.pool, id, &payload, permissions.as_deref()).await?;
    let response = to_response(role);

    let id_str = id.to_string();
    audit_log!(
        state.audit,
        AuditAction::RoleUpdated,
        "role",
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = create_diff(&to_response(old_role), &response, "role")
    );

    Ok(Json(response))
}

/// DELETE /api/roles/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        role_id = %id,
        "Deleting role"
    );

    let name_for_audit = role_repo::find_by_id(&state.pool, id)
        .await
        .ok()
        .flatten()
        .map(|r| r.name.clone())
        .unwrap_or_default();
    let result = role_repo::delete(&state.pool, id).await?;

    if result {
        let id_str = id.to_string();
        audit_log!(
            state.audit,
            AuditAction::RoleDeleted,
            "role",
            &id_str,
            operator_id = Some(current_user.id),
            operator_name = Some(current_user.display_name.clone()),
            details = serde_json::json!({"role_name": name_for_audit})
        );
    }

    Ok(Json(result))
}

/// GET /api/roles/{id}/permissions
pub async fn get_permissions(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<PagePermission>>> {
    let role = role_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Role {} not found", id)))?;

    Ok(Json(role.permissions))
}

/// PUT /api/roles/{id}/permissions
pub async fn update_permissions(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(permissions): Json<Vec<PagePermission>>,
) -> AppResult<Json<RoleResponse>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        role_id = %id,
        permissions = ?permissions,
        "Updating role permissions"
    );

    validate_grants(&permissions)?;

    let update = RoleUpdate {
        name: None,
        description: None,
        permissions: Some(permissions.clone()),
        permission_string: None,
        is_active: None,
    };

    let old_role = role_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Role {}", id)))?;

    let role = role_repo::update(&state.pool, id, &update, Some(&permissions)).await?;
    let response = to_response(role);

    let id_str = id.to_string();
    audit_log!(
        state.audit,
        AuditAction::RoleUpdated,
        "role",
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = create_diff(&to_response(old_role), &response, "role")
    );

    Ok(Json(response))
}

/// GET /api/roles/{id}/coverage
///
/// Returns the explicit scope variant: an empty stored set comes back as
/// `AllCustomers`, never as an empty list the caller has to interpret.
pub async fn get_coverage(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<CoverageScope>> {
    role_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Role {} not found", id)))?;

    let ids = role_repo::coverage_for_role(&state.pool, id).await?;
    Ok(Json(CoverageScope::from_customer_ids(ids)))
}

/// PUT /api/roles/{id}/coverage
///
/// An empty `customer_ids` list clears the coverage set, which means
/// UNRESTRICTED (all customers), not "no customers".
pub async fn replace_coverage(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<CoverageUpdate>,
) -> AppResult<Json<CoverageScope>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        role_id = %id,
        customer_ids = ?payload.customer_ids,
        "Replacing role coverage"
    );

    role_repo::replace_coverage(&state.pool, id, &payload.customer_ids).await?;

    let id_str = id.to_string();
    audit_log!(
        state.audit,
        AuditAction::RoleCoverageChanged,
        "role",
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = serde_json::json!({ "customer_ids": payload.customer_ids })
    );

    let ids = role_repo::coverage_for_role(&state.pool, id).await?;
    Ok(Json(CoverageScope::from_customer_ids(ids)))
}

/// GET /api/roles/{id}/users
pub async fn get_users(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<UserResponse>>> {
    role_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Role {} not found", id)))?;

    let users = role_repo::users_for_role(&state.pool, id).await?;
    Ok(Json(users))
}

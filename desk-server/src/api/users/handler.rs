//! User API Handlers

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use serde::Deserialize;

use crate::audit::{AuditAction, create_diff, create_snapshot};
use crate::audit_log;
use crate::auth::CurrentUser;
use crate::auth::password;
use crate::core::ServerState;
use crate::db::repository::user as user_repo;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_PASSWORD_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text,
    validate_required_text,
};
use crate::utils::{AppError, AppResult};
use shared::models::{
    AssignRolesRequest, UserCreate, UserResponse, UserRoleAssignment, UserUpdate,
};

/// Query filter for user listing
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    /// If true, return all users (including inactive)
    all: Option<bool>,
}

/// GET /api/users
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<Vec<UserResponse>>> {
    let users = if query.all.unwrap_or(false) {
        user_repo::find_all_with_inactive(&state.pool).await
    } else {
        user_repo::find_all(&state.pool).await
    }?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /api/users/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<UserResponse>> {
    let user = user_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {} not found", id)))?;

    Ok(Json(UserResponse::from(user)))
}

/// POST /api/users
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<UserCreate>,
) -> AppResult<Json<UserResponse>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        new_username = %payload.username,
        "Creating user"
    );

    validate_required_text(&payload.username, "username", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&payload.display_name, "display_name", MAX_NAME_LEN)?;
    validate_required_text(&payload.password, "password", MAX_PASSWORD_LEN)?;

    let password_hash = password::hash_password(&payload.password)?;
    let user = user_repo::create(&state.pool, &payload, &password_hash).await?;
    let response = UserResponse::from(user);

    let id = response.id.to_string();
    audit_log!(
        state.audit,
        AuditAction::UserCreated,
        "user",
        &id,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = create_snapshot(&response, "user")
    );

    Ok(Json(response))
}

/// PUT /api/users/{id}
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdate>,
) -> AppResult<Json<UserResponse>> {
    validate_optional_text(&payload.display_name, "display_name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.password, "password", MAX_PASSWORD_LEN)?;

    let old_user = user_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {} not found", id)))?;

    let password_hash = match &payload.password {
        Some(password) => Some(password::hash_password(password)?),
        None => None,
    };

    let user = user_repo::update(&state.pool, id, &payload, password_hash.as_deref()).await?;

    let id_str = id.to_string();
    audit_log!(
        state.audit,
        AuditAction::UserUpdated,
        "user",
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = create_diff(
            &UserResponse::from(old_user),
            &UserResponse::from(user.clone()),
            "user"
        )
    );

    Ok(Json(UserResponse::from(user)))
}

/// DELETE /api/users/{id}: soft delete (deactivate)
pub async fn deactivate(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        target_user_id = %id,
        "Deactivating user"
    );

    let result = user_repo::deactivate(&state.pool, id).await?;

    if result {
        let id_str = id.to_string();
        audit_log!(
            state.audit,
            AuditAction::UserDeactivated,
            "user",
            &id_str,
            operator_id = Some(current_user.id),
            operator_name = Some(current_user.display_name.clone()),
            details = serde_json::json!({})
        );
    }

    Ok(Json(result))
}

/// GET /api/users/{id}/roles
pub async fn get_roles(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<UserRoleAssignment>>> {
    user_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {} not found", id)))?;

    let assignments = user_repo::assignments_for_user(&state.pool, id).await?;
    Ok(Json(assignments))
}

/// PUT /api/users/{id}/roles: replace the assignment set
pub async fn replace_roles(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<AssignRolesRequest>,
) -> AppResult<Json<Vec<UserRoleAssignment>>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        target_user_id = %id,
        role_ids = ?payload.role_ids,
        "Replacing user role assignments"
    );

    user_repo::replace_roles(&state.pool, id, &payload.role_ids).await?;
    let assignments = user_repo::assignments_for_user(&state.pool, id).await?;

    let id_str = id.to_string();
    audit_log!(
        state.audit,
        AuditAction::UserRolesChanged,
        "user",
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = serde_json::json!({ "role_ids": payload.role_ids })
    );

    Ok(Json(assignments))
}

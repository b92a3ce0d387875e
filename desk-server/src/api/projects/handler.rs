//! Project API Handlers

use axum::Json;
use axum::extract::{Extension, Path, State};

use crate::audit::{AuditAction, create_diff, create_snapshot};
use crate::audit_log;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{customer as customer_repo, project as project_repo};
use crate::utils::validation::{MAX_NAME_LEN, validate_optional_text, validate_required_text};
use crate::utils::{AppError, AppResult};
use shared::models::{Project, ProjectCreate, ProjectUpdate};

/// GET /api/projects
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Project>>> {
    let projects = project_repo::find_all(&state.pool).await?;
    Ok(Json(projects))
}

/// GET /api/projects/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Project>> {
    let project = project_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Project {} not found", id)))?;
    Ok(Json(project))
}

/// POST /api/projects
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<ProjectCreate>,
) -> AppResult<Json<Project>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        customer_id = %payload.customer_id,
        "Creating project"
    );

    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    if let (Some(start), Some(end)) = (payload.start_at, payload.end_at)
        && end < start
    {
        return Err(AppError::validation("end_at must not precede start_at"));
    }

    customer_repo::find_by_id(&state.pool, payload.customer_id)
        .await?
        .ok_or_else(|| {
            AppError::not_found(format!("Customer {} not found", payload.customer_id))
        })?;

    let project = project_repo::create(&state.pool, &payload).await?;

    let id = project.id.to_string();
    audit_log!(
        state.audit,
        AuditAction::ProjectCreated,
        "project",
        &id,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = create_snapshot(&project, "project")
    );

    Ok(Json(project))
}

/// PUT /api/projects/{id}
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<ProjectUpdate>,
) -> AppResult<Json<Project>> {
    validate_optional_text(&payload.name, "name", MAX_NAME_LEN)?;

    let old_project = project_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Project {} not found", id)))?;

    let project = project_repo::update(&state.pool, id, &payload).await?;

    let id_str = id.to_string();
    audit_log!(
        state.audit,
        AuditAction::ProjectUpdated,
        "project",
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = create_diff(&old_project, &project, "project")
    );

    Ok(Json(project))
}

/// DELETE /api/projects/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let snapshot = project_repo::find_by_id(&state.pool, id).await.ok().flatten();
    let result = project_repo::delete(&state.pool, id).await?;

    if result {
        let id_str = id.to_string();
        audit_log!(
            state.audit,
            AuditAction::ProjectDeleted,
            "project",
            &id_str,
            operator_id = Some(current_user.id),
            operator_name = Some(current_user.display_name.clone()),
            details = snapshot
                .map(|p| create_snapshot(&p, "project"))
                .unwrap_or_else(|| serde_json::json!({}))
        );
    }

    Ok(Json(result))
}

//! Support Case API Handlers
//!
//! SLA deadlines are derived values: computed on create, recomputed on
//! priority change, never edited directly.

use axum::Json;
use axum::extract::{Extension, Path, Query, State};

use crate::audit::{AuditAction, create_diff, create_snapshot};
use crate::audit_log;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::support_case::CaseFilter;
use crate::db::repository::{customer as customer_repo, sla as sla_repo, support_case as case_repo};
use crate::sla;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text,
};
use crate::utils::{AppError, AppResult};
use shared::models::{CaseAssign, CaseCreate, CaseStatusChange, CaseUpdate, SupportCase};

/// GET /api/cases with optional status/priority/customer/assignee filters
pub async fn list(
    State(state): State<ServerState>,
    Query(filter): Query<CaseFilter>,
) -> AppResult<Json<Vec<SupportCase>>> {
    let cases = case_repo::find_all(&state.pool, &filter).await?;
    Ok(Json(cases))
}

/// GET /api/cases/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<SupportCase>> {
    let case = case_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Case {} not found", id)))?;
    Ok(Json(case))
}

/// GET /api/cases/{id}/sla: point-in-time breach evaluation
pub async fn get_sla(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<sla::SlaStatus>> {
    let case = case_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Case {} not found", id)))?;

    let thresholds = sla_repo::find_active(&state.pool).await?;
    let status = sla::evaluate(&case, &thresholds, shared::util::now_millis());
    Ok(Json(status))
}

/// POST /api/cases
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<CaseCreate>,
) -> AppResult<Json<SupportCase>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        customer_id = %payload.customer_id,
        priority = ?payload.priority,
        "Creating case"
    );

    validate_required_text(&payload.title, "title", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;

    customer_repo::find_by_id(&state.pool, payload.customer_id)
        .await?
        .ok_or_else(|| {
            AppError::not_found(format!("Customer {} not found", payload.customer_id))
        })?;

    // Deadline from the active threshold for the priority; None = untracked
    let thresholds = sla_repo::find_active(&state.pool).await?;
    let deadline = sla::deadline_for(payload.priority, shared::util::now_millis(), &thresholds);

    let case = case_repo::create(&state.pool, &payload, deadline).await?;

    let id = case.id.to_string();
    audit_log!(
        state.audit,
        AuditAction::CaseCreated,
        "case",
        &id,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = create_snapshot(&case, "case")
    );

    Ok(Json(case))
}

/// PUT /api/cases/{id}
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<CaseUpdate>,
) -> AppResult<Json<SupportCase>> {
    validate_optional_text(&payload.title, "title", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;

    let old_case = case_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Case {} not found", id)))?;

    let mut case = case_repo::update(&state.pool, id, &payload).await?;

    // Priority change invalidates the derived deadline; recompute from the
    // ORIGINAL creation time, not from now
    if let Some(priority) = payload.priority
        && priority != old_case.priority
    {
        let thresholds = sla_repo::find_active(&state.pool).await?;
        let deadline = sla::deadline_for(priority, case.created_at, &thresholds);
        case_repo::set_sla_deadline(&state.pool, id, deadline).await?;
        case.sla_deadline = deadline;
    }

    let id_str = id.to_string();
    audit_log!(
        state.audit,
        AuditAction::CaseUpdated,
        "case",
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = create_diff(&old_case, &case, "case")
    );

    Ok(Json(case))
}

/// POST /api/cases/{id}/status
pub async fn change_status(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<CaseStatusChange>,
) -> AppResult<Json<SupportCase>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        case_id = %id,
        status = ?payload.status,
        "Changing case status"
    );

    validate_optional_text(&payload.note, "note", MAX_NOTE_LEN)?;

    let old_case = case_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Case {} not found", id)))?;

    let case = case_repo::update_status(&state.pool, id, payload.status).await?;

    let id_str = id.to_string();
    audit_log!(
        state.audit,
        AuditAction::CaseStatusChanged,
        "case",
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = serde_json::json!({
            "from": old_case.status,
            "to": case.status,
            "note": payload.note,
        })
    );

    Ok(Json(case))
}

/// POST /api/cases/{id}/assign
pub async fn assign(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<CaseAssign>,
) -> AppResult<Json<SupportCase>> {
    let case = case_repo::assign(&state.pool, id, payload.user_id).await?;

    let id_str = id.to_string();
    audit_log!(
        state.audit,
        AuditAction::CaseAssigned,
        "case",
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = serde_json::json!({ "assigned_user_id": payload.user_id })
    );

    Ok(Json(case))
}

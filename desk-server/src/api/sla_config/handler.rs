//! SLA Configuration Handlers
//!
//! Stored case deadlines are derived from this table, so every mutation here
//! recomputes `sla_deadline` for the affected priority's unresolved cases;
//! the stored value must never silently diverge from the threshold table.

use axum::Json;
use axum::extract::{Extension, Path, State};

use crate::audit::{AuditAction, create_diff, create_snapshot};
use crate::audit_log;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{sla as sla_repo, support_case as case_repo};
use crate::utils::validation::validate_non_negative_hours;
use crate::utils::{AppError, AppResult};
use shared::models::{CasePriority, SlaThreshold, SlaThresholdCreate, SlaThresholdUpdate};

/// Re-derive deadlines for one priority from its (possibly absent) active row
async fn recompute_cases(state: &ServerState, priority: CasePriority) -> AppResult<u64> {
    let active = sla_repo::find_active_for_priority(&state.pool, priority).await?;
    let affected = case_repo::recompute_deadlines_for_priority(
        &state.pool,
        priority,
        active.map(|t| t.resolution_hours),
    )
    .await?;

    if affected > 0 {
        tracing::info!(
            priority = ?priority,
            affected,
            "Recomputed SLA deadlines after threshold change"
        );
    }
    Ok(affected)
}

/// GET /api/sla-config
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<SlaThreshold>>> {
    let thresholds = sla_repo::find_all(&state.pool).await?;
    Ok(Json(thresholds))
}

/// GET /api/sla-config/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<SlaThreshold>> {
    let threshold = sla_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("SLA threshold {} not found", id)))?;
    Ok(Json(threshold))
}

/// POST /api/sla-config
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<SlaThresholdCreate>,
) -> AppResult<Json<SlaThreshold>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        priority = ?payload.priority,
        "Creating SLA threshold"
    );

    // Zero is legal ("due immediately"); negative is not
    validate_non_negative_hours(payload.response_hours, "response_hours")?;
    validate_non_negative_hours(payload.resolution_hours, "resolution_hours")?;

    let threshold = sla_repo::create(&state.pool, &payload).await?;
    recompute_cases(&state, threshold.priority).await?;

    let id = threshold.id.to_string();
    audit_log!(
        state.audit,
        AuditAction::SlaThresholdCreated,
        "sla_threshold",
        &id,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = create_snapshot(&threshold, "sla_threshold")
    );

    Ok(Json(threshold))
}

/// PUT /api/sla-config/{id}
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<SlaThresholdUpdate>,
) -> AppResult<Json<SlaThreshold>> {
    if let Some(hours) = payload.response_hours {
        validate_non_negative_hours(hours, "response_hours")?;
    }
    if let Some(hours) = payload.resolution_hours {
        validate_non_negative_hours(hours, "resolution_hours")?;
    }

    let old_threshold = sla_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("SLA threshold {} not found", id)))?;

    let threshold = sla_repo::update(&state.pool, id, &payload).await?;
    recompute_cases(&state, threshold.priority).await?;

    let id_str = id.to_string();
    audit_log!(
        state.audit,
        AuditAction::SlaThresholdUpdated,
        "sla_threshold",
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = create_diff(&old_threshold, &threshold, "sla_threshold")
    );

    Ok(Json(threshold))
}

/// DELETE /api/sla-config/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let existing = sla_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("SLA threshold {} not found", id)))?;

    let result = sla_repo::delete(&state.pool, id).await?;
    if result {
        // Deleting the active row may leave the priority untracked
        recompute_cases(&state, existing.priority).await?;

        let id_str = id.to_string();
        audit_log!(
            state.audit,
            AuditAction::SlaThresholdDeleted,
            "sla_threshold",
            &id_str,
            operator_id = Some(current_user.id),
            operator_name = Some(current_user.display_name.clone()),
            details = create_snapshot(&existing, "sla_threshold")
        );
    }

    Ok(Json(result))
}

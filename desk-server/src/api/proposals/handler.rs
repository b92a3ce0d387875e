//! Proposal API Handlers
//!
//! Status (approval workflow) and stage (sales funnel) move independently,
//! each through its own action endpoint.

use axum::Json;
use axum::extract::{Extension, Path, State};
use serde::Deserialize;

use crate::audit::{AuditAction, create_diff, create_snapshot};
use crate::audit_log;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{customer as customer_repo, proposal as proposal_repo};
use crate::utils::validation::{MAX_NAME_LEN, validate_optional_text, validate_required_text};
use crate::utils::{AppError, AppResult};
use shared::models::{Proposal, ProposalCreate, ProposalStage, ProposalStatus, ProposalUpdate};

/// GET /api/proposals
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Proposal>>> {
    let proposals = proposal_repo::find_all(&state.pool).await?;
    Ok(Json(proposals))
}

/// GET /api/proposals/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Proposal>> {
    let proposal = proposal_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Proposal {} not found", id)))?;
    Ok(Json(proposal))
}

/// POST /api/proposals
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<ProposalCreate>,
) -> AppResult<Json<Proposal>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        customer_id = %payload.customer_id,
        "Creating proposal"
    );

    validate_required_text(&payload.title, "title", MAX_NAME_LEN)?;
    if payload.amount < 0.0 {
        return Err(AppError::validation("amount must not be negative"));
    }

    customer_repo::find_by_id(&state.pool, payload.customer_id)
        .await?
        .ok_or_else(|| {
            AppError::not_found(format!("Customer {} not found", payload.customer_id))
        })?;

    let proposal = proposal_repo::create(&state.pool, &payload).await?;

    let id = proposal.id.to_string();
    audit_log!(
        state.audit,
        AuditAction::ProposalCreated,
        "proposal",
        &id,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = create_snapshot(&proposal, "proposal")
    );

    Ok(Json(proposal))
}

/// PUT /api/proposals/{id}
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<ProposalUpdate>,
) -> AppResult<Json<Proposal>> {
    validate_optional_text(&payload.title, "title", MAX_NAME_LEN)?;
    if let Some(amount) = payload.amount
        && amount < 0.0
    {
        return Err(AppError::validation("amount must not be negative"));
    }

    let old_proposal = proposal_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Proposal {} not found", id)))?;

    let proposal = proposal_repo::update(&state.pool, id, &payload).await?;

    let id_str = id.to_string();
    audit_log!(
        state.audit,
        AuditAction::ProposalUpdated,
        "proposal",
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = create_diff(&old_proposal, &proposal, "proposal")
    );

    Ok(Json(proposal))
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: ProposalStatus,
}

/// POST /api/proposals/{id}/status
pub async fn change_status(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusChange>,
) -> AppResult<Json<Proposal>> {
    let old_proposal = proposal_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Proposal {} not found", id)))?;

    let proposal = proposal_repo::set_status(&state.pool, id, payload.status).await?;

    let id_str = id.to_string();
    audit_log!(
        state.audit,
        AuditAction::ProposalStatusChanged,
        "proposal",
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = serde_json::json!({ "from": old_proposal.status, "to": proposal.status })
    );

    Ok(Json(proposal))
}

#[derive(Debug, Deserialize)]
pub struct StageChange {
    pub stage: ProposalStage,
}

/// POST /api/proposals/{id}/stage
pub async fn change_stage(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<StageChange>,
) -> AppResult<Json<Proposal>> {
    let old_proposal = proposal_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Proposal {} not found", id)))?;

    let proposal = proposal_repo::set_stage(&state.pool, id, payload.stage).await?;

    let id_str = id.to_string();
    audit_log!(
        state.audit,
        AuditAction::ProposalStageChanged,
        "proposal",
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = serde_json::json!({ "from": old_proposal.stage, "to": proposal.stage })
    );

    Ok(Json(proposal))
}

/// DELETE /api/proposals/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let snapshot = proposal_repo::find_by_id(&state.pool, id).await.ok().flatten();
    let result = proposal_repo::delete(&state.pool, id).await?;

    if result {
        let id_str = id.to_string();
        audit_log!(
            state.audit,
            AuditAction::ProposalDeleted,
            "proposal",
            &id_str,
            operator_id = Some(current_user.id),
            operator_name = Some(current_user.display_name.clone()),
            details = snapshot
                .map(|p| create_snapshot(&p, "proposal"))
                .unwrap_or_else(|| serde_json::json!({}))
        );
    }

    Ok(Json(result))
}

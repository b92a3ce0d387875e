//! Audit Log API Handlers

use axum::Json;
use axum::extract::{Query, State};

use crate::audit::{AuditListResponse, AuditQuery};
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

/// GET /api/audit-log
///
/// Filters: from/to (Unix millis), action, operator_id, resource_type;
/// paginated via offset/limit.
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<AuditListResponse>> {
    let (items, total) = state
        .audit
        .query(&query)
        .await
        .map_err(|e| AppError::database(format!("Audit query failed: {e}")))?;

    Ok(Json(AuditListResponse { items, total }))
}

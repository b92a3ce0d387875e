//! Dashboard API Handlers
//!
//! Scope resolution: `role_id` scopes to that role's coverage set (empty
//! coverage = all customers), `customer_id` scopes to exactly one customer.
//! With neither, the snapshot is unscoped.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::repository::{
    customer as customer_repo, dashboard as dashboard_repo, role as role_repo,
};
use crate::utils::{AppError, AppResult};
use shared::models::{CoverageScope, DashboardMetrics, DashboardSnapshot};

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub role_id: Option<i64>,
    pub customer_id: Option<i64>,
}

/// Resolve the customer scope for a metrics request.
///
/// Role takes precedence; its EMPTY coverage set means "all customers"
/// (the inversion is handled by `CoverageScope::from_customer_ids`).
async fn resolve_scope(state: &ServerState, query: &DashboardQuery) -> AppResult<CoverageScope> {
    if let Some(role_id) = query.role_id {
        role_repo::find_by_id(&state.pool, role_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Role {} not found", role_id)))?;

        let ids = role_repo::coverage_for_role(&state.pool, role_id).await?;
        return Ok(CoverageScope::from_customer_ids(ids));
    }

    if let Some(customer_id) = query.customer_id {
        customer_repo::find_by_id(&state.pool, customer_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Customer {} not found", customer_id)))?;

        return Ok(CoverageScope::Customers(vec![customer_id]));
    }

    Ok(CoverageScope::AllCustomers)
}

/// GET /api/dashboard
pub async fn get_metrics(
    State(state): State<ServerState>,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<DashboardMetrics>> {
    let scope = resolve_scope(&state, &query).await?;
    let metrics =
        dashboard_repo::compute(&state.pool, &scope, shared::util::now_millis()).await?;
    Ok(Json(metrics))
}

/// POST /api/dashboard/snapshot: compute and persist
pub async fn persist_snapshot(
    State(state): State<ServerState>,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<DashboardSnapshot>> {
    let scope = resolve_scope(&state, &query).await?;
    let metrics =
        dashboard_repo::compute(&state.pool, &scope, shared::util::now_millis()).await?;
    let snapshot = dashboard_repo::insert_snapshot(
        &state.pool,
        query.role_id,
        query.customer_id,
        &metrics,
    )
    .await?;

    tracing::info!(snapshot_id = %snapshot.id, "Dashboard snapshot persisted");
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
pub struct SnapshotQuery {
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    20
}

/// GET /api/dashboard/snapshots: persisted history
pub async fn list_snapshots(
    State(state): State<ServerState>,
    Query(query): Query<SnapshotQuery>,
) -> AppResult<Json<Vec<DashboardSnapshot>>> {
    let snapshots = dashboard_repo::list_snapshots(&state.pool, query.limit.clamp(1, 200)).await?;
    Ok(Json(snapshots))
}

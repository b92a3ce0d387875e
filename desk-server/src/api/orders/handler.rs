//! Order API Handlers

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use serde::Deserialize;

use crate::audit::{AuditAction, create_diff, create_snapshot};
use crate::audit_log;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{customer as customer_repo, order as order_repo};
use crate::utils::validation::{MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text, validate_required_text};
use crate::utils::{AppError, AppResult};
use shared::models::{Order, OrderCreate, OrderUpdate};

#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    customer_id: Option<i64>,
}

/// GET /api/orders
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<OrderQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let orders = match query.customer_id {
        Some(customer_id) => order_repo::find_by_customer(&state.pool, customer_id).await?,
        None => order_repo::find_all(&state.pool).await?,
    };
    Ok(Json(orders))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    let order = order_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {} not found", id)))?;
    Ok(Json(order))
}

/// POST /api/orders
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<OrderCreate>,
) -> AppResult<Json<Order>> {
    validate_required_text(&payload.reference, "reference", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    if payload.total_amount < 0.0 {
        return Err(AppError::validation("total_amount must not be negative"));
    }

    customer_repo::find_by_id(&state.pool, payload.customer_id)
        .await?
        .ok_or_else(|| {
            AppError::not_found(format!("Customer {} not found", payload.customer_id))
        })?;

    let order = order_repo::create(&state.pool, &payload).await?;

    let id = order.id.to_string();
    audit_log!(
        state.audit,
        AuditAction::OrderCreated,
        "order",
        &id,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = create_snapshot(&order, "order")
    );

    Ok(Json(order))
}

/// PUT /api/orders/{id}
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<OrderUpdate>,
) -> AppResult<Json<Order>> {
    validate_optional_text(&payload.reference, "reference", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;

    let old_order = order_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {} not found", id)))?;

    let order = order_repo::update(&state.pool, id, &payload).await?;

    let id_str = id.to_string();
    audit_log!(
        state.audit,
        AuditAction::OrderUpdated,
        "order",
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = create_diff(&old_order, &order, "order")
    );

    Ok(Json(order))
}

/// DELETE /api/orders/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let snapshot = order_repo::find_by_id(&state.pool, id).await.ok().flatten();
    let result = order_repo::delete(&state.pool, id).await?;

    if result {
        let id_str = id.to_string();
        audit_log!(
            state.audit,
            AuditAction::OrderDeleted,
            "order",
            &id_str,
            operator_id = Some(current_user.id),
            operator_name = Some(current_user.display_name.clone()),
            details = snapshot
                .map(|o| create_snapshot(&o, "order"))
                .unwrap_or_else(|| serde_json::json!({}))
        );
    }

    Ok(Json(result))
}
